use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::AvatarId;

/// Output encodings the service can produce.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Gif,
    Png,
    Apng,
    /// The capability-gated alternate format.
    Webp,
}

impl ImageFormat {
    /// Used when neither an override nor the accept header decides.
    pub const BASELINE: ImageFormat = ImageFormat::Jpg;
    pub const ALT: ImageFormat = ImageFormat::Webp;

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Apng => "apng",
            Self::Webp => "webp",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "jpg" => Some(Self::Jpg),
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            "apng" => Some(Self::Apng),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Png => "image/png",
            Self::Apng => "image/apng",
            Self::Webp => "image/webp",
        }
    }

    /// Formats that can carry more than one frame.
    pub fn is_multi_frame(&self) -> bool {
        matches!(self, Self::Gif | Self::Apng)
    }
}

/// A read request as delivered by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarRequest {
    pub id: AvatarId,
    /// `None` when the size parameter was absent or not an integer.
    pub requested_size: Option<i64>,
    /// Raw `t` value; validated during negotiation.
    pub type_override: Option<String>,
    pub accepts_alt_format: bool,
}

impl AvatarRequest {
    pub fn new(id: AvatarId) -> Self {
        Self {
            id,
            requested_size: None,
            type_override: None,
            accepts_alt_format: false,
        }
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.requested_size = Some(size);
        self
    }

    pub fn with_type(mut self, type_override: impl Into<String>) -> Self {
        self.type_override = Some(type_override.into());
        self
    }

    pub fn accepting_alt_format(mut self) -> Self {
        self.accepts_alt_format = true;
        self
    }

    /// Normalized request signature used as the result cache key.
    ///
    /// Covers every input negotiation reads, so requests that can resolve
    /// to different outputs never share a key.
    pub fn signature(&self) -> String {
        let size = self
            .requested_size
            .map(|s| s.to_string())
            .unwrap_or_default();
        let type_override = self.type_override.as_deref().unwrap_or_default();
        format!(
            "{}?s={}&t={}&alt={}",
            self.id,
            size,
            type_override,
            u8::from(self.accepts_alt_format)
        )
    }
}

/// The canonical output a request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpec {
    pub size: u32,
    pub format: ImageFormat,
    pub single_frame: bool,
    /// Set when the configured mime table overrides suffix inference.
    pub content_type: Option<String>,
}

impl ResolvedSpec {
    /// Resize directive in `WxH` form; output is always square.
    pub fn dimensions(&self) -> String {
        format!("{0}x{0}", self.size)
    }
}

/// A converted image on disk.
///
/// The file is removed when the last handle is dropped, so an artifact
/// shared between the cache and in-flight responses outlives both.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    format: ImageFormat,
    content_type: Option<String>,
}

impl Artifact {
    pub fn new(path: PathBuf, format: ImageFormat) -> Self {
        Self {
            path,
            format,
            content_type: None,
        }
    }

    /// Pins the content type instead of inferring it from the suffix.
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn content_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| self.inferred_content_type())
    }

    /// Content type inferred from the artifact's suffix.
    pub fn inferred_content_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| self.format.mime_type().to_string())
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed artifact {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove artifact {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// What a successful read hands to the transport layer.
#[derive(Debug, Clone)]
pub struct ServedAvatar {
    pub artifact: std::sync::Arc<Artifact>,
    pub content_type: String,
}

/// Result of the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored,
    /// The request carried no file; nothing was written.
    NoFile,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn formats_parse_from_lowercase_names() {
        assert_eq!(ImageFormat::from_str("jpg").unwrap(), ImageFormat::Jpg);
        assert_eq!(ImageFormat::from_str("apng").unwrap(), ImageFormat::Apng);
        assert_eq!(ImageFormat::from_str("webp").unwrap(), ImageFormat::Webp);
        assert!(ImageFormat::from_str("zzz").is_err());
        assert!(ImageFormat::from_str("jpeg").is_err());
    }

    #[test]
    fn only_gif_and_apng_are_multi_frame() {
        assert!(ImageFormat::Gif.is_multi_frame());
        assert!(ImageFormat::Apng.is_multi_frame());
        assert!(!ImageFormat::Jpg.is_multi_frame());
        assert!(!ImageFormat::Png.is_multi_frame());
        assert!(!ImageFormat::Webp.is_multi_frame());
    }

    #[test]
    fn signature_distinguishes_every_negotiation_input() {
        let id = AvatarId::try_from("alice").unwrap();
        let base = AvatarRequest::new(id);

        let signatures = [
            base.clone().signature(),
            base.clone().with_size(64).signature(),
            base.clone().with_type("png").signature(),
            base.clone().accepting_alt_format().signature(),
            base.clone().with_size(64).with_type("png").signature(),
        ];
        for (i, a) in signatures.iter().enumerate() {
            for b in &signatures[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(base.clone().with_size(64).signature(), "alice?s=64&t=&alt=0");
    }

    #[test]
    fn dropping_the_last_handle_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"png").unwrap();

        let artifact = std::sync::Arc::new(Artifact::new(path.clone(), ImageFormat::Png));
        let streaming = artifact.clone();
        drop(artifact);
        assert!(path.exists());

        drop(streaming);
        assert!(!path.exists());
    }

    #[test]
    fn content_type_is_inferred_from_suffix() {
        let artifact = Artifact::new(PathBuf::from("/nonexistent/x.jpg"), ImageFormat::Jpg);
        assert_eq!(artifact.inferred_content_type(), "image/jpeg");
        assert_eq!(artifact.content_type(), "image/jpeg");
    }

    #[test]
    fn pinned_content_type_wins_over_suffix() {
        let artifact = Artifact::new(PathBuf::from("/nonexistent/x.apng"), ImageFormat::Apng)
            .with_content_type(Some("image/png".to_string()));
        assert_eq!(artifact.content_type(), "image/png");
    }
}
