use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::domain::{
    models::{Artifact, ImageFormat},
    ports::outbound::ImageConverter,
    ConversionError,
};

/// Drives the conversion engine and owns the scratch directory.
pub struct ConversionOrchestrator<C> {
    converter: Arc<C>,
    scratch_dir: PathBuf,
}

impl<C> Clone for ConversionOrchestrator<C> {
    fn clone(&self) -> Self {
        Self {
            converter: Arc::clone(&self.converter),
            scratch_dir: self.scratch_dir.clone(),
        }
    }
}

impl<C: ImageConverter> ConversionOrchestrator<C> {
    pub fn new(converter: Arc<C>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            converter,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Creates the scratch directory and removes artifacts left behind by
    /// an earlier process. Nothing else can reference them after a restart.
    ///
    /// Only files named like [`Self::temp_path`] output are touched; the
    /// directory may be shared with other data.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let mut entries = tokio::fs::read_dir(&self.scratch_dir).await?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if !entry.file_name().to_str().is_some_and(is_artifact_name) {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    "Failed to remove stale artifact {}: {}",
                    entry.path().display(),
                    e
                ),
            }
        }

        if removed > 0 {
            info!("Removed {} stale artifacts from scratch directory", removed);
        }
        Ok(())
    }

    /// Converts `source` into a fresh artifact of `format` at `size` (`WxH`).
    ///
    /// `label` only influences the temp file name. The output file is removed
    /// again if the conversion fails or this future is dropped before it
    /// completes.
    pub async fn convert(
        &self,
        label: &str,
        source: &Path,
        size: &str,
        format: ImageFormat,
        single_frame: bool,
    ) -> Result<Artifact, ConversionError> {
        let artifact = Artifact::new(self.temp_path(label, format), format);
        let extra_args = frame_args(single_frame);

        debug!(
            "Converting {} to {} ({})",
            source.display(),
            artifact.path().display(),
            size
        );
        let written = self
            .converter
            .convert(source, artifact.path(), size, &extra_args)
            .await?;

        if written.as_path() != artifact.path() {
            return Err(ConversionError::EngineFailure(format!(
                "engine wrote to unexpected path {}",
                written.display()
            )));
        }

        match tokio::fs::metadata(artifact.path()).await {
            Ok(metadata) if metadata.is_file() => Ok(artifact),
            _ => Err(ConversionError::UnsupportedMediaType),
        }
    }

    fn temp_path(&self, label: &str, format: ImageFormat) -> PathBuf {
        self.scratch_dir.join(format!(
            "{}-{}.{}",
            label,
            uuid::Uuid::new_v4().simple(),
            format.extension()
        ))
    }
}

/// Matches `<label>-<32 lowercase hex>.<format extension>`.
fn is_artifact_name(name: &str) -> bool {
    let Some((stem, extension)) = name.rsplit_once('.') else {
        return false;
    };
    if ImageFormat::from_extension(extension).is_none() {
        return false;
    }
    let Some((label, token)) = stem.rsplit_once('-') else {
        return false;
    };

    !label.is_empty()
        && token.len() == 32
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn frame_args(single_frame: bool) -> Vec<String> {
    if single_frame {
        // keep only the first frame
        vec!["-delete".to_string(), "1--1".to_string()]
    } else {
        vec!["-coalesce".to_string()]
    }
}
