use std::str::FromStr;

use crate::config::NegotiationSettings;

use super::{
    models::{AvatarRequest, Capabilities, ImageFormat, ResolvedSpec},
    NegotiationError,
};

/// Computes the canonical (size, format) pair for a request.
///
/// Format precedence: a non-empty `t` override, then the accept-header
/// hint (only when the alternate format is available), then the baseline.
pub fn negotiate(
    request: &AvatarRequest,
    capabilities: &Capabilities,
    settings: &NegotiationSettings,
) -> Result<ResolvedSpec, NegotiationError> {
    let size = resolve_size(request.requested_size, settings);
    let format = resolve_format(request, capabilities)?;

    Ok(ResolvedSpec {
        size,
        format,
        single_frame: !format.is_multi_frame(),
        content_type: settings.mime_overrides.get(&format).cloned(),
    })
}

fn resolve_size(requested: Option<i64>, settings: &NegotiationSettings) -> u32 {
    let max = i64::from(settings.max_size.max(1));
    match requested {
        Some(size) => size.clamp(1, max) as u32,
        None => settings.default_size.clamp(1, settings.max_size.max(1)),
    }
}

fn resolve_format(
    request: &AvatarRequest,
    capabilities: &Capabilities,
) -> Result<ImageFormat, NegotiationError> {
    if let Some(raw) = request.type_override.as_deref().filter(|t| !t.is_empty()) {
        let format = ImageFormat::from_str(raw)
            .map_err(|_| NegotiationError::UnsupportedFormat(raw.to_string()))?;
        if format == ImageFormat::ALT && !capabilities.alt_format_available {
            return Err(NegotiationError::UnsupportedFormat(raw.to_string()));
        }
        return Ok(format);
    }

    if request.accepts_alt_format && capabilities.alt_format_available {
        return Ok(ImageFormat::ALT);
    }

    Ok(ImageFormat::BASELINE)
}

/// Whether an `Accept` header value advertises the alternate format.
pub fn accepts_alt_format(accept: &str) -> bool {
    accept
        .split(',')
        .filter_map(|part| part.split(';').next())
        .any(|media| media.trim().eq_ignore_ascii_case(ImageFormat::ALT.mime_type()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::models::AvatarId;

    fn settings() -> NegotiationSettings {
        NegotiationSettings {
            default_size: 32,
            max_size: 512,
            mime_overrides: HashMap::from([(ImageFormat::Apng, "image/png".to_string())]),
        }
    }

    fn request() -> AvatarRequest {
        AvatarRequest::new(AvatarId::try_from("alice").unwrap())
    }

    const WITH_ALT: Capabilities = Capabilities {
        alt_format_available: true,
    };
    const WITHOUT_ALT: Capabilities = Capabilities {
        alt_format_available: false,
    };

    #[test]
    fn absent_size_uses_default() {
        let spec = negotiate(&request(), &WITH_ALT, &settings()).unwrap();
        assert_eq!(spec.size, 32);
        assert_eq!(spec.dimensions(), "32x32");
    }

    #[test]
    fn oversized_request_is_clamped_to_max() {
        for size in [513, 1024, i64::MAX] {
            let spec = negotiate(&request().with_size(size), &WITH_ALT, &settings()).unwrap();
            assert_eq!(spec.size, 512);
        }
    }

    #[test]
    fn non_positive_size_is_clamped_to_one() {
        let spec = negotiate(&request().with_size(0), &WITH_ALT, &settings()).unwrap();
        assert_eq!(spec.size, 1);
        let spec = negotiate(&request().with_size(-5), &WITH_ALT, &settings()).unwrap();
        assert_eq!(spec.size, 1);
    }

    #[test]
    fn baseline_format_is_jpg() {
        let spec = negotiate(&request(), &WITH_ALT, &settings()).unwrap();
        assert_eq!(spec.format, ImageFormat::Jpg);
        assert!(spec.single_frame);
        assert_eq!(spec.content_type, None);
    }

    #[test]
    fn accept_hint_selects_alt_format_when_available() {
        let req = request().accepting_alt_format();
        assert_eq!(
            negotiate(&req, &WITH_ALT, &settings()).unwrap().format,
            ImageFormat::Webp
        );
        assert_eq!(
            negotiate(&req, &WITHOUT_ALT, &settings()).unwrap().format,
            ImageFormat::Jpg
        );
    }

    #[test]
    fn explicit_override_beats_accept_hint() {
        let req = request().accepting_alt_format().with_type("png");
        let spec = negotiate(&req, &WITH_ALT, &settings()).unwrap();
        assert_eq!(spec.format, ImageFormat::Png);
    }

    #[test]
    fn alt_override_without_capability_is_rejected() {
        let req = request().with_type("webp");
        assert_eq!(
            negotiate(&req, &WITHOUT_ALT, &settings()).unwrap_err(),
            NegotiationError::UnsupportedFormat("webp".to_string())
        );
        assert!(negotiate(&req, &WITH_ALT, &settings()).is_ok());
    }

    #[test]
    fn unknown_override_is_rejected_regardless_of_capabilities() {
        for caps in [WITH_ALT, WITHOUT_ALT] {
            let err = negotiate(&request().with_type("zzz"), &caps, &settings()).unwrap_err();
            assert_eq!(err, NegotiationError::UnsupportedFormat("zzz".to_string()));
        }
    }

    #[test]
    fn empty_override_is_ignored() {
        let spec = negotiate(&request().with_type(""), &WITH_ALT, &settings()).unwrap();
        assert_eq!(spec.format, ImageFormat::Jpg);
    }

    #[test]
    fn multi_frame_formats_are_not_flattened() {
        let gif = negotiate(&request().with_type("gif"), &WITH_ALT, &settings()).unwrap();
        assert!(!gif.single_frame);

        let apng = negotiate(&request().with_type("apng"), &WITH_ALT, &settings()).unwrap();
        assert!(!apng.single_frame);
        assert_eq!(apng.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn accept_header_parsing() {
        assert!(accepts_alt_format(
            "image/avif,image/webp,image/apng,*/*;q=0.8"
        ));
        assert!(accepts_alt_format("image/webp;q=0.9"));
        assert!(!accepts_alt_format("image/png,*/*"));
        assert!(!accepts_alt_format(""));
    }
}
