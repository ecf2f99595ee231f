use std::path::Path;

use tracing::{info, warn};

use crate::domain::{
    models::{Capabilities, ImageFormat},
    ports::outbound::ImageConverter,
    PreflightError,
};

use super::ConversionOrchestrator;

const PROBE_SIZE: &str = "16x16";
const PROBE_LABEL: &str = "preflight";

/// Exercises the conversion engine once before the service accepts traffic.
///
/// The baseline format must convert or the service cannot work at all. The
/// alternate format is optional; if it fails it is disabled for the lifetime
/// of the process.
pub async fn probe<C: ImageConverter>(
    orchestrator: &ConversionOrchestrator<C>,
    default_image_path: &Path,
) -> Result<Capabilities, PreflightError> {
    orchestrator.prepare().await?;

    orchestrator
        .convert(
            PROBE_LABEL,
            default_image_path,
            PROBE_SIZE,
            ImageFormat::BASELINE,
            true,
        )
        .await
        .map_err(|source| PreflightError::BaselineUnavailable {
            format: ImageFormat::BASELINE,
            source,
        })?;

    let alt_format_available = match orchestrator
        .convert(
            PROBE_LABEL,
            default_image_path,
            PROBE_SIZE,
            ImageFormat::ALT,
            true,
        )
        .await
    {
        Ok(_) => true,
        Err(e) => {
            warn!(
                "{} output is unavailable and will not be offered: {}",
                ImageFormat::ALT,
                e
            );
            false
        }
    };

    let capabilities = Capabilities::new(alt_format_available);
    info!(?capabilities, "Conversion engine preflight passed");
    Ok(capabilities)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::outbound::media::MockImageConverter;

    fn orchestrator(
        converter: &MockImageConverter,
        dir: &Path,
    ) -> ConversionOrchestrator<MockImageConverter> {
        ConversionOrchestrator::new(Arc::new(converter.clone()), dir.join("tmp"))
    }

    fn default_image(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("default.jpg");
        std::fs::write(&path, b"default").unwrap();
        path
    }

    #[tokio::test]
    async fn all_formats_available() {
        let dir = tempfile::tempdir().unwrap();
        let converter = MockImageConverter::default();
        let orchestrator = orchestrator(&converter, dir.path());

        let caps = probe(&orchestrator, &default_image(dir.path()))
            .await
            .unwrap();

        assert!(caps.alt_format_available);
        assert_eq!(converter.call_count(), 2);
        // probe artifacts are not kept around
        assert_eq!(
            std::fs::read_dir(orchestrator.scratch_dir()).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn alt_format_failure_only_disables_the_feature() {
        let dir = tempfile::tempdir().unwrap();
        let converter = MockImageConverter::default().failing_for(ImageFormat::Webp);
        let orchestrator = orchestrator(&converter, dir.path());

        let caps = probe(&orchestrator, &default_image(dir.path()))
            .await
            .unwrap();

        assert!(!caps.alt_format_available);
    }

    #[tokio::test]
    async fn baseline_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let converter = MockImageConverter::default().failing_for(ImageFormat::Jpg);
        let orchestrator = orchestrator(&converter, dir.path());

        let err = probe(&orchestrator, &default_image(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, PreflightError::BaselineUnavailable { .. }));
        // the optional format is never attempted
        assert_eq!(converter.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_default_image_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(&MockImageConverter::default(), dir.path());

        let result = probe(&orchestrator, &dir.path().join("missing.jpg")).await;

        assert!(matches!(
            result,
            Err(PreflightError::BaselineUnavailable { .. })
        ));
    }
}
