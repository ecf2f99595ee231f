use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::ConversionError;

/// External raster-conversion engine.
#[async_trait]
pub trait ImageConverter: Send + Sync + 'static {
    /// Converts `source` into `target`, resized to `size` (`WxH`).
    ///
    /// `extra_args` are engine-specific options applied before the resize.
    /// Returns the path the engine wrote to; callers still verify it exists.
    async fn convert(
        &self,
        source: &Path,
        target: &Path,
        size: &str,
        extra_args: &[String],
    ) -> Result<PathBuf, ConversionError>;
}
