//! Scripted converter for tests.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::domain::{models::ImageFormat, ports::outbound::ImageConverter, ConversionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertCall {
    pub source: PathBuf,
    pub target: PathBuf,
    pub size: String,
    pub extra_args: Vec<String>,
}

/// Copies the source to the target, or fails for configured formats.
///
/// Clones share the call log.
#[derive(Clone, Default)]
pub struct MockImageConverter {
    calls: Arc<Mutex<Vec<ConvertCall>>>,
    failing: HashSet<&'static str>,
    without_output: HashSet<&'static str>,
}

impl MockImageConverter {
    /// Fails with an engine error for targets of `format`.
    pub fn failing_for(mut self, format: ImageFormat) -> Self {
        self.failing.insert(format.extension());
        self
    }

    /// Reports success for `format` without writing a file.
    pub fn without_output_for(mut self, format: ImageFormat) -> Self {
        self.without_output.insert(format.extension());
        self
    }

    pub fn calls(&self) -> Vec<ConvertCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageConverter for MockImageConverter {
    async fn convert(
        &self,
        source: &Path,
        target: &Path,
        size: &str,
        extra_args: &[String],
    ) -> Result<PathBuf, ConversionError> {
        self.calls.lock().unwrap().push(ConvertCall {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            size: size.to_string(),
            extra_args: extra_args.to_vec(),
        });

        let extension = target
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        if self.failing.contains(extension) {
            return Err(ConversionError::EngineFailure(format!(
                "no encode delegate for {extension}"
            )));
        }

        if !self.without_output.contains(extension) {
            tokio::fs::copy(source, target)
                .await
                .map_err(|e| ConversionError::EngineFailure(e.to_string()))?;
        }

        Ok(target.to_path_buf())
    }
}
