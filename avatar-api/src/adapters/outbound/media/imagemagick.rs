use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domain::{ports::outbound::ImageConverter, ConversionError};

/// Runs ImageMagick's `convert` (or `magick`) as a child process.
///
/// The child is killed if the conversion future is dropped, so an abandoned
/// request does not leave an orphaned process behind.
pub struct ImageMagickConverter {
    binary: String,
    timeout: Duration,
}

impl ImageMagickConverter {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ImageConverter for ImageMagickConverter {
    #[instrument(skip(self, extra_args), fields(binary = %self.binary))]
    async fn convert(
        &self,
        source: &Path,
        target: &Path,
        size: &str,
        extra_args: &[String],
    ) -> Result<PathBuf, ConversionError> {
        let args = build_args(source, target, size, extra_args);

        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ConversionError::EngineFailure(format!(
                    "failed to run {}: {}",
                    self.binary, e
                )))
            }
            Err(_) => {
                return Err(ConversionError::EngineFailure(format!(
                    "{} did not finish within {:?}",
                    self.binary, self.timeout
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::EngineFailure(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("stdout: {}", stdout.trim());
        }

        Ok(target.to_path_buf())
    }
}

/// `source [extra] -resize WxH^ -gravity center -extent WxH +repage target`
///
/// Fills the box and crops the overflow so the result is exactly `WxH`.
fn build_args(source: &Path, target: &Path, size: &str, extra_args: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(extra_args.len() + 9);
    args.push(source.as_os_str().to_owned());
    args.extend(extra_args.iter().map(OsString::from));
    args.push("-resize".into());
    args.push(format!("{size}^").into());
    args.push("-gravity".into());
    args.push("center".into());
    args.push("-extent".into());
    args.push(size.into());
    args.push("+repage".into());
    args.push(output_spec(target));
    args
}

// ImageMagick only writes animated PNG when asked for it explicitly.
fn output_spec(target: &Path) -> OsString {
    match target.extension().and_then(|ext| ext.to_str()) {
        Some("apng") => {
            let mut spec = OsString::from("APNG:");
            spec.push(target.as_os_str());
            spec
        }
        _ => target.as_os_str().to_owned(),
    }
}
