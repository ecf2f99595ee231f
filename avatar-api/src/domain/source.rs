use std::path::{Path, PathBuf};

use super::models::AvatarId;

pub const ORIGINAL_EXTENSION: &str = "dat";

/// Where the original for `id` is stored, whether or not it exists.
pub fn original_path(originals_dir: &Path, id: &AvatarId) -> PathBuf {
    originals_dir.join(format!("{}.{}", id.as_str(), ORIGINAL_EXTENSION))
}

/// Picks the image a conversion should start from.
///
/// Returns the stored original if it is a regular file, otherwise the
/// default image. Never fails; performs blocking I/O.
pub fn resolve_source(id: &AvatarId, originals_dir: &Path, default_image_path: &Path) -> PathBuf {
    let candidate = original_path(originals_dir, id);
    match std::fs::metadata(&candidate) {
        Ok(metadata) if metadata.is_file() => candidate,
        _ => default_image_path.to_path_buf(),
    }
}
