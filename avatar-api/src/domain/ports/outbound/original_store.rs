use async_trait::async_trait;

use crate::domain::{models::AvatarId, StorageError};

/// Write side of the originals directory.
#[async_trait]
pub trait OriginalStore: Send + Sync + 'static {
    /// Replaces any stored original for `id`.
    async fn save(&self, id: &AvatarId, bytes: &[u8]) -> Result<(), StorageError>;
}
