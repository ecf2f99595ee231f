use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::domain::{
    models::AvatarId, ports::outbound::OriginalStore, source::original_path, StorageError,
};

/// Stores originals as `<originals_dir>/<id>.dat`.
pub struct FsOriginalStore {
    originals_dir: PathBuf,
}

impl FsOriginalStore {
    pub fn new(originals_dir: impl Into<PathBuf>) -> Self {
        Self {
            originals_dir: originals_dir.into(),
        }
    }
}

#[async_trait]
impl OriginalStore for FsOriginalStore {
    async fn save(&self, id: &AvatarId, bytes: &[u8]) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.originals_dir).await?;

        let destination = original_path(&self.originals_dir, id);
        // Written beside the destination and renamed, so readers never see a partial file.
        let staging = self.originals_dir.join(format!(
            ".{}.{}.upload",
            id.as_str(),
            uuid::Uuid::new_v4().simple()
        ));

        let result = async {
            let mut file = tokio::fs::File::create(&staging).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&staging, &destination).await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        info!(
            "Stored original for {} at {} ({} bytes)",
            id,
            destination.display(),
            bytes.len()
        );
        Ok(())
    }
}
