use std::net::IpAddr;

use async_trait::async_trait;

use crate::domain::{
    models::{AvatarId, AvatarRequest, ServedAvatar, UploadOutcome},
    AvatarError,
};

#[async_trait]
pub trait AvatarService: Send + Sync + 'static {
    /// Resolves a read request to an artifact, converting on cache miss.
    async fn get_avatar(&self, request: &AvatarRequest) -> Result<ServedAvatar, AvatarError>;

    /// Stores a new original. `None` for `image` is a no-op.
    async fn upload_avatar(
        &self,
        id: &AvatarId,
        image: Option<Vec<u8>>,
        remote_addr: IpAddr,
    ) -> Result<UploadOutcome, AvatarError>;
}
