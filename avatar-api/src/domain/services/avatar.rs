use std::{net::IpAddr, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::{
    config::NegotiationSettings,
    domain::{
        authorization::authorize_write,
        models::{Artifact, AvatarId, AvatarRequest, Capabilities, ServedAvatar, UploadOutcome},
        negotiation::negotiate,
        ports::{
            inbound::AvatarService,
            outbound::{ImageConverter, OriginalStore},
        },
        source::resolve_source,
        AvatarError,
    },
    services::ResultCache,
};

use super::ConversionOrchestrator;

pub struct AvatarServiceImpl<C, S> {
    capabilities: Capabilities,
    negotiation: NegotiationSettings,
    cache: ResultCache,
    orchestrator: ConversionOrchestrator<C>,
    store: Arc<S>,
    originals_dir: PathBuf,
    default_image_path: PathBuf,
}

impl<C: ImageConverter, S: OriginalStore> AvatarServiceImpl<C, S> {
    pub fn new(
        capabilities: Capabilities,
        negotiation: NegotiationSettings,
        cache: ResultCache,
        orchestrator: ConversionOrchestrator<C>,
        store: Arc<S>,
        originals_dir: impl Into<PathBuf>,
        default_image_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            capabilities,
            negotiation,
            cache,
            orchestrator,
            store,
            originals_dir: originals_dir.into(),
            default_image_path: default_image_path.into(),
        }
    }
}

fn serve(artifact: Arc<Artifact>) -> ServedAvatar {
    ServedAvatar {
        content_type: artifact.content_type(),
        artifact,
    }
}

#[async_trait]
impl<C: ImageConverter, S: OriginalStore> AvatarService for AvatarServiceImpl<C, S> {
    #[instrument(skip(self), fields(id = %request.id))]
    async fn get_avatar(&self, request: &AvatarRequest) -> Result<ServedAvatar, AvatarError> {
        let signature = request.signature();
        if let Some(artifact) = self.cache.get(&signature).await {
            return Ok(serve(artifact));
        }

        let spec = negotiate(request, &self.capabilities, &self.negotiation)?;

        let id = request.id.clone();
        let originals_dir = self.originals_dir.clone();
        let default_image_path = self.default_image_path.clone();
        let source = tokio::task::spawn_blocking(move || {
            resolve_source(&id, &originals_dir, &default_image_path)
        })
        .await
        .map_err(|err| AvatarError::internal(format!("source resolution task failed: {err}")))?;

        let artifact = self
            .orchestrator
            .convert(
                request.id.as_str(),
                &source,
                &spec.dimensions(),
                spec.format,
                spec.single_frame,
            )
            .await
            .map_err(|err| {
                error!(
                    "Conversion of {} to {} {} failed: {}",
                    source.display(),
                    spec.dimensions(),
                    spec.format,
                    err
                );
                err
            })?;

        info!(
            "Converted {} to {} {}",
            source.display(),
            spec.dimensions(),
            spec.format
        );

        let artifact = Arc::new(artifact.with_content_type(spec.content_type));
        self.cache
            .set(signature, Arc::clone(&artifact), self.cache.default_ttl());

        Ok(serve(artifact))
    }

    // Cached conversions of the previous original stay servable until they expire.
    #[instrument(skip(self, image))]
    async fn upload_avatar(
        &self,
        id: &AvatarId,
        image: Option<Vec<u8>>,
        remote_addr: IpAddr,
    ) -> Result<UploadOutcome, AvatarError> {
        authorize_write(remote_addr)?;

        let Some(image) = image else {
            return Ok(UploadOutcome::NoFile);
        };

        self.store.save(id, &image).await?;
        Ok(UploadOutcome::Stored)
    }
}
