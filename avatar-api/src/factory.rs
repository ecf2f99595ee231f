//! Composition root: the only place that names concrete adapters.

use std::sync::Arc;

use crate::{
    adapters::outbound::{fs::FsOriginalStore, media::ImageMagickConverter},
    app_state::AppState,
    config::Settings,
    domain::{
        models::Capabilities,
        ports::outbound::ImageConverter,
        services::{preflight, AvatarServiceImpl, ConversionOrchestrator},
        PreflightError,
    },
    services::ResultCache,
};

pub fn imagemagick_orchestrator(
    settings: &Settings,
) -> ConversionOrchestrator<ImageMagickConverter> {
    let converter = ImageMagickConverter::new(
        settings.images.converter_binary.clone(),
        settings.images.convert_timeout(),
    );
    ConversionOrchestrator::new(Arc::new(converter), settings.storage.temp_dir.clone())
}

/// Probes the conversion engine and assembles the application state.
///
/// Fails if the baseline format cannot be produced; nothing is served then.
pub async fn build_state<C: ImageConverter>(
    settings: &Settings,
    orchestrator: ConversionOrchestrator<C>,
) -> Result<AppState, PreflightError> {
    let capabilities =
        preflight::probe(&orchestrator, &settings.storage.default_image_path).await?;

    Ok(state_with(settings, capabilities, orchestrator))
}

fn state_with<C: ImageConverter>(
    settings: &Settings,
    capabilities: Capabilities,
    orchestrator: ConversionOrchestrator<C>,
) -> AppState {
    let cache = ResultCache::new(
        settings.images.cache_capacity,
        settings.images.cache_ttl(),
    );
    let service = AvatarServiceImpl::new(
        capabilities,
        settings.negotiation(),
        cache,
        orchestrator,
        Arc::new(FsOriginalStore::new(settings.storage.originals_dir.clone())),
        settings.storage.originals_dir.clone(),
        settings.storage.default_image_path.clone(),
    );

    AppState::new(Arc::new(service), settings.images.cache_ttl())
}
