use std::{sync::Arc, time::Duration};

use crate::domain::ports::inbound::AvatarService;

#[derive(Clone)]
pub struct AppState {
    pub avatar_service: Arc<dyn AvatarService>,
    /// Advertised to clients via `Cache-Control`.
    pub cache_max_age: Duration,
}

impl AppState {
    pub fn new(avatar_service: Arc<dyn AvatarService>, cache_max_age: Duration) -> Self {
        Self {
            avatar_service,
            cache_max_age,
        }
    }
}
