use axum::{routing::get, Router};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::{app_state::AppState, config::ApplicationSettings, routes};

pub fn create(app_state: AppState, settings: &ApplicationSettings) -> Router<()> {
    let avatars = routes::avatars::router(settings.max_upload_bytes);
    let base_path = settings.normalized_base_path();

    let app = Router::new().route("/", get(liveness));
    let app = if base_path.is_empty() {
        app.merge(avatars)
    } else {
        app.nest(&base_path, avatars)
    };

    app.with_state(app_state)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

async fn liveness() -> String {
    format!("avatar-api {}", env!("CARGO_PKG_VERSION"))
}
