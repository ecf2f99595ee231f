use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,avatar_api=debug,tower_http=info";

/// Installs the global `fmt` subscriber, filtered by `RUST_LOG`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();
}
