use crate::config::Config;
use crate::enhancer::EnhancerClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub enhancer: EnhancerClient,
    pub config: Config,
}
