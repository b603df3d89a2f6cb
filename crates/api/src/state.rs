use std::sync::Arc;

use devcfg_core::service::TemplateService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Template lifecycle service over the configured store.
    pub templates: TemplateService,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
