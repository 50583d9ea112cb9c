//! Shared application state.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::registry::Registry;

/// State shared by the HTTP handlers, the runner tasks and the sweeper.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            config: Arc::new(config),
        }
    }
}
