//! Application state management

use domain_products::ProductStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub store: Arc<dyn ProductStore>,
}

impl AppState {
    pub fn new(config: crate::config::Config, store: Arc<dyn ProductStore>) -> Self {
        Self { config, store }
    }
}
