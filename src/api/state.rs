//! Application state for the Labor Cost Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::store::PayrollPeriodStore;

/// Shared application state.
///
/// Holds the loaded configuration and the period store shared by every
/// request handler.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    store: Arc<PayrollPeriodStore>,
}

impl AppState {
    /// Creates application state with an empty period store.
    pub fn new(config: ConfigLoader) -> Self {
        Self::with_store(config, PayrollPeriodStore::new())
    }

    /// Creates application state around an existing store.
    pub fn with_store(config: ConfigLoader, store: PayrollPeriodStore) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns a reference to the period store.
    pub fn store(&self) -> &PayrollPeriodStore {
        &self.store
    }
}
