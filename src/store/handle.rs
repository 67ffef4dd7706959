//! Config-keyed store handle.
//!
//! The store client is built lazily on first use and cached, keyed by the
//! configured endpoint URL. A config reload that changes the endpoint
//! makes the next `get()` rebuild the client, so live reconfiguration
//! needs no process restart. Construction races between concurrent first
//! requests converge on whichever instance wrote last; a redundant build
//! only wastes a client, it cannot corrupt anything.

use super::{ReportStore, StoreError, SupabaseStore};
use crate::app_config;
use arc_swap::ArcSwapOption;
use std::sync::Arc;

struct CachedStore {
    endpoint: String,
    store: Arc<dyn ReportStore>,
}

/// Handle held in app data; shared by all workers.
pub struct StoreHandle {
    cached: ArcSwapOption<CachedStore>,
    /// When set, `get()` never consults the configuration. Used by tests
    /// to pin a mock store.
    pinned: bool,
}

impl Default for StoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreHandle {
    pub fn new() -> Self {
        Self {
            cached: ArcSwapOption::empty(),
            pinned: false,
        }
    }

    /// A handle permanently bound to the given store.
    pub fn fixed(store: Arc<dyn ReportStore>) -> Self {
        Self {
            cached: ArcSwapOption::from(Some(Arc::new(CachedStore {
                endpoint: String::new(),
                store,
            }))),
            pinned: true,
        }
    }

    /// The store for the currently configured endpoint, building it if the
    /// cache is empty or the endpoint changed since the last build.
    pub fn get(&self) -> Result<Arc<dyn ReportStore>, StoreError> {
        let cached = self.cached.load_full();

        if self.pinned {
            if let Some(cached) = cached {
                return Ok(cached.store.clone());
            }
        }

        let config = app_config::backend();
        if let Some(cached) = cached {
            if cached.endpoint == config.url {
                return Ok(cached.store.clone());
            }
            log::info!(
                "backend endpoint changed from {} to {}, rebuilding store client",
                cached.endpoint,
                config.url
            );
        }

        let store: Arc<dyn ReportStore> = Arc::new(SupabaseStore::new(&config)?);
        self.cached.store(Some(Arc::new(CachedStore {
            endpoint: config.url,
            store: store.clone(),
        })));
        Ok(store)
    }
}
