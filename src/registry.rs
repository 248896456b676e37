//! Backend registry with startup capability negotiation.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::traits::SystemsDriver;

/// Registry of available systems drivers.
///
/// Backends are probed when registered and excluded when unavailable, so
/// availability is an explicit startup decision rather than an import-time
/// side effect. The front-end resolves drivers by tag and holds them as
/// `Arc<dyn SystemsDriver>`.
pub struct DriverRegistry {
    drivers: HashMap<&'static str, Arc<dyn SystemsDriver>>,
    order: Vec<&'static str>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Probe a backend and register it when available.
    ///
    /// Returns whether the backend was registered. Re-registering a tag
    /// replaces the previous driver.
    pub async fn register(&mut self, driver: Arc<dyn SystemsDriver>) -> bool {
        let tag = driver.driver();

        if !driver.probe().await {
            warn!(driver = tag, "Backend unavailable, excluding from registry");
            return false;
        }

        if self.drivers.insert(tag, driver).is_none() {
            self.order.push(tag);
        }
        info!(driver = tag, "Backend registered");
        true
    }

    /// Look up a driver by its tag.
    pub fn get(&self, tag: &str) -> Option<Arc<dyn SystemsDriver>> {
        self.drivers.get(tag).cloned()
    }

    /// The first registered driver, used when no tag is configured.
    pub fn default_driver(&self) -> Option<Arc<dyn SystemsDriver>> {
        self.order.first().and_then(|tag| self.get(tag))
    }

    /// Tags of all registered drivers, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
