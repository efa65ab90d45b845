use std::sync::{Arc, RwLock};

use cadence::StatsdClient;

use broker_common::errors::Result;
use broker_common::metrics::new_metrics;
use broker_delivery::{spawn_delivery_engine, spawn_reaper, DeliveryHandle};
use broker_registry::{DurableStore, FileDurableStore, Registry};

use crate::Settings;

/// Everything a session handler or HTTP route needs, threaded through
/// `actix_web::web::Data` rather than kept in ambient globals (spec.md §9's
/// explicit redesign note).
#[derive(Clone)]
pub struct AppState {
    /// The single authoritative Registry, guarded by one `RwLock` per
    /// spec.md §5's "global lock around all mutating operations" option.
    pub registry: Arc<RwLock<Registry>>,
    /// Handle to the Delivery Engine's command queue.
    pub delivery: DeliveryHandle,
    pub durable: Arc<dyn DurableStore>,
    pub metrics: Arc<StatsdClient>,
    pub settings: Settings,
}

impl AppState {
    /// Build the process's `AppState`: restore the registry from durable
    /// storage if present, then spawn the Delivery Engine and Reaper
    /// background workers against it.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let metrics = Arc::new(new_metrics(
            settings.statsd_host.clone(),
            settings.statsd_port,
            &settings.statsd_label,
        )?);

        let durable: Arc<dyn DurableStore> =
            Arc::new(FileDurableStore::new(&settings.state_file));

        let mut registry = Registry::new();
        match durable.load() {
            Ok(Some(snapshot)) => {
                debug!("restored registry snapshot from {}", settings.state_file);
                registry.restore(snapshot);
            }
            Ok(None) => debug!("no durable state file found, starting with an empty registry"),
            Err(e) => error!("failed to load durable state, starting empty: {}", e),
        }
        let registry = Arc::new(RwLock::new(registry));

        let delivery = spawn_delivery_engine(registry.clone(), settings.redrive_interval);
        spawn_reaper(registry.clone(), settings.reap_interval, settings.reap_threshold);

        Ok(Self {
            registry,
            delivery,
            durable,
            metrics,
            settings,
        })
    }

    /// Snapshot the registry and persist it, logging (not propagating) any
    /// failure — spec.md §7: "State persistence errors: log; continue
    /// serving from in-memory state."
    pub fn snapshot_and_persist(&self) {
        let snapshot = self
            .registry
            .read()
            .expect("registry lock poisoned")
            .snapshot();
        if let Err(e) = self.durable.save(&snapshot) {
            error!("failed to persist registry snapshot: {}", e);
        }
    }

    pub fn base_url(&self) -> String {
        self.settings.base_url()
    }
}

#[cfg(debug_assertions)]
impl Default for AppState {
    fn default() -> Self {
        Self::from_settings(Settings::test_settings()).expect("default test settings are valid")
    }
}
