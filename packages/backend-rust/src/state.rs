use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::adaptive::{AdaptiveEngine, ModelStore};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<AdaptiveEngine>,
    store: Arc<ModelStore>,
    started_at: Instant,
    started_at_system: SystemTime,
}

impl AppState {
    pub fn new(engine: Arc<AdaptiveEngine>, store: ModelStore) -> Self {
        Self {
            engine,
            store: Arc::new(store),
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
        }
    }

    pub fn engine(&self) -> &Arc<AdaptiveEngine> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }
}
