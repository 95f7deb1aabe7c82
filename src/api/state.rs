use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::agent::Orchestrator;
use crate::store::Store;

/// Shared application state for API handlers (spec §6).
#[derive(Clone)]
pub struct AppState {
    /// Drives the chat endpoint: classify → optimize or tool-call loop.
    pub orchestrator: Arc<Orchestrator>,

    /// Queried directly for `/health`'s DB connectivity check.
    pub store: Arc<Store>,

    /// Application start time, for `/health`'s `uptimeSecs`.
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, store: Arc<Store>) -> Self {
        Self {
            orchestrator,
            store,
            start_time: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
