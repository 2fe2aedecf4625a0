//! API shared state

use std::sync::Arc;

use crate::{actors::broadcaster::BroadcasterHandle, service::ReadingService};

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Ingest and query operations
    pub service: Arc<ReadingService>,
}

impl ApiState {
    pub fn new(service: Arc<ReadingService>) -> Self {
        Self { service }
    }

    /// Broadcaster live connections subscribe to
    pub fn broadcaster(&self) -> &BroadcasterHandle {
        self.service.broadcaster()
    }
}
