//! Status Query Handlers

use std::sync::Arc;

use crate::application::queries::{GetServiceStatus, ServiceStatus};
use crate::application::warm_lane::WarmResourceGuard;

/// GetServiceStatus Handler
pub struct GetServiceStatusHandler {
    warm: Arc<WarmResourceGuard>,
}

impl GetServiceStatusHandler {
    pub fn new(warm: Arc<WarmResourceGuard>) -> Self {
        Self { warm }
    }

    pub fn handle(&self, _query: GetServiceStatus) -> ServiceStatus {
        ServiceStatus {
            model: self.warm.active_model().to_string(),
            warm_lane: self.warm.state(),
        }
    }
}
