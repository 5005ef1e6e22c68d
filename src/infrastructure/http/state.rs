//! Application State
//!
//! HTTP 层共享的 Command/Query Handlers

use crate::application::{GetServiceStatusHandler, LaneRouter};

/// 应用状态
pub struct AppState {
    // ========== Command Handlers ==========
    pub lane_router: LaneRouter,

    // ========== Query Handlers ==========
    pub status_handler: GetServiceStatusHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(lane_router: LaneRouter) -> Self {
        Self {
            status_handler: GetServiceStatusHandler::new(lane_router.warm_lane().clone()),
            lane_router,
        }
    }
}
