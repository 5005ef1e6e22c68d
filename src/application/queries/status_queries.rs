//! Status Queries - 服务状态

use serde::Serialize;

use crate::application::warm_lane::WarmLaneState;

/// 查询当前模型与常驻通道状态
#[derive(Debug, Clone, Copy)]
pub struct GetServiceStatus;

/// 服务状态
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub model: String,
    pub warm_lane: WarmLaneState,
}
