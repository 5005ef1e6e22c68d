//! Ping Handler
//!
//! 健康检查：版本、激活模型、常驻通道状态

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::application::GetServiceStatus;
use crate::infrastructure::http::dto::PingResponse;
use crate::infrastructure::http::state::AppState;

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    let status = state.status_handler.handle(GetServiceStatus);

    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: status.model,
        warm_lane: status.warm_lane,
        timestamp: Utc::now().to_rfc3339(),
    })
}
