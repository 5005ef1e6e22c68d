//! HTTP Routes
//!
//! API Endpoints:
//! - /v1/audio/speech       POST  语音合成（OpenAI 兼容，JSON 或 multipart）
//! - /api/ping              GET   健康检查

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/v1", openai_routes())
        .nest("/api", api_routes())
}

/// OpenAI 兼容路由
fn openai_routes() -> Router<Arc<AppState>> {
    Router::new().route("/audio/speech", post(handlers::create_speech))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/ping", get(handlers::ping))
}
