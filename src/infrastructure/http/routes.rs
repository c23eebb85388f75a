//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/styles            GET   风格预设、参数范围、当前后端能力
//! - /api/story/scenes      POST  预览场景与提示词（不调用后端）
//! - /api/story/illustrate  POST  生成全部场景后一次性返回
//! - /ws/illustrate         WS    逐场景推送生成事件

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
        .nest("/api", api_routes())
        .route("/ws/illustrate", get(handlers::illustrate_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/styles", get(handlers::list_styles))
        .nest("/story", story_routes())
}

/// Story 路由
fn story_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scenes", post(handlers::preview_scenes))
        .route("/illustrate", post(handlers::illustrate_story))
}
