//! # 仪表盘 API

use axum::{
    extract::{Extension, State},
    response::Response,
};

use super::api_error;
use crate::auth::Capabilities;
use crate::logging::LogComponent;
use crate::web::{
    extract::Authenticated, middleware::RequestId, response, server::AppState,
    services::dashboard::DashboardService,
};

/// 统计数据
pub async fn stats(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
) -> Response {
    match DashboardService::new(&state).stats(&actor).await {
        Ok(stats) => response::success(stats),
        Err(err) => api_error(&request_id, LogComponent::Dashboard, "stats_fail", "获取仪表盘统计失败", err),
    }
}

/// 当前用户的能力摘要
pub async fn capabilities(actor: Authenticated) -> Response {
    response::success(Capabilities::of(&actor))
}
