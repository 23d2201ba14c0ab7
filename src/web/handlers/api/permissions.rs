//! # 权限目录 API

use axum::{
    extract::{Extension, Path, State},
    response::Response,
};

use super::api_error;
use crate::logging::LogComponent;
use crate::web::{
    extract::Authenticated, middleware::RequestId, response, server::AppState,
    services::roles::RolesService,
};

/// 全部权限，按内容类型与名称排序
pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
) -> Response {
    match RolesService::new(&state).catalog(&actor).await {
        Ok(permissions) => response::success(permissions),
        Err(err) => api_error(&request_id, LogComponent::Roles, "list_permissions_fail", "获取权限列表失败", err),
    }
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
) -> Response {
    match RolesService::new(&state).permission(&actor, id).await {
        Ok(permission) => response::success(permission),
        Err(err) => api_error(&request_id, LogComponent::Roles, "get_permission_fail", "获取权限失败", err),
    }
}
