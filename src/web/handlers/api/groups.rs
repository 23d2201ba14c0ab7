//! # 角色（用户组）API

use axum::{
    extract::{Extension, Path, State},
    response::Response,
};

use super::api_error;
use crate::logging::LogComponent;
use crate::web::{
    extract::{Authenticated, Json},
    middleware::RequestId,
    response,
    server::AppState,
    services::roles::{RoleInput, RolesService},
};

pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
) -> Response {
    match RolesService::new(&state).list(&actor).await {
        Ok(roles) => response::success(roles),
        Err(err) => api_error(&request_id, LogComponent::Roles, "list_roles_fail", "获取角色列表失败", err),
    }
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
) -> Response {
    match RolesService::new(&state).get(&actor, id).await {
        Ok(role) => response::success(role),
        Err(err) => api_error(&request_id, LogComponent::Roles, "get_role_fail", "获取角色失败", err),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Json(input): Json<RoleInput>,
) -> Response {
    match RolesService::new(&state).create(&actor, &input).await {
        Ok(role) => {
            let message = format!("Role \"{}\" created successfully!", role.name);
            response::created(role, Some(message))
        }
        Err(err) => api_error(&request_id, LogComponent::Roles, "create_role_fail", "创建角色失败", err),
    }
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
    Json(input): Json<RoleInput>,
) -> Response {
    update(&state, &request_id, &actor, id, &input, false).await
}

pub async fn patch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
    Json(input): Json<RoleInput>,
) -> Response {
    update(&state, &request_id, &actor, id, &input, true).await
}

async fn update(
    state: &AppState,
    request_id: &RequestId,
    actor: &Authenticated,
    id: i32,
    input: &RoleInput,
    partial: bool,
) -> Response {
    match RolesService::new(state).update(actor, id, input, partial).await {
        Ok(role) => {
            let message = format!("Role \"{}\" updated successfully!", role.name);
            response::success_with_message(role, &message)
        }
        Err(err) => api_error(request_id, LogComponent::Roles, "update_role_fail", "更新角色失败", err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
) -> Response {
    match RolesService::new(&state).delete(&actor, id).await {
        Ok(name) => response::success_without_data(&format!("Role \"{name}\" deleted successfully!")),
        Err(err) => api_error(&request_id, LogComponent::Roles, "delete_role_fail", "删除角色失败", err),
    }
}
