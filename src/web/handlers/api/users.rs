//! # 用户管理 API

use axum::{
    extract::{Extension, Path, Query, State},
    response::Response,
};
use serde::Deserialize;

use super::{api_error, api_pagination};
use crate::logging::LogComponent;
use crate::web::{
    extract::{Authenticated, Json},
    middleware::RequestId,
    response,
    server::AppState,
    services::users::{UserFilter, UserInput, UsersService},
};

/// 用户列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    /// 角色 ID
    pub role: Option<String>,
}

/// 角色分配请求
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRolesRequest {
    #[serde(default)]
    pub groups: Vec<i32>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Query(query): Query<UserQuery>,
) -> Response {
    let params = api_pagination(&state, query.page, query.limit);
    let filter = UserFilter {
        search: query.search,
        role: query.role,
    };

    match UsersService::new(&state).list(&actor, &filter, params).await {
        Ok((items, pagination)) => response::paginated(items, pagination.into()),
        Err(err) => api_error(&request_id, LogComponent::Users, "list_users_fail", "获取用户列表失败", err),
    }
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
) -> Response {
    match UsersService::new(&state).get(&actor, id).await {
        Ok(user) => response::success(user),
        Err(err) => api_error(&request_id, LogComponent::Users, "get_user_fail", "获取用户失败", err),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Json(input): Json<UserInput>,
) -> Response {
    match UsersService::new(&state).create(&actor, &input).await {
        Ok(result) => response::created(result.data, result.message),
        Err(err) => api_error(&request_id, LogComponent::Users, "create_user_fail", "创建用户失败", err),
    }
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
    Json(input): Json<UserInput>,
) -> Response {
    update(&state, &request_id, &actor, id, &input, false).await
}

pub async fn patch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
    Json(input): Json<UserInput>,
) -> Response {
    update(&state, &request_id, &actor, id, &input, true).await
}

async fn update(
    state: &AppState,
    request_id: &RequestId,
    actor: &Authenticated,
    id: i32,
    input: &UserInput,
    partial: bool,
) -> Response {
    match UsersService::new(state).update(actor, id, input, partial).await {
        Ok(result) => response::from_service(result),
        Err(err) => api_error(request_id, LogComponent::Users, "update_user_fail", "更新用户失败", err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
) -> Response {
    match UsersService::new(&state).delete(&actor, id).await {
        Ok(result) => response::from_service(result),
        Err(err) => api_error(&request_id, LogComponent::Users, "delete_user_fail", "删除用户失败", err),
    }
}

/// 整体替换用户角色，未知角色 ID 忽略
pub async fn update_roles(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
    Json(request): Json<UpdateRolesRequest>,
) -> Response {
    match UsersService::new(&state)
        .set_groups(&actor, id, &request.groups, false)
        .await
    {
        Ok(result) => response::from_service(result),
        Err(err) => api_error(&request_id, LogComponent::Users, "update_roles_fail", "更新用户角色失败", err),
    }
}
