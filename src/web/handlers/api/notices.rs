//! # 公告 API
//!
//! 读取对匿名开放（仅启用公告）；写操作需要对应权限，匿名写入返回 403。

use axum::{
    extract::{Extension, Path, Query, State},
    response::Response,
};

use super::{ListQuery, api_error};
use crate::logging::LogComponent;
use crate::web::{
    extract::{Caller, Json},
    middleware::RequestId,
    response,
    server::AppState,
    services::notices::{NoticeInput, NoticesService},
};

/// 公告列表
pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> Response {
    let service = NoticesService::new(&state);
    match service
        .list(
            caller.principal(),
            true,
            query.search.as_deref(),
            query.pagination(&state),
        )
        .await
    {
        Ok((items, pagination)) => response::paginated(items, pagination.into()),
        Err(err) => api_error(&request_id, LogComponent::Notices, "list_notices_fail", "获取公告列表失败", err),
    }
}

/// 最新公告
pub async fn recent(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    match NoticesService::new(&state).recent().await {
        Ok(items) => response::success(items),
        Err(err) => api_error(&request_id, LogComponent::Notices, "recent_notices_fail", "获取最新公告失败", err),
    }
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Response {
    match NoticesService::new(&state).get(caller.principal(), id).await {
        Ok(notice) => response::success(notice),
        Err(err) => api_error(&request_id, LogComponent::Notices, "get_notice_fail", "获取公告失败", err),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Json(input): Json<NoticeInput>,
) -> Response {
    let result = match caller.require_principal() {
        Ok(actor) => NoticesService::new(&state).create(actor, &input).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(result) => response::created(result.data, result.message),
        Err(err) => api_error(&request_id, LogComponent::Notices, "create_notice_fail", "创建公告失败", err),
    }
}

/// PUT：要求完整字段
pub async fn replace(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(input): Json<NoticeInput>,
) -> Response {
    update(&state, &request_id, &caller, id, &input, false).await
}

/// PATCH：缺省字段保持不变
pub async fn patch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Path(id): Path<i32>,
    Json(input): Json<NoticeInput>,
) -> Response {
    update(&state, &request_id, &caller, id, &input, true).await
}

async fn update(
    state: &AppState,
    request_id: &RequestId,
    caller: &Caller,
    id: i32,
    input: &NoticeInput,
    partial: bool,
) -> Response {
    let result = match caller.require_principal() {
        Ok(actor) => NoticesService::new(state).update(actor, id, input, partial).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(result) => response::from_service(result),
        Err(err) => api_error(request_id, LogComponent::Notices, "update_notice_fail", "更新公告失败", err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Path(id): Path<i32>,
) -> Response {
    let result = match caller.require_principal() {
        Ok(actor) => NoticesService::new(&state).delete(actor, id).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(result) => response::from_service(result),
        Err(err) => api_error(&request_id, LogComponent::Notices, "delete_notice_fail", "删除公告失败", err),
    }
}
