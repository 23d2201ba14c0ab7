//! # 入学申请 API
//!
//! 提交对匿名开放，其余操作需要登录与对应权限。

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
    services::admissions::{AdmissionFilter, AdmissionInput, AdmissionsService},
};

/// 申请列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct AdmissionQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    /// 报读年级（精确匹配）
    pub grade: Option<String>,
}

/// 匿名提交申请
pub async fn submit(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(input): Json<AdmissionInput>,
) -> Response {
    match AdmissionsService::new(&state).submit(&input).await {
        Ok(result) => response::created(result.data, result.message),
        Err(err) => api_error(&request_id, LogComponent::Admissions, "submit_admission_fail", "提交入学申请失败", err),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Query(query): Query<AdmissionQuery>,
) -> Response {
    let filter = AdmissionFilter {
        search: query.search,
        grade: query.grade,
    };
    let params = api_pagination(&state, query.page, query.limit);

    match AdmissionsService::new(&state).list(&actor, &filter, params).await {
        Ok((items, pagination)) => response::paginated(items, pagination.into()),
        Err(err) => api_error(&request_id, LogComponent::Admissions, "list_admissions_fail", "获取入学申请列表失败", err),
    }
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
) -> Response {
    match AdmissionsService::new(&state).get(&actor, id).await {
        Ok(application) => response::success(application),
        Err(err) => api_error(&request_id, LogComponent::Admissions, "get_admission_fail", "获取入学申请失败", err),
    }
}

pub async fn replace(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
    Json(input): Json<AdmissionInput>,
) -> Response {
    update(&state, &request_id, &actor, id, &input, false).await
}

pub async fn patch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
    Json(input): Json<AdmissionInput>,
) -> Response {
    update(&state, &request_id, &actor, id, &input, true).await
}

async fn update(
    state: &AppState,
    request_id: &RequestId,
    actor: &Authenticated,
    id: i32,
    input: &AdmissionInput,
    partial: bool,
) -> Response {
    match AdmissionsService::new(state).update(actor, id, input, partial).await {
        Ok(result) => response::from_service(result),
        Err(err) => api_error(request_id, LogComponent::Admissions, "update_admission_fail", "更新入学申请失败", err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    Path(id): Path<i32>,
) -> Response {
    match AdmissionsService::new(&state).delete(&actor, id).await {
        Ok(result) => response::from_service(result),
        Err(err) => api_error(&request_id, LogComponent::Admissions, "delete_admission_fail", "删除入学申请失败", err),
    }
}
