//! # REST API 处理器
//!
//! 处理 HTTP 请求，委托具体业务给 `web::services`，结果统一包装为 JSON 信封。

pub mod admissions;
pub mod auth;
pub mod dashboard;
pub mod groups;
pub mod notices;
pub mod permissions;
pub mod users;

use axum::response::Response;
use serde::Deserialize;

use super::error_stage;
use crate::error::PortalError;
use crate::logging::{LogComponent, log_management_error};
use crate::web::response;
use crate::web::server::AppState;
use crate::web::services::PaginationParams;

/// 列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

impl ListQuery {
    pub(crate) fn pagination(&self, state: &AppState) -> PaginationParams {
        api_pagination(state, self.page, self.limit)
    }
}

/// API 分页：`limit` 缺省与上限取自配置
pub(crate) fn api_pagination(state: &AppState, page: Option<u64>, limit: Option<u64>) -> PaginationParams {
    let config = &state.config.pagination;
    PaginationParams::new(page, limit, config.api_default_limit, config.api_max_limit)
}

/// 记录失败并转换为错误响应
pub(crate) fn api_error(
    request_id: &str,
    component: LogComponent,
    operation: &str,
    message: &str,
    err: PortalError,
) -> Response {
    log_management_error(request_id, error_stage(&err), component, operation, message, &err);
    response::app_error(err)
}
