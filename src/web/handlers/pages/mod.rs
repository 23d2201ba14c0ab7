//! # 页面处理器
//!
//! 页面以 JSON 上下文渲染：模板名、待显示的一次性消息与页面数据。
//! 表单提交成功后以 303 重定向，失败时按错误类型重定向或重新渲染表单。

pub mod accounts;
pub mod admissions;
pub mod dashboard;
pub mod notices;
pub mod public;
pub mod roles;
pub mod users;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error_stage;
use crate::error::{FieldErrors, PortalError};
use crate::logging::{LogComponent, log_management_error};
use crate::web::flash::{self, FlashMessage};
use crate::web::middleware::auth::LOGIN_URL;
use crate::web::services::PaginationInfo;

pub(crate) const DASHBOARD_URL: &str = "/dashboard/";

#[derive(Serialize)]
struct Page<T: Serialize> {
    template: &'static str,
    messages: Vec<FlashMessage>,
    #[serde(flatten)]
    context: T,
}

#[derive(Serialize)]
struct Invalid<'a, T: Serialize> {
    errors: &'a FieldErrors,
    #[serde(flatten)]
    context: T,
}

/// 列表页查询参数
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub search: Option<String>,
}

/// 列表页分页导航
#[derive(Debug, Serialize)]
pub(crate) struct PageNav {
    page: u64,
    pages: u64,
    total: u64,
    has_next: bool,
    has_previous: bool,
}

impl From<PaginationInfo> for PageNav {
    fn from(info: PaginationInfo) -> Self {
        Self {
            page: info.page,
            pages: info.pages,
            total: info.total,
            has_next: info.has_next(),
            has_previous: info.has_previous(),
        }
    }
}

/// 渲染页面上下文，同时取出待显示的消息
pub(crate) fn render<T: Serialize>(
    jar: CookieJar,
    status: StatusCode,
    template: &'static str,
    context: T,
) -> Response {
    let (jar, messages) = flash::drain(jar);
    (
        status,
        jar,
        Json(Page {
            template,
            messages,
            context,
        }),
    )
        .into_response()
}

pub(crate) fn page<T: Serialize>(jar: CookieJar, template: &'static str, context: T) -> Response {
    render(jar, StatusCode::OK, template, context)
}

pub(crate) fn redirect(jar: CookieJar, to: &str) -> Response {
    (jar, Redirect::to(to)).into_response()
}

/// 写入成功提示后重定向
pub(crate) fn redirect_success(jar: CookieJar, to: &str, message: Option<String>) -> Response {
    let jar = match message {
        Some(message) => flash::success(jar, message),
        None => jar,
    };
    redirect(jar, to)
}

pub(crate) fn log_page_error(
    request_id: &str,
    component: LogComponent,
    operation: &str,
    message: &str,
    err: &PortalError,
) {
    log_management_error(request_id, error_stage(err), component, operation, message, err);
}

/// 错误转页面响应
///
/// 权限不足与业务拒绝写入错误提示并重定向到 `denied_to`；未找到渲染 404。
pub(crate) fn page_error(jar: CookieJar, err: PortalError, denied_to: &str) -> Response {
    match err.root() {
        PortalError::PermissionDenied { .. } | PortalError::Business { .. } => {
            redirect(flash::error(jar, err.client_message()), denied_to)
        }
        PortalError::Authentication { .. } => redirect(jar, LOGIN_URL),
        PortalError::NotFound { .. } => render(
            jar,
            StatusCode::NOT_FOUND,
            "404",
            json!({ "detail": err.client_message() }),
        ),
        PortalError::Validation { fields, .. } => render(
            jar,
            StatusCode::BAD_REQUEST,
            "400",
            json!({ "errors": fields }),
        ),
        _ => {
            let (status, _) = err.to_http_response_parts();
            render(jar, status, "500", json!({ "detail": "Server Error (500)" }))
        }
    }
}

/// 表单提交失败：校验错误时以 400 重新渲染表单，其余同 [`page_error`]
pub(crate) fn form_error<T: Serialize>(
    jar: CookieJar,
    err: PortalError,
    denied_to: &str,
    template: &'static str,
    context: T,
) -> Response {
    match err.field_errors() {
        Some(errors) => render(
            jar,
            StatusCode::BAD_REQUEST,
            template,
            Invalid { errors, context },
        ),
        None => page_error(jar, err, denied_to),
    }
}
