//! # 公开页面
//!
//! 首页、公告列表与入学申请表单，均无需登录。

use axum::{
    Form,
    extract::{Extension, Query, State},
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use super::{PageNav, PageQuery, form_error, log_page_error, page, page_error, redirect_success};
use crate::logging::LogComponent;
use crate::web::{
    middleware::RequestId,
    server::AppState,
    services::{
        PaginationParams,
        admissions::{AdmissionInput, AdmissionsService, gender_choices},
        notices::NoticesService,
    },
};

const ADMISSION_FORM_TEMPLATE: &str = "public/admission_form";

/// 首页：最新启用公告
pub async fn home(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    jar: CookieJar,
) -> Response {
    match NoticesService::new(&state).recent().await {
        Ok(recent_notices) => page(jar, "public/home", json!({ "recent_notices": recent_notices })),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Public, "home_fail", "加载首页失败", &err);
            page_error(jar, err, "/")
        }
    }
}

/// 启用公告列表，支持搜索
pub async fn notice_list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let params = PaginationParams::fixed(query.page, state.config.pagination.public_page_size);
    let result = NoticesService::new(&state)
        .list(None, false, query.search.as_deref(), params)
        .await;

    match result {
        Ok((notices, pagination)) => page(
            jar,
            "public/notice_list",
            json!({
                "notices": notices,
                "pagination": PageNav::from(pagination),
                "search": query.search.unwrap_or_default(),
            }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Public, "notice_list_fail", "加载公告列表失败", &err);
            page_error(jar, err, "/")
        }
    }
}

pub async fn admission_form(jar: CookieJar) -> Response {
    page(
        jar,
        ADMISSION_FORM_TEMPLATE,
        json!({ "form": AdmissionInput::default(), "gender_choices": gender_choices() }),
    )
}

/// 提交入学申请（匿名开放）
pub async fn admission_submit(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    jar: CookieJar,
    Form(form): Form<AdmissionInput>,
) -> Response {
    match AdmissionsService::new(&state).submit(&form).await {
        Ok(result) => redirect_success(jar, "/admission/success/", result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Public, "admission_submit_fail", "提交入学申请失败", &err);
            form_error(
                jar,
                err,
                "/admission/",
                ADMISSION_FORM_TEMPLATE,
                json!({ "form": form, "gender_choices": gender_choices() }),
            )
        }
    }
}

pub async fn admission_success(jar: CookieJar) -> Response {
    page(jar, "public/admission_success", json!({}))
}
