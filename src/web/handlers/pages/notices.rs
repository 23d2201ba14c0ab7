//! # 仪表盘公告管理页面

use axum::{
    Form,
    extract::{Extension, Path, Query, State},
    response::Response,
};
use axum_extra::extract::CookieJar;
use entity::notices;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{DASHBOARD_URL, PageNav, PageQuery, form_error, log_page_error, page, page_error, redirect_success};
use crate::auth::permissions as perms;
use crate::logging::LogComponent;
use crate::web::{
    extract::Authenticated,
    middleware::RequestId,
    server::AppState,
    services::{
        PaginationParams,
        notices::{NoticeInput, NoticesService},
        shared::checkbox,
    },
};

const LIST_URL: &str = "/dashboard/notices/";
const FORM_TEMPLATE: &str = "dashboard/notice_form";

/// 公告表单，未勾选的复选框不会出现在提交数据中
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoticeForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub is_active: Option<String>,
}

impl NoticeForm {
    fn input(&self) -> NoticeInput {
        NoticeInput {
            title: Some(self.title.clone()),
            content: Some(self.content.clone()),
            is_active: Some(checkbox(self.is_active.as_deref())),
        }
    }
}

impl From<&notices::Model> for NoticeForm {
    fn from(notice: &notices::Model) -> Self {
        Self {
            title: notice.title.clone(),
            content: notice.content.clone(),
            is_active: notice.is_active.then(|| "on".to_string()),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    if let Err(err) = actor.require_perm(perms::VIEW_NOTICE) {
        return page_error(jar, err, DASHBOARD_URL);
    }

    let params = PaginationParams::fixed(query.page, state.config.pagination.dashboard_page_size);
    let result = NoticesService::new(&state)
        .list(Some(&actor), true, query.search.as_deref(), params)
        .await;

    match result {
        Ok((notices, pagination)) => page(
            jar,
            "dashboard/notice_list",
            json!({
                "notices": notices,
                "pagination": PageNav::from(pagination),
                "search": query.search.unwrap_or_default(),
            }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Notices, "list_notices_fail", "获取公告列表失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

pub async fn create_form(actor: Authenticated, jar: CookieJar) -> Response {
    if let Err(err) = actor.require_perm(perms::ADD_NOTICE) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    let form = NoticeForm {
        is_active: Some("on".to_string()),
        ..NoticeForm::default()
    };
    page(jar, FORM_TEMPLATE, json!({ "form": form, "form_title": "Create Notice" }))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Form(form): Form<NoticeForm>,
) -> Response {
    match NoticesService::new(&state).create(&actor, &form.input()).await {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Notices, "create_notice_fail", "创建公告失败", &err);
            form_error(
                jar,
                err,
                DASHBOARD_URL,
                FORM_TEMPLATE,
                json!({ "form": form, "form_title": "Create Notice" }),
            )
        }
    }
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Response {
    if let Err(err) = actor.require_perm(perms::VIEW_NOTICE) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    match NoticesService::new(&state).get(Some(&actor), id).await {
        Ok(notice) => page(jar, "dashboard/notice_detail", json!({ "notice": notice })),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Notices, "get_notice_fail", "获取公告失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Response {
    if let Err(err) = actor.require_perm(perms::CHANGE_NOTICE) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    match NoticesService::new(&state).get(Some(&actor), id).await {
        Ok(notice) => page(
            jar,
            FORM_TEMPLATE,
            json!({
                "form": NoticeForm::from(&notice),
                "notice": notice,
                "form_title": "Edit Notice",
            }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Notices, "get_notice_fail", "获取公告失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

pub async fn update(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
    Form(form): Form<NoticeForm>,
) -> Response {
    match NoticesService::new(&state)
        .update(&actor, id, &form.input(), false)
        .await
    {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Notices, "update_notice_fail", "更新公告失败", &err);
            form_error(
                jar,
                err,
                DASHBOARD_URL,
                FORM_TEMPLATE,
                json!({ "form": form, "form_title": "Edit Notice" }),
            )
        }
    }
}

pub async fn confirm_delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Response {
    if let Err(err) = actor.require_perm(perms::DELETE_NOTICE) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    match NoticesService::new(&state).get(Some(&actor), id).await {
        Ok(notice) => page(jar, "dashboard/notice_confirm_delete", json!({ "notice": notice })),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Notices, "get_notice_fail", "获取公告失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Response {
    match NoticesService::new(&state).delete(&actor, id).await {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Notices, "delete_notice_fail", "删除公告失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}
