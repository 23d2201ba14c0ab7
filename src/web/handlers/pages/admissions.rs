//! # 仪表盘入学申请管理页面

use axum::{
    Form,
    extract::{Extension, Path, Query, State},
    response::Response,
};
use axum_extra::extract::CookieJar;
use entity::admission_applications;
use serde::Deserialize;
use serde_json::json;

use super::{DASHBOARD_URL, PageNav, form_error, log_page_error, page, page_error, redirect_success};
use crate::auth::permissions as perms;
use crate::logging::LogComponent;
use crate::web::{
    extract::Authenticated,
    middleware::RequestId,
    server::AppState,
    services::{
        PaginationParams,
        admissions::{AdmissionFilter, AdmissionInput, AdmissionsService, gender_choices},
    },
};

const LIST_URL: &str = "/dashboard/admissions/";
const FORM_TEMPLATE: &str = "dashboard/admission_form";

#[derive(Debug, Default, Deserialize)]
pub struct AdmissionPageQuery {
    pub page: Option<u64>,
    pub search: Option<String>,
    pub grade: Option<String>,
}

fn form_from(application: &admission_applications::Model) -> AdmissionInput {
    AdmissionInput {
        first_name: Some(application.first_name.clone()),
        last_name: Some(application.last_name.clone()),
        email: Some(application.email.clone()),
        phone: Some(application.phone.clone()),
        date_of_birth: Some(application.date_of_birth.format("%Y-%m-%d").to_string()),
        gender: Some(application.gender.code().to_string()),
        address: Some(application.address.clone()),
        previous_school: Some(application.previous_school.clone()),
        grade_applying_for: Some(application.grade_applying_for.clone()),
        parent_name: Some(application.parent_name.clone()),
        parent_phone: Some(application.parent_phone.clone()),
        parent_email: Some(application.parent_email.clone()),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Query(query): Query<AdmissionPageQuery>,
) -> Response {
    let params = PaginationParams::fixed(query.page, state.config.pagination.dashboard_page_size);
    let filter = AdmissionFilter {
        search: query.search.clone(),
        grade: query.grade.clone(),
    };

    match AdmissionsService::new(&state).list(&actor, &filter, params).await {
        Ok((applications, pagination)) => page(
            jar,
            "dashboard/admission_list",
            json!({
                "applications": applications,
                "pagination": PageNav::from(pagination),
                "search": query.search.unwrap_or_default(),
                "grade": query.grade.unwrap_or_default(),
            }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Admissions, "list_admissions_fail", "获取申请列表失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

pub async fn create_form(actor: Authenticated, jar: CookieJar) -> Response {
    if let Err(err) = actor.require_perm(perms::ADD_ADMISSION) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    page(
        jar,
        FORM_TEMPLATE,
        json!({
            "form": AdmissionInput::default(),
            "gender_choices": gender_choices(),
            "form_title": "Create Admission Application",
        }),
    )
}

pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Form(form): Form<AdmissionInput>,
) -> Response {
    match AdmissionsService::new(&state).create(&actor, &form).await {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Admissions, "create_admission_fail", "录入申请失败", &err);
            form_error(
                jar,
                err,
                DASHBOARD_URL,
                FORM_TEMPLATE,
                json!({
                    "form": form,
                    "gender_choices": gender_choices(),
                    "form_title": "Create Admission Application",
                }),
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
    match AdmissionsService::new(&state).get(&actor, id).await {
        Ok(application) => page(jar, "dashboard/admission_detail", json!({ "application": application })),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Admissions, "get_admission_fail", "获取申请失败", &err);
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
    if let Err(err) = actor.require_perm(perms::CHANGE_ADMISSION) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    match AdmissionsService::new(&state).get(&actor, id).await {
        Ok(application) => page(
            jar,
            FORM_TEMPLATE,
            json!({
                "form": form_from(&application),
                "application": application,
                "gender_choices": gender_choices(),
                "form_title": "Edit Admission Application",
            }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Admissions, "get_admission_fail", "获取申请失败", &err);
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
    Form(form): Form<AdmissionInput>,
) -> Response {
    match AdmissionsService::new(&state).update(&actor, id, &form, false).await {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Admissions, "update_admission_fail", "更新申请失败", &err);
            form_error(
                jar,
                err,
                DASHBOARD_URL,
                FORM_TEMPLATE,
                json!({
                    "form": form,
                    "gender_choices": gender_choices(),
                    "form_title": "Edit Admission Application",
                }),
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
    if let Err(err) = actor.require_perm(perms::DELETE_ADMISSION) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    match AdmissionsService::new(&state).get(&actor, id).await {
        Ok(application) => page(
            jar,
            "dashboard/admission_confirm_delete",
            json!({ "application": application }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Admissions, "get_admission_fail", "获取申请失败", &err);
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
    match AdmissionsService::new(&state).delete(&actor, id).await {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Admissions, "delete_admission_fail", "删除申请失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}
