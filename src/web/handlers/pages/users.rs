//! # 仪表盘用户管理页面

use axum::{
    Form,
    extract::{Extension, Path, Query, State},
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
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
        roles::RolesService,
        shared::checkbox,
        users::{ManagedUser, UserFilter, UserInput, UsersService},
    },
};

const LIST_URL: &str = "/dashboard/users/";
const FORM_TEMPLATE: &str = "dashboard/user_form";

#[derive(Debug, Default, Deserialize)]
pub struct UserPageQuery {
    pub page: Option<u64>,
    pub search: Option<String>,
    pub role: Option<String>,
}

/// 用户表单；密码仅在创建时填写，留空使用初始密码
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    pub is_staff: Option<String>,
    pub is_active: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl UserForm {
    fn create_input(&self) -> UserInput {
        UserInput {
            email: Some(self.email.clone()),
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            phone: Some(self.phone.clone()),
            is_staff: Some(checkbox(self.is_staff.as_deref())),
            is_active: None,
            password: Some(self.password.clone()).filter(|p| !p.is_empty()),
        }
    }

    fn update_input(&self) -> UserInput {
        UserInput {
            is_active: Some(checkbox(self.is_active.as_deref())),
            password: None,
            ..self.create_input()
        }
    }
}

impl From<&ManagedUser> for UserForm {
    fn from(user: &ManagedUser) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            is_staff: user.is_staff.then(|| "on".to_string()),
            is_active: user.is_active.then(|| "on".to_string()),
            password: String::new(),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Query(query): Query<UserPageQuery>,
) -> Response {
    let params = PaginationParams::fixed(query.page, state.config.pagination.dashboard_page_size);
    let filter = UserFilter {
        search: query.search.clone(),
        role: query.role.clone(),
    };

    let result = match UsersService::new(&state).list(&actor, &filter, params).await {
        Ok(listing) => RolesService::new(&state).options().await.map(|roles| (listing, roles)),
        Err(err) => Err(err),
    };

    match result {
        Ok(((users, pagination), roles)) => page(
            jar,
            "dashboard/user_list",
            json!({
                "users": users,
                "roles": roles,
                "pagination": PageNav::from(pagination),
                "search": query.search.unwrap_or_default(),
                "role": query.role.unwrap_or_default(),
            }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Users, "list_users_fail", "获取用户列表失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

pub async fn create_form(actor: Authenticated, jar: CookieJar) -> Response {
    if let Err(err) = actor.require_perm(perms::ADD_USER) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    page(
        jar,
        FORM_TEMPLATE,
        json!({ "form": UserForm::default(), "form_title": "Create User" }),
    )
}

pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Form(form): Form<UserForm>,
) -> Response {
    match UsersService::new(&state).create(&actor, &form.create_input()).await {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Users, "create_user_fail", "创建用户失败", &err);
            form_error(
                jar,
                err,
                DASHBOARD_URL,
                FORM_TEMPLATE,
                json!({ "form": form, "form_title": "Create User" }),
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
    match UsersService::new(&state).get(&actor, id).await {
        Ok(user) => page(jar, "dashboard/user_detail", json!({ "user": user })),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Users, "get_user_fail", "获取用户失败", &err);
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
    if let Err(err) = actor.require_perm(perms::CHANGE_USER) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    match UsersService::new(&state).get(&actor, id).await {
        Ok(user) => page(
            jar,
            FORM_TEMPLATE,
            json!({
                "form": UserForm::from(&user),
                "user": user,
                "form_title": "Edit User",
            }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Users, "get_user_fail", "获取用户失败", &err);
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
    Form(form): Form<UserForm>,
) -> Response {
    match UsersService::new(&state)
        .update(&actor, id, &form.update_input(), false)
        .await
    {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Users, "update_user_fail", "更新用户失败", &err);
            form_error(
                jar,
                err,
                DASHBOARD_URL,
                FORM_TEMPLATE,
                json!({ "form": form, "form_title": "Edit User" }),
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
    if let Err(err) = actor.require_perm(perms::DELETE_USER) {
        return page_error(jar, err, DASHBOARD_URL);
    }
    match UsersService::new(&state).get(&actor, id).await {
        Ok(user) => page(jar, "dashboard/user_confirm_delete", json!({ "user": user })),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Users, "get_user_fail", "获取用户失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

/// 删除用户；自删与删除超级用户被拒绝时回到用户列表
pub async fn delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Response {
    match UsersService::new(&state).delete(&actor, id).await {
        Ok(result) => redirect_success(jar, LIST_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Users, "delete_user_fail", "删除用户失败", &err);
            page_error(jar, err, LIST_URL)
        }
    }
}
