//! # 角色管理页面
//!
//! 入口需要角色管理权限；角色的增删改仅限超级用户，拒绝时回到角色列表。

use axum::{
    extract::{Extension, Path, State},
    response::Response,
};
use axum_extra::extract::{CookieJar, Form};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{DASHBOARD_URL, form_error, log_page_error, page, page_error, redirect_success};
use crate::auth::Principal;
use crate::error::{PortalError, Result};
use crate::logging::LogComponent;
use crate::web::{
    extract::Authenticated,
    middleware::RequestId,
    server::AppState,
    services::{
        roles::{RoleAction, RoleInput, RolesService, group_by_content_type, require_superuser},
        users::UsersService,
    },
};

const ROLES_URL: &str = "/dashboard/roles/";
const FORM_TEMPLATE: &str = "dashboard/role_form";
const USER_ROLES_TEMPLATE: &str = "dashboard/user_roles";

pub const MSG_ACCESS_DENIED: &str = "You do not have permission to access this page.";

/// 角色表单，权限为多选
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RoleForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<i32>,
}

impl RoleForm {
    fn input(&self) -> RoleInput {
        RoleInput {
            name: Some(self.name.clone()),
            permissions: Some(self.permissions.clone()),
        }
    }
}

/// 用户角色分配表单
#[derive(Debug, Default, Deserialize)]
pub struct UserRolesForm {
    #[serde(default)]
    pub groups: Vec<i32>,
}

fn require_access(actor: &Principal) -> Result<()> {
    if actor.can_manage_roles() {
        Ok(())
    } else {
        Err(PortalError::permission_denied(MSG_ACCESS_DENIED))
    }
}

async fn index_context(state: &AppState, actor: &Principal) -> Result<Value> {
    require_access(actor)?;
    let service = RolesService::new(state);
    let roles = service.list(actor).await?;
    let permissions = service.all_permissions().await?;
    let users = UsersService::new(state).all().await?;

    Ok(json!({
        "roles": roles,
        "users": users,
        "permissions_by_content_type": group_by_content_type(&permissions),
        "is_superuser": actor.is_superuser(),
    }))
}

/// 表单上下文：按内容类型分组的权限
async fn form_context(state: &AppState, form: &RoleForm, form_title: &str) -> Result<Value> {
    let permissions = RolesService::new(state).all_permissions().await?;
    Ok(json!({
        "form": form,
        "permissions_by_content_type": group_by_content_type(&permissions),
        "form_title": form_title,
    }))
}

/// 渲染角色表单；失败时记录并转为页面错误
async fn render_form(
    state: &AppState,
    request_id: &RequestId,
    jar: CookieJar,
    form: &RoleForm,
    form_title: &str,
) -> Response {
    match form_context(state, form, form_title).await {
        Ok(context) => page(jar, FORM_TEMPLATE, context),
        Err(err) => {
            log_page_error(request_id, LogComponent::Roles, "role_form_fail", "加载角色表单失败", &err);
            page_error(jar, err, ROLES_URL)
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
) -> Response {
    match index_context(&state, &actor).await {
        Ok(context) => page(jar, "dashboard/role_management", context),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Roles, "role_index_fail", "加载角色管理失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

pub async fn create_form(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
) -> Response {
    if let Err(err) = require_superuser(&actor, &RoleAction::Create) {
        return page_error(jar, err, ROLES_URL);
    }
    render_form(&state, &request_id, jar, &RoleForm::default(), "Create Role").await
}

pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Form(form): Form<RoleForm>,
) -> Response {
    match RolesService::new(&state).create(&actor, &form.input()).await {
        Ok(role) => redirect_success(
            jar,
            ROLES_URL,
            Some(format!("Role \"{}\" created successfully!", role.name)),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Roles, "create_role_fail", "创建角色失败", &err);
            invalid_form(&state, jar, err, &form, "Create Role").await
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
    if let Err(err) = require_superuser(&actor, &RoleAction::Edit) {
        return page_error(jar, err, ROLES_URL);
    }
    match RolesService::new(&state).get(&actor, id).await {
        Ok(role) => {
            let form = RoleForm {
                name: role.name,
                permissions: role.permissions,
            };
            render_form(&state, &request_id, jar, &form, "Edit Role").await
        }
        Err(err) => {
            log_page_error(&request_id, LogComponent::Roles, "get_role_fail", "获取角色失败", &err);
            page_error(jar, err, ROLES_URL)
        }
    }
}

pub async fn update(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
    Form(form): Form<RoleForm>,
) -> Response {
    match RolesService::new(&state)
        .update(&actor, id, &form.input(), false)
        .await
    {
        Ok(role) => redirect_success(
            jar,
            ROLES_URL,
            Some(format!("Role \"{}\" updated successfully!", role.name)),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Roles, "update_role_fail", "更新角色失败", &err);
            invalid_form(&state, jar, err, &form, "Edit Role").await
        }
    }
}

/// 校验失败时带上权限选项重新渲染表单
async fn invalid_form(state: &AppState, jar: CookieJar, err: PortalError, form: &RoleForm, form_title: &str) -> Response {
    if err.field_errors().is_none() {
        return page_error(jar, err, ROLES_URL);
    }
    match form_context(state, form, form_title).await {
        Ok(context) => form_error(jar, err, ROLES_URL, FORM_TEMPLATE, context),
        Err(context_err) => page_error(jar, context_err, ROLES_URL),
    }
}

pub async fn confirm_delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Response {
    if let Err(err) = require_superuser(&actor, &RoleAction::Delete) {
        return page_error(jar, err, ROLES_URL);
    }
    match RolesService::new(&state).get(&actor, id).await {
        Ok(role) => page(jar, "dashboard/role_confirm_delete", json!({ "role": role })),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Roles, "get_role_fail", "获取角色失败", &err);
            page_error(jar, err, ROLES_URL)
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
    match RolesService::new(&state).delete(&actor, id).await {
        Ok(name) => redirect_success(
            jar,
            ROLES_URL,
            Some(format!("Role \"{name}\" deleted successfully!")),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Roles, "delete_role_fail", "删除角色失败", &err);
            page_error(jar, err, ROLES_URL)
        }
    }
}

async fn user_roles_context(state: &AppState, actor: &Principal, id: i32) -> Result<Value> {
    let user = UsersService::new(state).assignable(actor, id).await?;
    let roles = RolesService::new(state).options().await?;
    Ok(json!({ "user": user, "roles": roles }))
}

pub async fn user_roles_form(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Response {
    match user_roles_context(&state, &actor, id).await {
        Ok(context) => page(jar, USER_ROLES_TEMPLATE, context),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Roles, "user_roles_fail", "加载用户角色失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}

/// 整体替换用户角色，任一未知角色返回 404
pub async fn update_user_roles(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
    Path(id): Path<i32>,
    Form(form): Form<UserRolesForm>,
) -> Response {
    match UsersService::new(&state)
        .set_groups(&actor, id, &form.groups, true)
        .await
    {
        Ok(result) => redirect_success(jar, ROLES_URL, result.message),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Roles, "update_user_roles_fail", "更新用户角色失败", &err);
            page_error(jar, err, DASHBOARD_URL)
        }
    }
}
