//! # 登录、注册与注销页面
//!
//! 登录成功后清理过期会话，再创建服务端会话并写入 `sessionid` Cookie。

use axum::{
    Form,
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Response,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;
use serde_json::json;

use super::{DASHBOARD_URL, form_error, log_page_error, page, page_error, redirect, redirect_success, render};
use crate::auth::{SESSION_COOKIE, SessionStore};
use crate::error::{FieldErrors, PortalError};
use crate::logging::{LogComponent, LogStage};
use crate::web::{
    extract::Caller,
    middleware::{RequestId, auth::LOGIN_URL},
    server::AppState,
    services::accounts::{AccountsService, RegisterRequest},
};
use crate::{linfo, lwarn};

const LOGIN_TEMPLATE: &str = "accounts/login";
const REGISTER_TEMPLATE: &str = "accounts/register";

pub const MSG_LOGIN_FAILED: &str =
    "Please enter a correct email and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// 登录表单
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// 仅接受站内相对路径，避免开放重定向
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => DASHBOARD_URL,
    }
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.auth.secure_cookies)
        .same_site(SameSite::Lax)
        .build()
}

pub async fn login_form(caller: Caller, jar: CookieJar, Query(query): Query<NextQuery>) -> Response {
    if caller.principal().is_some() {
        return redirect(jar, DASHBOARD_URL);
    }
    page(jar, LOGIN_TEMPLATE, json!({ "next": query.next }))
}

/// 邮箱密码登录
pub async fn login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = form.next.clone().or(query.next);

    let user = match AccountsService::new(&state)
        .authenticate(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(err) => {
            log_page_error(&request_id, LogComponent::Auth, "login_fail", "登录失败", &err);
            if matches!(err.root(), PortalError::Authentication { .. }) {
                let mut errors = FieldErrors::new();
                errors.add("__all__", MSG_LOGIN_FAILED);
                return render(
                    jar,
                    StatusCode::BAD_REQUEST,
                    LOGIN_TEMPLATE,
                    json!({ "errors": errors, "email": form.email, "next": next }),
                );
            }
            return page_error(jar, err, LOGIN_URL);
        }
    };

    let store = SessionStore::new(&state.database);
    if let Err(err) = store.purge_expired().await {
        lwarn!(
            request_id,
            LogStage::Authentication,
            LogComponent::Session,
            "sessions_purge_fail",
            "Failed to purge expired sessions",
            error = %err
        );
    }

    match store.create(user.id, state.config.auth.session_ttl).await {
        Ok(token) => {
            linfo!(
                request_id,
                LogStage::Authentication,
                LogComponent::Session,
                "login",
                "Session created",
                user_id = user.id
            );
            let jar = jar.add(session_cookie(&state, token));
            redirect(jar, safe_next(next.as_deref()))
        }
        Err(err) => {
            log_page_error(&request_id, LogComponent::Session, "session_create_fail", "创建会话失败", &err);
            page_error(jar, err, LOGIN_URL)
        }
    }
}

pub async fn register_form(jar: CookieJar) -> Response {
    page(jar, REGISTER_TEMPLATE, json!({ "form": {} }))
}

/// 网页注册，要求确认密码
pub async fn register(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    jar: CookieJar,
    Form(mut request): Form<RegisterRequest>,
) -> Response {
    request.confirm_password.get_or_insert_with(String::new);

    match AccountsService::new(&state).register(&request).await {
        Ok(user) => {
            linfo!(
                request_id,
                LogStage::Response,
                LogComponent::Auth,
                "register",
                "User registered",
                user_id = user.id
            );
            redirect_success(
                jar,
                LOGIN_URL,
                Some("Registration successful! Please log in.".to_string()),
            )
        }
        Err(err) => {
            log_page_error(&request_id, LogComponent::Auth, "register_fail", "注册失败", &err);
            form_error(
                jar,
                err,
                "/accounts/register/",
                REGISTER_TEMPLATE,
                json!({
                    "form": {
                        "email": request.email,
                        "first_name": request.first_name,
                        "last_name": request.last_name,
                        "phone": request.phone,
                    }
                }),
            )
        }
    }
}

/// 注销：删除会话记录并清除 Cookie
pub async fn logout(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    jar: CookieJar,
) -> Response {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        if let Err(err) = SessionStore::new(&state.database).destroy(&token).await {
            lwarn!(
                request_id,
                LogStage::Authentication,
                LogComponent::Session,
                "logout_fail",
                "Failed to destroy session",
                error = %err
            );
        }
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    redirect(jar, LOGIN_URL)
}
