//! # 认证中间件
//!
//! 解析调用方身份并注入 `Arc<AuthContext>`：先尝试 `Authorization: Bearer`，
//! 再尝试 `sessionid` Cookie。任何失败都降级为匿名。

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use sea_orm::EntityTrait;
use std::sync::Arc;

use crate::auth::{
    AuthContext, SESSION_COOKIE, SessionStore, TokenKind, extract_bearer_token,
    permissions::load_principal,
};
use crate::error::{Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::web::middleware::RequestId;
use crate::web::response;
use crate::web::server::AppState;
use crate::{ldebug, lwarn};

pub const LOGIN_URL: &str = "/accounts/login/";

/// 解析调用方身份
pub async fn resolve_principal(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .map(ToString::to_string);
    let session = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let context = match authenticate(&state, bearer.as_deref(), session.as_deref()).await {
        Ok(context) => context,
        Err(err) => {
            lwarn!(
                request_id,
                LogStage::Authentication,
                LogComponent::Auth,
                "resolve_principal_fail",
                "Failed to resolve caller, treating as anonymous",
                error = %err
            );
            AuthContext::anonymous()
        }
    };

    if let Some(principal) = context.principal() {
        ldebug!(
            request_id,
            LogStage::Authentication,
            LogComponent::Auth,
            "principal_resolved",
            "Caller authenticated",
            user_id = principal.user_id()
        );
    }

    request.extensions_mut().insert(Arc::new(context));
    next.run(request).await
}

async fn authenticate(
    state: &AppState,
    bearer: Option<&str>,
    session: Option<&str>,
) -> Result<AuthContext> {
    let db = state.database.as_ref();

    if let Some(token) = bearer {
        // 无效令牌按匿名处理
        if let Ok(claims) = state.jwt.validate_token(token, TokenKind::Access) {
            let user_id = claims.user_id()?;
            if let Some(user) = entity::users::Entity::find_by_id(user_id)
                .one(db)
                .await
                .context("Failed to load token user")?
            {
                if let Some(principal) = load_principal(db, user).await? {
                    return Ok(AuthContext::authenticated(principal));
                }
            }
        }
    }

    if let Some(token) = session {
        if let Some(user) = SessionStore::new(db).resolve(token).await? {
            if let Some(principal) = load_principal(db, user).await? {
                return Ok(AuthContext::authenticated(principal));
            }
        }
    }

    Ok(AuthContext::anonymous())
}

/// API 受保护路由：匿名调用返回 401
pub async fn require_api_auth(request: Request, next: Next) -> Response {
    let context = request
        .extensions()
        .get::<Arc<AuthContext>>()
        .cloned()
        .unwrap_or_default();

    if let Err(err) = context.require() {
        return response::app_error(err);
    }
    next.run(request).await
}

/// 仪表盘页面：匿名访问重定向到登录页
pub async fn require_login(request: Request, next: Next) -> Response {
    let authenticated = request
        .extensions()
        .get::<Arc<AuthContext>>()
        .is_some_and(|ctx| ctx.is_authenticated());

    if !authenticated {
        let target = request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_string(), ToString::to_string);
        return Redirect::to(&login_redirect(&target)).into_response();
    }
    next.run(request).await
}

/// `/accounts/login/?next=<path>`
#[must_use]
pub fn login_redirect(next: &str) -> String {
    format!("{LOGIN_URL}?next={}", urlencoding::encode(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_target() {
        assert_eq!(
            login_redirect("/dashboard/notices/?page=2"),
            "/accounts/login/?next=%2Fdashboard%2Fnotices%2F%3Fpage%3D2"
        );
    }
}
