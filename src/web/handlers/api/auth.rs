//! # 认证 API
//!
//! JWT 签发与刷新、注册、当前用户信息。

use axum::{
    extract::{Extension, State},
    response::Response,
};
use serde::{Deserialize, Serialize};

use super::api_error;
use crate::auth::{TokenKind, TokenPair};
use crate::error::{PortalError, Result};
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::web::{
    extract::{Authenticated, Json},
    middleware::RequestId,
    response,
    server::AppState,
    services::accounts::{AccountsService, LoginRequest, RegisterRequest},
};

/// 刷新请求
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// 登录并签发令牌对
pub async fn create_token(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match issue(&state, &request).await {
        Ok(pair) => {
            linfo!(
                request_id,
                LogStage::Authentication,
                LogComponent::Auth,
                "jwt_issued",
                "Issued token pair"
            );
            response::success(pair)
        }
        Err(err) => api_error(&request_id, LogComponent::Auth, "jwt_create_fail", "签发令牌失败", err),
    }
}

async fn issue(state: &AppState, request: &LoginRequest) -> Result<TokenPair> {
    let user = AccountsService::new(state)
        .authenticate(&request.email, &request.password)
        .await?;
    state.jwt.generate_token_pair(user.id, &user.email)
}

/// 用刷新令牌换取新的访问令牌
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RefreshRequest>,
) -> Response {
    match refresh(&state, &request.refresh).await {
        Ok(access) => response::success(AccessToken { access }),
        Err(err) => api_error(&request_id, LogComponent::Auth, "jwt_refresh_fail", "刷新令牌失败", err),
    }
}

async fn refresh(state: &AppState, token: &str) -> Result<String> {
    let claims = state.jwt.validate_token(token, TokenKind::Refresh)?;
    let user = AccountsService::new(state)
        .active_user(claims.user_id()?)
        .await?
        .ok_or_else(|| PortalError::authentication("User not found"))?;
    state.jwt.generate_access_token(user.id, &user.email)
}

/// 注册
pub async fn register(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    let service = AccountsService::new(&state);
    let result = match service.register(&request).await {
        Ok(user) => service.me(&user).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(user) => {
            linfo!(
                request_id,
                LogStage::Response,
                LogComponent::Auth,
                "register",
                "User registered",
                user_id = user.id
            );
            response::created(user, None)
        }
        Err(err) => api_error(&request_id, LogComponent::Auth, "register_fail", "注册失败", err),
    }
}

/// 当前用户
pub async fn me(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
) -> Response {
    match AccountsService::new(&state).me(&actor.user).await {
        Ok(user) => response::success(user),
        Err(err) => api_error(&request_id, LogComponent::Auth, "me_fail", "获取当前用户失败", err),
    }
}
