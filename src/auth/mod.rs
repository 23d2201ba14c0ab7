//! # 认证授权模块
//!
//! 密码规则、浏览器会话、JWT 与基于角色的权限判断。请求级别的调用方信息
//! 通过 [`AuthContext`] 注入到请求扩展中。

pub mod jwt;
pub mod password;
pub mod permissions;
pub mod session;

use std::sync::Arc;

pub use jwt::{JwtClaims, JwtManager, TokenKind, TokenPair};
pub use permissions::{Capabilities, Principal};
pub use session::{SESSION_COOKIE, SessionStore};

use crate::error::{PortalError, Result};

/// 请求的调用方：匿名或已登录用户
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    principal: Option<Arc<Principal>>,
}

impl AuthContext {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { principal: None }
    }

    #[must_use]
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(Arc::new(principal)),
        }
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_deref()
    }

    #[must_use]
    pub fn shared_principal(&self) -> Option<Arc<Principal>> {
        self.principal.clone()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// 需要登录，匿名时返回 401
    pub fn require(&self) -> Result<&Principal> {
        self.principal()
            .ok_or_else(|| PortalError::authentication("Authentication credentials were not provided."))
    }

    /// 匿名调用方没有任何权限
    #[must_use]
    pub fn has_perm(&self, perm: &str) -> bool {
        self.principal().is_some_and(|p| p.has_perm(perm))
    }
}

/// 提取 `Authorization: Bearer <token>` 中的令牌
#[must_use]
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = AuthContext::anonymous();
        assert!(!ctx.is_authenticated());
        assert!(!ctx.has_perm(permissions::VIEW_NOTICE));
        assert!(ctx.require().is_err());
    }
}
