//! JWT token management
//!
//! Issues and validates the access/refresh token pair used by the REST API.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::{PortalError, Result};

const AUDIENCE: &str = "school-portal-users";

/// Token purpose, carried in the claims so a refresh token can never be
/// presented as an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT 载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// 用户ID
    pub sub: String,
    /// 登录邮箱
    pub email: String,
    pub token_type: TokenKind,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
    /// JWT ID
    pub jti: String,
}

impl JwtClaims {
    fn new(user_id: i32, email: &str, kind: TokenKind, ttl: i64, issuer: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            token_type: kind,
            iat: now,
            exp: now + ttl,
            iss: issuer.to_string(),
            aud: AUDIENCE.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// 获取用户ID
    pub fn user_id(&self) -> Result<i32> {
        self.sub
            .parse()
            .map_err(|e| PortalError::authentication_with_source("Token contained no recognizable user identification", e))
    }
}

/// Token pair returned by `/api/auth/jwt/create/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: Arc<AuthConfig>,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.jwt_issuer)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Create new JWT manager
    #[must_use]
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_audience(&[AUDIENCE]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 30;

        Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    fn issue(&self, user_id: i32, email: &str, kind: TokenKind) -> Result<String> {
        let ttl = match kind {
            TokenKind::Access => self.config.access_token_ttl,
            TokenKind::Refresh => self.config.refresh_token_ttl,
        };
        let claims = JwtClaims::new(user_id, email, kind, ttl, &self.config.jwt_issuer);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PortalError::internal_with_source("Token generation failed", e))
    }

    /// Generate access token
    pub fn generate_access_token(&self, user_id: i32, email: &str) -> Result<String> {
        self.issue(user_id, email, TokenKind::Access)
    }

    /// Generate access + refresh tokens
    pub fn generate_token_pair(&self, user_id: i32, email: &str) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user_id, email, TokenKind::Access)?,
            refresh: self.issue(user_id, email, TokenKind::Refresh)?,
        })
    }

    /// Validate a token and require the given purpose
    pub fn validate_token(&self, token: &str, expected: TokenKind) -> Result<JwtClaims> {
        let claims = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    PortalError::authentication_with_source("Token is invalid or expired", e)
                }
                _ => PortalError::from(e),
            })?
            .claims;

        if claims.token_type != expected {
            return Err(PortalError::authentication("Token has wrong type"));
        }

        Ok(claims)
    }

    /// Exchange a refresh token for a fresh access token
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<String> {
        let claims = self.validate_token(refresh_token, TokenKind::Refresh)?;
        self.generate_access_token(claims.user_id()?, &claims.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_manager() -> JwtManager {
        let config = Arc::new(AuthConfig {
            secret_key: "test-secret-key-for-jwt-testing".to_string(),
            ..AuthConfig::default()
        });
        JwtManager::new(config)
    }

    #[test]
    fn test_token_generation_and_validation() {
        let manager = create_test_manager();
        let token = manager
            .generate_access_token(1, "staff@school.test")
            .unwrap();

        let claims = manager.validate_token(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), 1);
        assert_eq!(claims.email, "staff@school.test");
    }

    #[test]
    fn test_refresh_token_flow() {
        let manager = create_test_manager();
        let pair = manager.generate_token_pair(5, "a@school.test").unwrap();

        let access = manager.refresh_access_token(&pair.refresh).unwrap();
        let claims = manager.validate_token(&access, TokenKind::Access).unwrap();
        assert_eq!(claims.user_id().unwrap(), 5);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let manager = create_test_manager();
        let pair = manager.generate_token_pair(5, "a@school.test").unwrap();

        assert!(manager.validate_token(&pair.refresh, TokenKind::Access).is_err());
        assert!(manager.refresh_access_token(&pair.access).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let manager = create_test_manager();
        let other = JwtManager::new(Arc::new(AuthConfig {
            secret_key: "another-secret-key-value-123".to_string(),
            ..AuthConfig::default()
        }));
        let token = other.generate_access_token(1, "x@school.test").unwrap();
        assert!(manager.validate_token(&token, TokenKind::Access).is_err());
    }
}
