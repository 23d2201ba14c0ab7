//! # 请求提取器

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use std::ops::Deref;
use std::sync::Arc;

use crate::auth::{AuthContext, Principal, permissions::PERMISSION_DENIED_MESSAGE};
use crate::error::{FieldErrors, PortalError};

const NON_FIELD_ERRORS: &str = "non_field_errors";
const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// 已登录的调用方，匿名请求以 401 拒绝
#[derive(Debug, Clone)]
pub struct Authenticated(pub Arc<Principal>);

impl Deref for Authenticated {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = PortalError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<Arc<AuthContext>>()
            .cloned()
            .unwrap_or_default();
        context
            .shared_principal()
            .map(Self)
            .ok_or_else(|| PortalError::authentication("Authentication credentials were not provided."))
    }
}

/// 调用方身份（可能为匿名）
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Arc<AuthContext>);

impl Caller {
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.0.principal()
    }

    /// 写操作入口：匿名调用方按权限不足（403）处理
    pub fn require_principal(&self) -> Result<&Principal, PortalError> {
        self.principal()
            .ok_or_else(|| PortalError::permission_denied(PERMISSION_DENIED_MESSAGE))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<Arc<AuthContext>>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// JSON 请求体；解析失败时返回带字段错误的 400 信封
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = PortalError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection_error(&rejection)),
        }
    }
}

fn json_rejection_error(rejection: &JsonRejection) -> PortalError {
    let mut fields = FieldErrors::new();
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let (field, message) = describe_data_error(&err.body_text());
            fields.add(field, message);
        }
        JsonRejection::JsonSyntaxError(err) => {
            let text = err.body_text();
            let detail = text
                .strip_prefix("Failed to parse the request body as JSON: ")
                .unwrap_or(&text);
            fields.add(NON_FIELD_ERRORS, format!("JSON parse error - {}", strip_position(detail)));
        }
        JsonRejection::MissingJsonContentType(_) => {
            fields.add(NON_FIELD_ERRORS, "Request body must be JSON (Content-Type: application/json).");
        }
        other => {
            fields.add(NON_FIELD_ERRORS, other.body_text());
        }
    }
    PortalError::validation_fields(fields)
}

/// 从 serde 错误文本中拆出字段名与消息
///
/// 文本形如 `groups[0]: invalid type: ...` 或 ``missing field `title` at line 1 column 2``。
fn describe_data_error(text: &str) -> (String, String) {
    let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);

    if let Some(rest) = detail.strip_prefix("missing field `") {
        if let Some((field, _)) = rest.split_once('`') {
            return (field.to_string(), "This field is required.".to_string());
        }
    }

    if let Some((path, message)) = detail.split_once(": ") {
        if !path.is_empty() && !path.contains(char::is_whitespace) {
            let field = path
                .split(['.', '['])
                .next()
                .filter(|head| !head.is_empty())
                .unwrap_or(NON_FIELD_ERRORS);
            return (field.to_string(), strip_position(message).to_string());
        }
    }

    (NON_FIELD_ERRORS.to_string(), strip_position(detail).to_string())
}

fn strip_position(message: &str) -> &str {
    message
        .rsplit_once(" at line ")
        .map_or(message, |(head, _)| head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn data_error_is_keyed_by_top_level_field() {
        let (field, message) = describe_data_error(
            "Failed to deserialize the JSON body into the target type: is_active: invalid type: string \"maybe\", expected a boolean at line 1 column 50",
        );
        assert_eq!(field, "is_active");
        assert_eq!(message, "invalid type: string \"maybe\", expected a boolean");

        let (field, _) = describe_data_error(
            "Failed to deserialize the JSON body into the target type: groups[0]: invalid type: string \"x\", expected i32 at line 1 column 15",
        );
        assert_eq!(field, "groups");
    }

    #[test]
    fn missing_field_reports_required() {
        let (field, message) = describe_data_error(
            "Failed to deserialize the JSON body into the target type: missing field `groups` at line 1 column 2",
        );
        assert_eq!(field, "groups");
        assert_eq!(message, "This field is required.");
    }

    #[test]
    fn unkeyed_error_falls_back_to_non_field_errors() {
        let (field, message) = describe_data_error("invalid type: sequence, expected struct at line 1 column 0");
        assert_eq!(field, NON_FIELD_ERRORS);
        assert_eq!(message, "invalid type: sequence, expected struct");
    }

    #[test]
    fn anonymous_caller_is_denied() {
        let caller = Caller::default();
        let err = caller.require_principal().unwrap_err();
        assert!(matches!(err, PortalError::PermissionDenied { .. }));
        assert_eq!(err.to_string(), PERMISSION_DENIED_MESSAGE);
    }
}
