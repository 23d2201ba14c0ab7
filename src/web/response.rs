//! # API 响应结构
//!
//! 定义了标准的 JSON API 响应格式，包括成功、失败和分页响应。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FieldErrors, PortalError};
use crate::web::services::ServiceResponse;

/// # 分页信息
#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

/// # 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # 分页成功响应
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # 标准错误信息
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    /// 字段级校验错误
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// # 标准错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
    pub timestamp: DateTime<Utc>,
}

/// # API响应枚举
///
/// 统一所有API出口，方便转换为 `axum::response::Response`
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    SuccessWithMessage(T, String),
    SuccessWithoutData(String),
    Created(T, Option<String>),
    Paginated(Vec<T>, Pagination),
    Error(StatusCode, String, String),
    AppError(PortalError),
}

fn success_body<T: Serialize>(status: StatusCode, data: Option<T>, message: Option<String>) -> Response {
    (
        status,
        Json(SuccessResponse {
            success: true,
            data,
            message,
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Success(data) => success_body(StatusCode::OK, Some(data), None),
            Self::SuccessWithMessage(data, message) => {
                success_body(StatusCode::OK, Some(data), Some(message))
            }
            Self::SuccessWithoutData(message) => {
                success_body::<()>(StatusCode::OK, None, Some(message))
            }
            Self::Created(data, message) => success_body(StatusCode::CREATED, Some(data), message),
            Self::Paginated(data, pagination) => (
                StatusCode::OK,
                Json(PaginatedResponse {
                    success: true,
                    data,
                    pagination,
                    message: None,
                    timestamp: Utc::now(),
                }),
            )
                .into_response(),
            Self::Error(status, code, message) => {
                let error_response = ErrorResponse {
                    success: false,
                    error: ErrorInfo {
                        code,
                        message,
                        fields: None,
                    },
                    timestamp: Utc::now(),
                };
                (status, Json(error_response)).into_response()
            }
            Self::AppError(error) => {
                let (status, code) = error.to_http_response_parts();
                let error_response = ErrorResponse {
                    success: false,
                    error: ErrorInfo {
                        code: code.to_string(),
                        message: error.client_message(),
                        fields: error.field_errors().cloned(),
                    },
                    timestamp: Utc::now(),
                };
                (status, Json(error_response)).into_response()
            }
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::AppError(self).into_response()
    }
}

/// # 便捷函数：成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::Success(data).into_response()
}

/// # 便捷函数：带消息的成功响应
pub fn success_with_message<T: Serialize>(data: T, message: &str) -> Response {
    ApiResponse::SuccessWithMessage(data, message.to_string()).into_response()
}

/// # 便捷函数：无数据体的成功响应
pub fn success_without_data(message: &str) -> Response {
    ApiResponse::<()>::SuccessWithoutData(message.to_string()).into_response()
}

/// # 便捷函数：201 创建成功
pub fn created<T: Serialize>(data: T, message: Option<String>) -> Response {
    ApiResponse::Created(data, message).into_response()
}

/// # 便捷函数：分页响应
pub fn paginated<T: Serialize>(data: Vec<T>, pagination: Pagination) -> Response {
    ApiResponse::Paginated(data, pagination).into_response()
}

/// # 便捷函数：服务结果，有消息时一并返回
pub fn from_service<T: Serialize>(result: ServiceResponse<T>) -> Response {
    match result.message {
        Some(message) => ApiResponse::SuccessWithMessage(result.data, message).into_response(),
        None => ApiResponse::Success(result.data).into_response(),
    }
}

/// # 便捷函数：HTTP错误响应
pub fn error(status: StatusCode, code: &str, message: &str) -> Response {
    ApiResponse::<()>::Error(status, code.to_string(), message.to_string()).into_response()
}

/// # 便捷函数：应用错误响应
pub fn app_error(error: PortalError) -> Response {
    ApiResponse::<()>::AppError(error).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_created_uses_201() {
        let response = created(serde_json::json!({"id": 1}), Some("ok".to_string()));
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["message"], "ok");
    }

    #[tokio::test]
    async fn test_validation_error_carries_fields() {
        let response = app_error(PortalError::validation("title", "This field is required."));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"]["title"][0], "This field is required.");
    }

    #[tokio::test]
    async fn test_permission_error_maps_to_403() {
        let response = app_error(PortalError::permission_denied("nope"));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "nope");
        assert!(body["error"].get("fields").is_none());
    }

    #[tokio::test]
    async fn test_paginated_shape() {
        let response = paginated(
            vec![1, 2],
            Pagination {
                page: 1,
                limit: 2,
                total: 5,
                pages: 3,
            },
        );
        let body = body_json(response).await;
        assert_eq!(body["pagination"]["pages"], 3);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }
}
