//! # 错误处理测试

use crate::error::{Context, ErrorCategory, FieldErrors, PortalError};
use axum::http::StatusCode;
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = PortalError::config("测试配置错误");
    assert!(matches!(err, PortalError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 测试配置错误");
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = PortalError::config_with_source("配置文件加载失败", io_err);

    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    assert!(err.source().is_some());
}

#[test]
fn test_context_trait_keeps_status_of_root_error() {
    let result: Result<(), PortalError> = Err(PortalError::not_found("notice", 42));
    let err = result.context("加载公告失败").unwrap_err();

    assert!(matches!(err, PortalError::Context { .. }));
    assert_eq!(err.to_http_response_parts().0, StatusCode::NOT_FOUND);
    assert_eq!(err.client_message(), "Not found: notice 42");
}

#[test]
fn test_server_error_message_keeps_context() {
    let result: Result<(), PortalError> = Err(PortalError::database("连接断开"));
    let err = result.context("Failed to fetch notices").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Server);
    assert!(err.client_message().starts_with("Failed to fetch notices"));
}

#[test]
fn test_auto_conversion_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err: PortalError = io_err.into();

    assert!(matches!(err, PortalError::Io { .. }));
    assert!(err.to_string().contains("IO错误: 文件操作失败"));
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
    let err: PortalError = toml_err.into();

    assert!(matches!(err, PortalError::Config { .. }));
    assert!(err.to_string().contains("配置错误: TOML解析失败"));
}

#[test]
fn test_permission_denied_maps_to_forbidden() {
    let err = PortalError::permission_denied("You do not have permission to perform this action.");
    assert_eq!(
        err.to_http_response_parts(),
        (StatusCode::FORBIDDEN, "PERMISSION_DENIED")
    );
    assert_eq!(
        err.to_string(),
        "You do not have permission to perform this action."
    );
    assert_eq!(err.category(), ErrorCategory::Client);
}

#[test]
fn test_validation_fields_collects_all_messages() {
    let mut fields = FieldErrors::new();
    fields.add("password", "Password must be at least 8 characters long.");
    fields.add("password", "Password cannot be entirely numeric.");
    fields.add("confirm_password", "Passwords do not match.");

    let err = PortalError::validation_fields(fields);
    let collected = err.field_errors().unwrap();
    assert_eq!(collected.get("password").unwrap().len(), 2);
    assert!(collected.contains("confirm_password"));
    assert_eq!(err.to_http_response_parts().0, StatusCode::BAD_REQUEST);
}

#[test]
fn test_empty_field_errors_is_ok() {
    assert!(FieldErrors::new().into_result().is_ok());

    let mut fields = FieldErrors::new();
    fields.add("name", "Role name is required.");
    let err = fields.into_result().unwrap_err();
    assert_eq!(err.to_string(), "Role name is required.");
}

#[test]
fn test_macros_build_expected_variants() {
    let err = crate::validation_error!("email", "Enter a valid email address.");
    assert_eq!(
        err.field_errors().unwrap().get("email").unwrap()[0],
        "Enter a valid email address."
    );

    let err = crate::validation_error!("name", "Ensure this field has no more than {} characters.", 150);
    assert_eq!(err.to_string(), "Ensure this field has no more than 150 characters.");
}
