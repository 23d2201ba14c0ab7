//! 表单字段校验辅助
//!
//! 结构体通过 `validator` 派生校验，这里提供共用的自定义校验函数与提示文案。

use std::borrow::Cow;

use chrono::NaiveDate;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::error::FieldErrors;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";
pub const MSG_INVALID_DATE: &str = "Enter a valid date.";

/// 必填字段不能为空白
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed(MSG_REQUIRED)));
    }
    Ok(())
}

/// 邮箱格式；空值交给 `not_blank` 处理
pub fn email_address(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        return Ok(());
    }
    Err(ValidationError::new("email").with_message(Cow::Borrowed(MSG_INVALID_EMAIL)))
}

/// 运行派生校验并收集字段错误
pub fn validate_fields<T: Validate>(value: &T) -> FieldErrors {
    value.validate().map_or_else(FieldErrors::from, |()| FieldErrors::new())
}

/// 解析 `YYYY-MM-DD` 日期，失败时记录字段错误
pub fn parse_date(errors: &mut FieldErrors, field: &str, value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, MSG_REQUIRED);
        return None;
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, MSG_INVALID_DATE);
            None
        }
    }
}

/// 表单复选框：存在即为真（`on` / `true` / `1`）
#[must_use]
pub fn checkbox(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

/// 规范化邮箱：去除首尾空白并将域名部分转为小写
#[must_use]
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}
