//! # 密码规则与哈希
//!
//! 注册、仪表盘建号与超级管理员命令共用同一套密码规则。

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::error::{FieldErrors, Result};

pub const MIN_PASSWORD_LENGTH: usize = 8;

const COMMON_PASSWORDS: [&str; 3] = ["password", "12345678", "qwerty"];

pub const MSG_TOO_SHORT: &str = "Password must be at least 8 characters long.";
pub const MSG_NUMERIC: &str = "Password cannot be entirely numeric.";
pub const MSG_COMMON: &str = "Password is too common.";
pub const MSG_MISMATCH: &str = "Passwords do not match.";

/// 返回密码违反的全部规则
#[must_use]
pub fn password_violations(password: &str) -> Vec<&'static str> {
    let mut violations = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(MSG_TOO_SHORT);
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        violations.push(MSG_NUMERIC);
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        violations.push(MSG_COMMON);
    }
    violations
}

/// 校验密码规则，并可选地校验两次输入是否一致
///
/// 规则错误记在 `password_field`，不一致错误记在 `confirm_field`。
#[must_use]
pub fn check_password(
    password: &str,
    confirm: Option<&str>,
    password_field: &str,
    confirm_field: &str,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for message in password_violations(password) {
        errors.add(password_field, message);
    }
    if let Some(confirm) = confirm {
        if confirm != password {
            errors.add(confirm_field, MSG_MISMATCH);
        }
    }
    errors
}

/// bcrypt 哈希
pub fn hash_password(password: &str) -> Result<String> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// 校验明文与哈希是否匹配；哈希格式异常视为不匹配
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}
