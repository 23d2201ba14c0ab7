//! # 管理命令
//!
//! 非交互式创建超级用户，凭据取自 `SUPERUSER_EMAIL` / `SUPERUSER_PASSWORD`。

use chrono::Utc;
use entity::users;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::auth::password::hash_password;
use crate::error::{Context, PortalError, Result};
use crate::web::services::accounts::find_by_email;
use crate::web::services::shared::normalize_email;

pub const SUPERUSER_EMAIL_ENV: &str = "SUPERUSER_EMAIL";
pub const SUPERUSER_PASSWORD_ENV: &str = "SUPERUSER_PASSWORD";
pub const MSG_MISSING_ENV: &str = "Missing environment variables: SUPERUSER_EMAIL, SUPERUSER_PASSWORD";

/// 创建结果
#[derive(Debug)]
pub enum SuperuserOutcome {
    Created(users::Model),
    /// 邮箱已被占用，未做修改
    AlreadyExists(String),
}

/// 读取环境变量中的超级用户凭据，空值视为缺失
pub fn superuser_credentials(lookup: impl Fn(&str) -> Option<String>) -> Result<(String, String)> {
    let email = lookup(SUPERUSER_EMAIL_ENV).filter(|v| !v.trim().is_empty());
    let password = lookup(SUPERUSER_PASSWORD_ENV).filter(|v| !v.is_empty());
    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(PortalError::config(MSG_MISSING_ENV)),
    }
}

pub async fn create_superuser(db: &DatabaseConnection, email: &str, password: &str) -> Result<SuperuserOutcome> {
    let email = normalize_email(email);
    if find_by_email(db, &email).await?.is_some() {
        return Ok(SuperuserOutcome::AlreadyExists(email));
    }

    let user = users::ActiveModel {
        email: Set(email),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        phone: Set(String::new()),
        password_hash: Set(hash_password(password)?),
        is_staff: Set(true),
        is_active: Set(true),
        is_superuser: Set(true),
        date_joined: Set(Utc::now().naive_utc()),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("Failed to create superuser")?;

    Ok(SuperuserOutcome::Created(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_credentials_require_both_variables() {
        let err = superuser_credentials(lookup(&[(SUPERUSER_EMAIL_ENV, "admin@school.test")])).unwrap_err();
        assert!(err.to_string().contains(MSG_MISSING_ENV));

        let err = superuser_credentials(lookup(&[
            (SUPERUSER_EMAIL_ENV, " "),
            (SUPERUSER_PASSWORD_ENV, "secret-pass"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(MSG_MISSING_ENV));
    }

    #[test]
    fn test_credentials_present() {
        let (email, password) = superuser_credentials(lookup(&[
            (SUPERUSER_EMAIL_ENV, "admin@school.test"),
            (SUPERUSER_PASSWORD_ENV, "secret-pass"),
        ]))
        .unwrap();
        assert_eq!(email, "admin@school.test");
        assert_eq!(password, "secret-pass");
    }
}
