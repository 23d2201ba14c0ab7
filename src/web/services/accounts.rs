//! # 账户服务
//!
//! 注册、邮箱密码认证与当前用户信息。

use chrono::Utc;
use entity::{groups, users, users::Entity as Users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{check_password, hash_password, verify_password};
use crate::error::{Context, PortalError, Result};
use crate::web::server::AppState;

use super::shared::forms::{email_address, normalize_email, not_blank};
use super::shared::validate_fields;

pub const MSG_EMAIL_TAKEN: &str = "A user with that email already exists.";
const MSG_INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// 注册请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    /// 网页表单必填；API 注册可省略
    pub confirm_password: Option<String>,
}

#[derive(Debug, Validate)]
struct RegisterFields {
    #[validate(custom(function = "not_blank"))]
    #[validate(custom(function = "email_address"))]
    #[validate(length(max = 254, message = "Ensure this field has no more than 254 characters."))]
    email: String,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    first_name: String,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    last_name: String,
    #[validate(length(max = 15, message = "Ensure this field has no more than 15 characters."))]
    phone: String,
}

/// 登录请求
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// 用户公开信息
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub groups: Vec<String>,
    pub is_staff: bool,
}

impl UserResponse {
    #[must_use]
    pub fn new(user: users::Model, groups: Vec<String>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            groups,
            is_staff: user.is_staff,
        }
    }
}

/// 按邮箱查找用户
pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<users::Model>> {
    Users::find()
        .filter(users::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
        .context("Failed to look up user by email")
}

/// 账户服务
pub struct AccountsService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AccountsService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
        }
    }

    /// 注册新用户，收集全部字段错误
    pub async fn register(&self, request: &RegisterRequest) -> Result<users::Model> {
        let fields = RegisterFields {
            email: normalize_email(&request.email),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            phone: request.phone.trim().to_string(),
        };
        let mut errors = validate_fields(&fields);
        errors.merge(check_password(
            &request.password,
            request.confirm_password.as_deref(),
            "password",
            "confirm_password",
        ));

        let txn = self.db.begin().await.context("Failed to begin transaction")?;

        if !errors.contains("email") && find_by_email(&txn, &fields.email).await?.is_some() {
            errors.add("email", MSG_EMAIL_TAKEN);
        }
        errors.into_result()?;

        let user = users::ActiveModel {
            email: Set(fields.email),
            first_name: Set(fields.first_name),
            last_name: Set(fields.last_name),
            phone: Set(fields.phone),
            password_hash: Set(hash_password(&request.password)?),
            is_staff: Set(false),
            is_active: Set(true),
            is_superuser: Set(false),
            date_joined: Set(Utc::now().naive_utc()),
            last_login: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to create user")?;

        txn.commit().await.context("Failed to commit registration")?;
        Ok(user)
    }

    /// 邮箱密码认证，成功时更新最后登录时间
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<users::Model> {
        let user = find_by_email(self.db, email)
            .await?
            .filter(|user| user.is_active && verify_password(password, &user.password_hash))
            .ok_or_else(|| PortalError::authentication(MSG_INVALID_CREDENTIALS))?;

        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(Utc::now().naive_utc()));
        active
            .update(self.db)
            .await
            .context("Failed to record last login")
    }

    /// 按 ID 加载启用中的用户
    pub async fn active_user(&self, user_id: i32) -> Result<Option<users::Model>> {
        Ok(Users::find_by_id(user_id)
            .one(self.db)
            .await
            .context("Failed to fetch user")?
            .filter(|user| user.is_active))
    }

    /// 当前用户信息
    pub async fn me(&self, user: &users::Model) -> Result<UserResponse> {
        let groups = user
            .find_related(groups::Entity)
            .order_by_asc(groups::Column::Name)
            .all(self.db)
            .await
            .context("Failed to fetch user groups")?
            .into_iter()
            .map(|g| g.name)
            .collect();
        Ok(UserResponse::new(user.clone(), groups))
    }
}
