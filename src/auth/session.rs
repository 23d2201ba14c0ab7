//! # 浏览器会话
//!
//! 登录时生成 32 字节随机令牌写入 `sessionid` Cookie，数据库只保存其 SHA-256 摘要。

use chrono::{Duration, Utc};
use entity::{user_sessions, users};
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};

use crate::error::{Context, Result};

/// 会话 Cookie 名称
pub const SESSION_COOKIE: &str = "sessionid";

/// 计算令牌摘要
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 会话存储
pub struct SessionStore<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SessionStore<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// 创建会话，返回明文令牌
    pub async fn create(&self, user_id: i32, ttl_seconds: i64) -> Result<String> {
        let token = generate_token();
        let now = Utc::now().naive_utc();

        user_sessions::ActiveModel {
            user_id: Set(user_id),
            token_hash: Set(hash_token(&token)),
            expires_at: Set(now + Duration::seconds(ttl_seconds)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .context("Failed to create session")?;

        Ok(token)
    }

    /// 解析令牌对应的用户，过期会话视为不存在
    pub async fn resolve(&self, token: &str) -> Result<Option<users::Model>> {
        let now = Utc::now().naive_utc();
        let found = user_sessions::Entity::find()
            .filter(user_sessions::Column::TokenHash.eq(hash_token(token)))
            .filter(user_sessions::Column::ExpiresAt.gt(now))
            .find_also_related(users::Entity)
            .one(self.db)
            .await
            .context("Failed to resolve session")?;

        Ok(found.and_then(|(_, user)| user))
    }

    /// 删除会话（登出）
    pub async fn destroy(&self, token: &str) -> Result<()> {
        user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::TokenHash.eq(hash_token(token)))
            .exec(self.db)
            .await
            .context("Failed to destroy session")?;
        Ok(())
    }

    /// 清理过期会话，返回删除条数
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::ExpiresAt.lte(Utc::now().naive_utc()))
            .exec(self.db)
            .await
            .context("Failed to purge expired sessions")?;
        Ok(result.rows_affected)
    }
}
