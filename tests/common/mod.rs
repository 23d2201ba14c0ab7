//! 集成测试公共设施：内存 SQLite、完整路由与测试数据构造

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, header},
};
use chrono::Utc;
use entity::{content_types, group_permissions, groups, notices, permissions, user_groups, users};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter, Set,
};
use serde_json::Value;
use tower::ServiceExt;

use school_portal::auth::SessionStore;
use school_portal::config::AppConfig;
use school_portal::web::{AppState, build_router, flash::FlashMessage};

pub const HOST: &str = "testserver";
pub const PASSWORD: &str = "s3cure-Passw0rd";

/// 完整应用（含中间件栈）
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.expect("connect sqlite");
        Migrator::up(&db, None).await.expect("run migrations");

        let state = AppState::new(db, Arc::new(AppConfig::default()));
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// 创建用户；`perms` 非空时建立同名角色并授予这些权限
    pub async fn user(&self, email: &str, perms: &[&str]) -> users::Model {
        let user = self.insert_user(email, false).await;
        if !perms.is_empty() {
            let group = self.group(&format!("{email} role"), perms).await;
            self.assign(&user, &group).await;
        }
        user
    }

    pub async fn superuser(&self, email: &str) -> users::Model {
        self.insert_user(email, true).await
    }

    async fn insert_user(&self, email: &str, superuser: bool) -> users::Model {
        users::ActiveModel {
            email: Set(email.to_string()),
            first_name: Set("Test".to_string()),
            last_name: Set("User".to_string()),
            phone: Set(String::new()),
            password_hash: Set(bcrypt::hash(PASSWORD, 4).expect("hash password")),
            is_staff: Set(superuser),
            is_active: Set(true),
            is_superuser: Set(superuser),
            date_joined: Set(Utc::now().naive_utc()),
            last_login: Set(None),
            ..Default::default()
        }
        .insert(self.state.database.as_ref())
        .await
        .expect("insert user")
    }

    /// 创建角色并授予 `app_label.codename` 形式的权限
    pub async fn group(&self, name: &str, perms: &[&str]) -> groups::Model {
        let db = self.state.database.as_ref();
        let group = groups::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert group");

        for perm in perms {
            let id = self.permission_id(perm).await;
            group_permissions::ActiveModel {
                group_id: Set(group.id),
                permission_id: Set(id),
            }
            .insert(db)
            .await
            .expect("grant permission");
        }
        group
    }

    pub async fn permission_id(&self, perm: &str) -> i32 {
        let (app_label, codename) = perm.split_once('.').expect("app_label.codename");
        let db = self.state.database.as_ref();
        let content_type_ids: Vec<i32> = content_types::Entity::find()
            .filter(content_types::Column::AppLabel.eq(app_label))
            .all(db)
            .await
            .expect("load content types")
            .into_iter()
            .map(|ct| ct.id)
            .collect();
        permissions::Entity::find()
            .filter(permissions::Column::Codename.eq(codename))
            .filter(permissions::Column::ContentTypeId.is_in(content_type_ids))
            .one(db)
            .await
            .expect("load permission")
            .unwrap_or_else(|| panic!("unknown permission {perm}"))
            .id
    }

    pub async fn assign(&self, user: &users::Model, group: &groups::Model) {
        user_groups::ActiveModel {
            user_id: Set(user.id),
            group_id: Set(group.id),
        }
        .insert(self.state.database.as_ref())
        .await
        .expect("assign group");
    }

    pub async fn group_ids_of(&self, user: &users::Model) -> Vec<i32> {
        let mut ids: Vec<i32> = user_groups::Entity::find()
            .filter(user_groups::Column::UserId.eq(user.id))
            .all(self.state.database.as_ref())
            .await
            .expect("load user groups")
            .into_iter()
            .map(|row| row.group_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub async fn notice(&self, title: &str, content: &str, is_active: bool) -> notices::Model {
        let now = Utc::now().naive_utc();
        notices::ActiveModel {
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.state.database.as_ref())
        .await
        .expect("insert notice")
    }

    /// Bearer 访问令牌
    pub fn token(&self, user: &users::Model) -> String {
        self.state
            .jwt
            .generate_access_token(user.id, &user.email)
            .expect("issue token")
    }

    /// `sessionid=<token>` Cookie 头
    pub async fn session_cookie(&self, user: &users::Model) -> String {
        let token = SessionStore::new(self.state.database.as_ref())
            .create(user.id, 3600)
            .await
            .expect("create session");
        format!("sessionid={token}")
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, HOST)
        .body(Body::empty())
        .expect("request")
}

pub fn api(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, HOST);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub fn page(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, HOST)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request")
}

/// 表单提交；`cookie` 为空时匿名
pub fn form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// 解析响应写入的一次性消息
pub fn flash_messages(response: &Response<Body>) -> Vec<FlashMessage> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix("messages="))
        .filter_map(|v| v.split(';').next())
        .filter_map(decode_messages)
        .flatten()
        .collect()
}

/// Cookie 值可能被额外做过一次百分号编码
fn decode_messages(value: &str) -> Option<Vec<FlashMessage>> {
    let mut raw = value.to_string();
    for _ in 0..3 {
        if let Ok(messages) = serde_json::from_str::<Vec<FlashMessage>>(&raw) {
            return Some(messages);
        }
        raw = urlencoding::decode(&raw).ok()?.into_owned();
    }
    None
}

/// 响应写入的会话 Cookie（`sessionid=<token>`）
pub fn session_from(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("sessionid=") && !v.starts_with("sessionid=;"))
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string)
}
