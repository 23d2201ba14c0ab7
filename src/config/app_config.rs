//! # 应用配置结构定义

use serde::{Deserialize, Serialize};

use super::DatabaseConfig;
use crate::ensure_config;
use crate::error::Result;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务器配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 认证与会话配置
    pub auth: AuthConfig,
    /// 分页配置
    pub pagination: PaginationConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// HTTP 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 允许的 Host 头；`*` 放行全部，`.example.com` 匹配子域名
    pub allowed_hosts: Vec<String>,
    /// 是否启用CORS
    pub enable_cors: bool,
    /// 允许的CORS源地址
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "testserver".to_string(),
            ],
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 签名密钥
    pub secret_key: String,
    /// JWT issuer
    pub jwt_issuer: String,
    /// 访问令牌有效期（秒）
    pub access_token_ttl: i64,
    /// 刷新令牌有效期（秒）
    pub refresh_token_ttl: i64,
    /// 浏览器会话有效期（秒）
    pub session_ttl: i64,
    /// 会话 Cookie 是否仅限 HTTPS
    pub secure_cookies: bool,
    /// 仪表盘创建用户且未填写密码时使用的初始密码
    pub default_user_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "dev-insecure-secret-key-change-me".to_string(),
            jwt_issuer: "school-portal".to_string(),
            access_token_ttl: 300,
            refresh_token_ttl: 86_400,
            session_ttl: 1_209_600,
            secure_cookies: false,
            default_user_password: "defaultpassword123".to_string(),
        }
    }
}

/// 分页配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// 公开公告页每页条数
    pub public_page_size: u64,
    /// 仪表盘列表每页条数
    pub dashboard_page_size: u64,
    /// API 默认每页条数
    pub api_default_limit: u64,
    /// API 每页上限
    pub api_max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            public_page_size: 10,
            dashboard_page_size: 20,
            api_default_limit: 20,
            api_max_limit: 100,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        ensure_config!(self.server.port > 0, "无效的服务器端口: {}", self.server.port);
        ensure_config!(
            !self.server.allowed_hosts.is_empty(),
            "server.allowed_hosts 不能为空"
        );
        ensure_config!(!self.database.url.is_empty(), "数据库URL不能为空");
        ensure_config!(
            self.database.max_connections > 0,
            "数据库最大连接数必须大于0"
        );
        ensure_config!(
            self.auth.secret_key.len() >= 16,
            "auth.secret_key 长度至少 16 个字符"
        );
        ensure_config!(
            self.auth.access_token_ttl > 0
                && self.auth.refresh_token_ttl > 0
                && self.auth.session_ttl > 0,
            "令牌与会话有效期必须大于0"
        );
        ensure_config!(
            self.pagination.public_page_size > 0
                && self.pagination.dashboard_page_size > 0
                && self.pagination.api_default_limit > 0
                && self.pagination.api_max_limit >= self.pagination.api_default_limit,
            "分页配置无效"
        );
        Ok(())
    }

    /// 监听地址
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
