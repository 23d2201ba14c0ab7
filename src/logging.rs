//! # 日志配置模块
//!
//! 基于 `tracing` 的结构化日志。所有业务日志统一通过 `linfo!` / `ldebug!` /
//! `lwarn!` / `lerror!` 输出，固定携带 `request_id`、`stage`、`component`
//! 与 `operation` 四个字段，便于按请求聚合检索。

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::PortalError;

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    Db,
    Authentication,
    Authorization,
    RequestStart,
    Validation,
    Internal,
    Response,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Db => "db",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::RequestStart => "request_start",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Response => "response",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    Config,
    Database,
    ServerSetup,
    Auth,
    Session,
    Notices,
    Admissions,
    Users,
    Roles,
    Dashboard,
    Public,
    Command,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::Database => "database",
            Self::ServerSetup => "server_setup",
            Self::Auth => "auth",
            Self::Session => "session",
            Self::Notices => "notices",
            Self::Admissions => "admissions",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Dashboard => "dashboard",
            Self::Public => "public",
            Self::Command => "command",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 记录管理端处理器错误：客户端错误记为 warn，服务端错误记为 error
pub fn log_management_error(
    request_id: &str,
    stage: LogStage,
    component: LogComponent,
    operation: &str,
    message: &str,
    err: &PortalError,
) {
    let (status, code) = err.to_http_response_parts();
    if status.is_server_error() {
        crate::lerror!(
            request_id,
            stage,
            component,
            operation,
            message,
            status = status.as_u16(),
            code = code,
            error = %err
        );
    } else {
        crate::lwarn!(
            request_id,
            stage,
            component,
            operation,
            message,
            status = status.as_u16(),
            code = code,
            error = %err
        );
    }
}

/// 默认过滤规则：关闭 SQLx 的逐条查询日志
#[must_use]
pub fn default_filter(level: &str) -> String {
    format!("{level},school_portal=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn,tower_http=info")
}

/// 初始化日志系统
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let initialized = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if initialized.is_ok() {
        crate::ldebug!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "logging_ready",
            "Logging initialised",
            level = level
        );
    }
}
