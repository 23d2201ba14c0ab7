//! # School Portal Library
//!
//! 学校门户核心库：公开公告与入学申请、基于角色权限的员工仪表盘、REST API。

pub mod auth;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{PortalError, Result};
