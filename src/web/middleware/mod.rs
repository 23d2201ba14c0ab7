//! # 中间件模块

pub mod auth;
pub mod host_filter;
pub mod request_id;

pub use auth::{require_api_auth, require_login, resolve_principal};
pub use host_filter::{HostFilterConfig, host_filter_middleware};
pub use request_id::{RequestId, request_id_middleware};
