//! # Web 层
//!
//! axum 路由、中间件、请求处理器与业务服务。

pub mod extract;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod services;

pub use server::{AppState, build_router, serve};
