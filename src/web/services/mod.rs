//! # 领域服务
//!
//! HTTP 处理器（API 与页面）共用的业务逻辑。服务持有数据库连接引用，
//! 权限检查在服务内完成，处理器只负责请求解析与响应转换。

pub mod accounts;
pub mod admissions;
pub mod dashboard;
pub mod notices;
pub mod roles;
pub mod shared;
pub mod users;

pub use shared::{PaginationInfo, PaginationParams, ServiceResponse};
