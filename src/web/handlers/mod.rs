//! # HTTP 处理器
//!
//! `api` 返回统一 JSON 信封，`pages` 处理表单提交与重定向。

pub mod api;
pub mod pages;
pub mod system;

use crate::error::PortalError;
use crate::logging::LogStage;

/// 按错误类型确定日志阶段
pub(crate) fn error_stage(err: &PortalError) -> LogStage {
    match err.root() {
        PortalError::Validation { .. } => LogStage::Validation,
        PortalError::Authentication { .. } => LogStage::Authentication,
        PortalError::PermissionDenied { .. } => LogStage::Authorization,
        PortalError::Database { .. } => LogStage::Db,
        _ => LogStage::Internal,
    }
}
