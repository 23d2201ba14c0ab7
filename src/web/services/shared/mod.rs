//! # 服务层共享工具
//!
//! 分页、搜索条件与表单校验辅助方法，避免在各域服务中重复实现。

pub mod forms;
pub mod pagination;
pub mod response;
pub mod search;

pub use forms::{checkbox, email_address, normalize_email, not_blank, parse_date, validate_fields};
pub use pagination::{PaginationInfo, PaginationParams, build_page};
pub use response::ServiceResponse;
pub use search::{escape_like, search_condition};

#[cfg(test)]
mod tests;
