//! # 系统处理器

/// 健康检查
pub async fn ping_handler() -> &'static str {
    "pong"
}
