//! # Host 访问控制中间件
//!
//! 仅放行 `Host` 头在 `server.allowed_hosts` 中的请求。

use axum::{
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::web::response;

/// Host 白名单
#[derive(Debug, Clone)]
pub struct HostFilterConfig {
    allowed_hosts: Vec<String>,
}

impl HostFilterConfig {
    #[must_use]
    pub fn new(allowed_hosts: &[String]) -> Self {
        Self {
            allowed_hosts: allowed_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// `*` 放行全部；以 `.` 开头的规则匹配该域名及其子域名
    #[must_use]
    pub fn is_allowed(&self, host: &str) -> bool {
        let host = strip_port(host).trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }

        self.allowed_hosts.iter().any(|pattern| {
            if pattern == "*" {
                return true;
            }
            if let Some(domain) = pattern.strip_prefix('.') {
                return host == domain || host.ends_with(pattern.as_str());
            }
            host == *pattern
        })
    }
}

/// 去掉端口，兼容 IPv6 字面量 `[::1]:8000`
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or_default();
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Host 访问控制中间件
pub async fn host_filter_middleware(request: Request, next: Next) -> Response {
    let config = request.extensions().get::<HostFilterConfig>().cloned();

    if let Some(config) = config {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| request.uri().host())
            .unwrap_or_default()
            .to_string();

        if !config.is_allowed(&host) {
            warn!("Rejected request with disallowed Host header: {}", host);
            return response::error(
                StatusCode::BAD_REQUEST,
                "DISALLOWED_HOST",
                &format!("Invalid HTTP_HOST header: '{host}'."),
            );
        }
        debug!("Host allowed: {}", host);
    }

    next.run(request).await
}
