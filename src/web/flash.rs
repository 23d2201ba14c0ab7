//! # 一次性提示消息
//!
//! 重定向前写入 `messages` Cookie，下一次页面渲染时读取并清除。

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "messages";

/// 消息级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

fn decode(jar: &CookieJar) -> Vec<FlashMessage> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| urlencoding::decode(cookie.value()).ok())
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

/// 追加一条消息
#[must_use]
pub fn push(jar: CookieJar, level: Level, text: impl Into<String>) -> CookieJar {
    let mut messages = decode(&jar);
    messages.push(FlashMessage {
        level,
        text: text.into(),
    });

    let Ok(raw) = serde_json::to_string(&messages) else {
        return jar;
    };
    let cookie = Cookie::build((FLASH_COOKIE, urlencoding::encode(&raw).into_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

#[must_use]
pub fn success(jar: CookieJar, text: impl Into<String>) -> CookieJar {
    push(jar, Level::Success, text)
}

#[must_use]
pub fn error(jar: CookieJar, text: impl Into<String>) -> CookieJar {
    push(jar, Level::Error, text)
}

/// 取出全部消息并清除 Cookie
#[must_use]
pub fn drain(jar: CookieJar) -> (CookieJar, Vec<FlashMessage>) {
    let messages = decode(&jar);
    if messages.is_empty() && jar.get(FLASH_COOKIE).is_none() {
        return (jar, messages);
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
}
