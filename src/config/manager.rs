//! # 配置管理器
//!
//! 加载 TOML 配置文件并应用环境变量覆盖。
//!
//! 覆盖顺序：配置文件 → `PORTAL_<SECTION>_<KEY>` 通用覆盖 → 部署约定变量
//! （`DATABASE_URL` / `DATABASE_HOST` 等、`ALLOWED_HOSTS`、`SECRET_KEY`）。

use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::database::DatabaseParts;
use super::AppConfig;
use crate::error::{PortalError, Result};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "SCHOOL_PORTAL_CONFIG_PATH";
/// 通用覆盖前缀
pub const ENV_PREFIX: &str = "PORTAL_";

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<AppConfig>,
}

impl ConfigManager {
    /// 按 `SCHOOL_PORTAL_CONFIG_PATH` 或 `config/config.{RUST_ENV}.toml` 加载配置
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();

        let config_file = if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            path
        } else {
            let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
            format!("config/config.{env}.toml")
        };

        Self::from_file(&config_file)
    }

    /// 从指定文件创建配置管理器，文件缺失时使用默认配置
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load_config_file(config_path.as_ref())?;

        let overrides = Self::build_env_overrides(env::vars());
        Self::apply_env_overrides(&mut config, &overrides)?;
        Self::apply_deployment_env(&mut config, |key| env::var(key).ok())?;

        config.validate()?;

        Ok(Self {
            config: Arc::new(config),
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            warn!("配置文件不存在，使用默认配置: {}", path.display());
            return Ok(AppConfig::default());
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            PortalError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            PortalError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
                e,
            )
        })
    }

    /// 构建环境变量覆盖映射
    ///
    /// 例如: `PORTAL_SERVER_PORT` -> `server.port`
    fn build_env_overrides(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> BTreeMap<String, String> {
        let overrides: BTreeMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|config_key| (config_key.to_lowercase().replace('_', "."), value))
            })
            .collect();

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &BTreeMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                path,
                if path.contains("password") || path.contains("key") || path.contains("secret") {
                    "***"
                } else {
                    value
                }
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => config.server.host = value.to_string(),
            ["server", "port"] => config.server.port = parse_value(value, "无效的端口号")?,
            ["server", "allowed", "hosts"] | ["server", "allowedhosts"] => {
                config.server.allowed_hosts = split_list(value);
            }
            ["server", "enable", "cors"] | ["server", "enablecors"] => {
                config.server.enable_cors = parse_value(value, "无效的布尔值")?;
            }
            ["server", "cors", "origins"] | ["server", "corsorigins"] => {
                config.server.cors_origins = split_list(value);
            }
            ["database", "url"] => config.database.url = value.to_string(),
            ["database", "max", "connections"] | ["database", "maxconnections"] => {
                config.database.max_connections = parse_value(value, "无效的最大连接数")?;
            }
            ["auth", "secret", "key"] | ["auth", "secretkey"] => {
                config.auth.secret_key = value.to_string();
            }
            ["auth", "session", "ttl"] | ["auth", "sessionttl"] => {
                config.auth.session_ttl = parse_value(value, "无效的会话有效期")?;
            }
            ["auth", "secure", "cookies"] | ["auth", "securecookies"] => {
                config.auth.secure_cookies = parse_value(value, "无效的布尔值")?;
            }
            ["auth", "default", "user", "password"] => {
                config.auth.default_user_password = value.to_string();
            }
            ["logging", "level"] => config.logging.level = value.to_string(),
            _ => {
                warn!("未知的配置路径，忽略环境变量覆盖: {}", path);
            }
        }

        Ok(())
    }

    /// 应用部署约定的环境变量
    fn apply_deployment_env(
        config: &mut AppConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            config.database.url = url;
        } else if let Some(host) = lookup("DATABASE_HOST").filter(|v| !v.is_empty()) {
            let port = lookup("DATABASE_PORT")
                .filter(|v| !v.is_empty())
                .map(|v| parse_value(&v, "无效的数据库端口"))
                .transpose()?;
            let parts = DatabaseParts {
                host,
                port,
                name: lookup("DATABASE_NAME").unwrap_or_default(),
                user: lookup("DATABASE_USER"),
                password: lookup("DATABASE_PASSWORD"),
            };
            config.database.url = parts.to_url()?;
        }

        if let Some(hosts) = lookup("ALLOWED_HOSTS").filter(|v| !v.is_empty()) {
            config.server.allowed_hosts = split_list(&hosts);
        }

        if let Some(secret) = lookup("SECRET_KEY").filter(|v| !v.is_empty()) {
            config.auth.secret_key = secret;
        }

        Ok(())
    }
}

fn parse_value<T>(value: &str, message: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .map_err(|e| PortalError::config_with_source(format!("{message}: {value}"), e))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
