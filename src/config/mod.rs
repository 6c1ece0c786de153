use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("default locale {0:?} is not in SUPPORTED_LOCALES")]
    UnsupportedDefaultLocale(String),
    #[error("SUPPORTED_LOCALES must name at least one locale")]
    NoLocales,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub redis_url: Option<String>,
    pub turnstile_secret_key: Option<String>,
    pub turnstile_verify_url: String,
    pub lead_webhook_url: Option<String>,
    pub lead_webhook_token: Option<String>,
    pub http_timeout_secs: u64,
    pub content_dir: PathBuf,
    pub messages_dir: PathBuf,
    pub default_locale: String,
    pub supported_locales: Vec<String>,
    pub message_cache_capacity: usize,
    pub message_cache_ttl_secs: u64,
    pub message_cache_snapshot: Option<PathBuf>,
    pub cors_allow_any: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            api_base_uri: "/api".into(),
            rate_limit_window_secs: 60,
            rate_limit_requests: 5,
            redis_url: None,
            turnstile_secret_key: None,
            turnstile_verify_url: DEFAULT_TURNSTILE_VERIFY_URL.into(),
            lead_webhook_url: None,
            lead_webhook_token: None,
            http_timeout_secs: 10,
            content_dir: PathBuf::from("content"),
            messages_dir: PathBuf::from("messages"),
            default_locale: "en".into(),
            supported_locales: vec!["en".into()],
            message_cache_capacity: 16,
            message_cache_ttl_secs: 3600,
            message_cache_snapshot: None,
            cors_allow_any: cfg!(debug_assertions),
        }
    }
}

// 变量来源：进程环境变量，测试中可替换
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    // 空字符串视为未设置
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parsed<T: std::str::FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(name) {
            Some(value) => value
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { name, value }),
            None => Ok(default),
        }
    }

    fn flag(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(name) {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue { name, value }),
            },
            None => Ok(default),
        }
    }
}

fn normalize_locale(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('_', "-")
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// 从任意变量来源加载并校验配置
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let defaults = Config::default();

        // 窗口支持 "60" 或 "60s" 两种写法
        let rate_limit_window_secs = match vars.optional("RATE_LIMIT_WINDOW") {
            Some(value) => value.trim_end_matches('s').parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue {
                    name: "RATE_LIMIT_WINDOW",
                    value: value.clone(),
                }
            })?,
            None => defaults.rate_limit_window_secs,
        };

        let supported_locales = match vars.optional("SUPPORTED_LOCALES") {
            Some(value) => value
                .split(',')
                .map(normalize_locale)
                .filter(|l| !l.is_empty())
                .collect(),
            None => defaults.supported_locales.clone(),
        };

        let config = Config {
            server_host: vars.optional("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: vars.parsed("SERVER_PORT", defaults.server_port)?,
            api_base_uri: vars.optional("API_BASE_URI").unwrap_or(defaults.api_base_uri),
            rate_limit_window_secs,
            rate_limit_requests: vars.parsed("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            redis_url: vars.optional("REDIS_URL"),
            turnstile_secret_key: vars.optional("TURNSTILE_SECRET_KEY"),
            turnstile_verify_url: vars
                .optional("TURNSTILE_VERIFY_URL")
                .unwrap_or(defaults.turnstile_verify_url),
            lead_webhook_url: vars.optional("LEAD_WEBHOOK_URL"),
            lead_webhook_token: vars.optional("LEAD_WEBHOOK_TOKEN"),
            http_timeout_secs: vars.parsed("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            content_dir: vars
                .optional("CONTENT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.content_dir),
            messages_dir: vars
                .optional("MESSAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.messages_dir),
            default_locale: vars
                .optional("DEFAULT_LOCALE")
                .map(|l| normalize_locale(&l))
                .unwrap_or(defaults.default_locale),
            supported_locales,
            message_cache_capacity: vars
                .parsed("MESSAGE_CACHE_CAPACITY", defaults.message_cache_capacity)?,
            message_cache_ttl_secs: vars
                .parsed("MESSAGE_CACHE_TTL", defaults.message_cache_ttl_secs)?,
            message_cache_snapshot: vars.optional("MESSAGE_CACHE_SNAPSHOT").map(PathBuf::from),
            cors_allow_any: vars.flag("CORS_ALLOW_ANY", defaults.cors_allow_any)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supported_locales.is_empty() {
            return Err(ConfigError::NoLocales);
        }
        if !self.supported_locales.contains(&self.default_locale) {
            return Err(ConfigError::UnsupportedDefaultLocale(
                self.default_locale.clone(),
            ));
        }
        if !self.api_base_uri.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                name: "API_BASE_URI",
                value: self.api_base_uri.clone(),
            });
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RATE_LIMIT_WINDOW",
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn message_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.message_cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
