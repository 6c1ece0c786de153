use std::sync::Arc;

use config::Config;
use content::ContentStore;
use i18n::{LocaleSettings, MessageStore};
use infrastructure::{LeadForwarder, TurnstileVerifier};

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod extractors;
pub mod i18n;
pub mod infrastructure;
pub mod middleware;
pub mod result;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub content: Arc<ContentStore>,
    pub messages: Arc<MessageStore>,
    pub turnstile: TurnstileVerifier,
    pub leads: LeadForwarder,
}

impl AppState {
    /// 按配置加载内容与翻译资源并创建外部服务客户端
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        let http = infrastructure::http_client(&config)?;
        let settings = LocaleSettings::new(&config.default_locale, &config.supported_locales);

        let messages = MessageStore::from_config(&config);
        match messages.restore() {
            Ok(0) => {}
            Ok(n) => tracing::debug!(entries = n, "Message cache warmed from snapshot"),
            Err(e) => tracing::warn!(error = %e, "Failed to restore message cache snapshot"),
        }

        Ok(AppState {
            content: Arc::new(ContentStore::load(&config.content_dir, settings)),
            messages: Arc::new(messages),
            turnstile: TurnstileVerifier::from_config(http.clone(), &config),
            leads: LeadForwarder::from_config(http, &config),
            config,
        })
    }

    pub fn locales(&self) -> &LocaleSettings {
        self.messages.settings()
    }
}
