// 外部服务集成：人机验证与线索转发

pub mod leads;
pub mod turnstile;

pub use leads::{Delivery, Lead, LeadError, LeadForwarder};
pub use turnstile::{TurnstileError, TurnstileVerifier, Verification};

use crate::config::Config;

/// 共享的 HTTP 客户端
pub fn http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.http_timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}
