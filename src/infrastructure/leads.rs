use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LeadError {
    #[error("lead webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("lead webhook returned {0}")]
    Status(reqwest::StatusCode),
}

/// 一条联系表单线索
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub locale: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub source: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Forwarded,
    /// 未配置 webhook，仅写日志
    Logged,
}

#[derive(Clone)]
pub struct LeadForwarder {
    client: reqwest::Client,
    webhook_url: Option<String>,
    token: Option<String>,
}

impl LeadForwarder {
    pub fn new(client: reqwest::Client, webhook_url: Option<String>, token: Option<String>) -> Self {
        Self {
            client,
            webhook_url,
            token,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        if config.lead_webhook_url.is_none() {
            tracing::warn!("LEAD_WEBHOOK_URL not set, leads will only be logged");
        }
        Self::new(
            client,
            config.lead_webhook_url.clone(),
            config.lead_webhook_token.clone(),
        )
    }

    pub async fn forward(&self, lead: &Lead) -> Result<Delivery, LeadError> {
        let Some(url) = &self.webhook_url else {
            tracing::info!(
                lead_id = %lead.id,
                email = %lead.email,
                locale = %lead.locale,
                "Lead received (no webhook configured)"
            );
            return Ok(Delivery::Logged);
        };

        let mut request = self.client.post(url).json(lead);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(LeadError::Status(response.status()));
        }

        tracing::info!(lead_id = %lead.id, "Lead forwarded");
        Ok(Delivery::Forwarded)
    }
}
