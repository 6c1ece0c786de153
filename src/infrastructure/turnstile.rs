use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum TurnstileError {
    #[error("verification request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("verification endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// siteverify 接口响应
#[derive(Debug, Clone, Deserialize)]
pub struct SiteVerifyResponse {
    pub success: bool,
    #[serde(rename = "error-codes", default)]
    pub error_codes: Vec<String>,
    pub challenge_ts: Option<String>,
    pub hostname: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Passed,
    /// 未配置密钥，跳过验证
    Skipped,
    Failed(Vec<String>),
}

impl Verification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verification::Passed | Verification::Skipped)
    }
}

#[derive(Clone)]
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: Option<String>,
    verify_url: String,
}

impl TurnstileVerifier {
    pub fn new(client: reqwest::Client, secret: Option<String>, verify_url: impl Into<String>) -> Self {
        Self {
            client,
            secret,
            verify_url: verify_url.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        if config.turnstile_secret_key.is_none() {
            tracing::warn!("TURNSTILE_SECRET_KEY not set, bot verification is disabled");
        }
        Self::new(
            client,
            config.turnstile_secret_key.clone(),
            config.turnstile_verify_url.clone(),
        )
    }

    /// 校验客户端提交的令牌
    pub async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
    ) -> Result<Verification, TurnstileError> {
        let Some(secret) = &self.secret else {
            return Ok(Verification::Skipped);
        };

        let token = token.trim();
        if token.is_empty() {
            return Ok(Verification::Failed(vec!["missing-input-response".into()]));
        }

        let mut form = vec![("secret", secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip.filter(|ip| *ip != "unknown") {
            form.push(("remoteip", ip));
        }

        let response = self.client.post(&self.verify_url).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(TurnstileError::Status(response.status()));
        }

        let body: SiteVerifyResponse = response.json().await?;
        if body.success {
            tracing::debug!(hostname = ?body.hostname, action = ?body.action, "Turnstile token verified");
            Ok(Verification::Passed)
        } else {
            tracing::info!(codes = ?body.error_codes, "Turnstile token rejected");
            Ok(Verification::Failed(body.error_codes))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{Form, Json, Router, routing::post};
    use std::collections::HashMap;

    /// 本地模拟 siteverify：令牌为 "pass" 时通过
    pub(crate) async fn mock_siteverify() -> String {
        let app = Router::new().route(
            "/siteverify",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let ok = form.get("response").map(String::as_str) == Some("pass")
                    && form.get("secret").map(String::as_str) == Some("test-secret");
                if ok {
                    Json(serde_json::json!({ "success": true, "hostname": "localhost" }))
                } else {
                    Json(serde_json::json!({
                        "success": false,
                        "error-codes": ["invalid-input-response"]
                    }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/siteverify", addr)
    }

    fn verifier(url: String) -> TurnstileVerifier {
        TurnstileVerifier::new(reqwest::Client::new(), Some("test-secret".into()), url)
    }

    #[tokio::test]
    async fn valid_token_passes() {
        let v = verifier(mock_siteverify().await);
        assert_eq!(v.verify("pass", Some("1.2.3.4")).await.unwrap(), Verification::Passed);
    }

    #[tokio::test]
    async fn invalid_token_reports_error_codes() {
        let v = verifier(mock_siteverify().await);
        assert_eq!(
            v.verify("nope", None).await.unwrap(),
            Verification::Failed(vec!["invalid-input-response".into()])
        );
    }

    #[tokio::test]
    async fn empty_token_fails_without_network() {
        let v = verifier("http://127.0.0.1:9/unreachable".into());
        let result = v.verify("  ", None).await.unwrap();
        assert!(!result.is_accepted());
    }

    #[tokio::test]
    async fn missing_secret_skips_verification() {
        let v = TurnstileVerifier::new(reqwest::Client::new(), None, "http://127.0.0.1:9");
        assert_eq!(v.verify("anything", None).await.unwrap(), Verification::Skipped);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let v = verifier("http://127.0.0.1:9/unreachable".into());
        assert!(matches!(
            v.verify("pass", None).await,
            Err(TurnstileError::Transport(_))
        ));
    }
}
