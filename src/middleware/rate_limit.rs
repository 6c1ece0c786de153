use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    cache::{RateLimitCacheOperations, RateLimitDecision, RateLimitEntry},
    config::Config,
    error::AppError,
    utils::{client_ip, now_millis},
};

#[derive(Clone)]
enum Backend {
    Memory(Arc<Mutex<HashMap<String, RateLimitEntry>>>),
    Redis(Arc<redis::Client>),
}

/// 按客户端 IP 的固定窗口限流器
#[derive(Clone)]
pub struct RateLimiter {
    backend: Backend,
    window: Duration,
    limit: u32,
}

impl RateLimiter {
    pub fn in_memory(window: Duration, limit: u32) -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(HashMap::new()))),
            window,
            limit,
        }
    }

    pub fn with_redis(redis: Arc<redis::Client>, window: Duration, limit: u32) -> Self {
        Self {
            backend: Backend::Redis(redis),
            window,
            limit,
        }
    }

    /// 配置了 Redis 时使用 Redis 计数，否则使用进程内计数
    pub fn from_config(config: &Config, redis: Option<Arc<redis::Client>>) -> Self {
        let window = config.rate_limit_window();
        match redis {
            Some(client) => Self::with_redis(client, window, config.rate_limit_requests),
            None => Self::in_memory(window, config.rate_limit_requests),
        }
    }

    pub async fn check(&self, key: &str) -> RateLimitDecision {
        match &self.backend {
            Backend::Memory(_) => self.check_at(key, now_millis()),
            Backend::Redis(redis) => {
                match RateLimitCacheOperations::register(redis, key, self.window, self.limit).await
                {
                    Ok(decision) => decision,
                    Err(e) => {
                        // Redis 不可用时放行，避免表单整体不可用
                        tracing::warn!(error = %e, "Rate limit store unavailable, allowing request");
                        RateLimitDecision::from_count(0, self.limit, self.window)
                    }
                }
            }
        }
    }

    /// 进程内计数；Redis 后端下总是放行
    pub fn check_at(&self, key: &str, now: i64) -> RateLimitDecision {
        match &self.backend {
            Backend::Memory(store) => {
                let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
                store
                    .entry(key.to_string())
                    .or_insert_with(|| RateLimitEntry::new(now))
                    .register(now, self.window, self.limit)
            }
            Backend::Redis(_) => RateLimitDecision::from_count(0, self.limit, self.window),
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(now_millis())
    }

    /// 清除已过期的窗口，返回清除数量
    pub fn purge_expired_at(&self, now: i64) -> usize {
        match &self.backend {
            Backend::Memory(store) => {
                let mut store = store.lock().unwrap_or_else(|e| e.into_inner());
                let before = store.len();
                store.retain(|_, entry| !entry.is_expired(now, self.window));
                before - store.len()
            }
            // Redis 依赖键过期
            Backend::Redis(_) => 0,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        match &self.backend {
            Backend::Memory(store) => store.lock().unwrap_or_else(|e| e.into_inner()).len(),
            Backend::Redis(_) => 0,
        }
    }

    /// 后台定期清理过期窗口
    pub fn spawn_sweeper(&self) -> Option<tokio::task::JoinHandle<()>> {
        if matches!(self.backend, Backend::Redis(_)) {
            return None;
        }
        let limiter = self.clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.window);
            interval.tick().await;
            loop {
                interval.tick().await;
                let purged = limiter.purge_expired();
                if purged > 0 {
                    tracing::debug!(
                        purged,
                        tracked = limiter.tracked_clients(),
                        "Purged expired rate limit windows"
                    );
                }
            }
        }))
    }
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    let pairs = [
        ("x-ratelimit-limit", decision.limit.to_string()),
        ("x-ratelimit-remaining", decision.remaining.to_string()),
        ("x-ratelimit-reset", decision.retry_after_secs().to_string()),
    ];
    for (name, value) in pairs {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let ip = client_ip(req.headers(), remote);

    let decision = limiter.check(&ip).await;
    if !decision.allowed {
        tracing::info!(ip = %ip, "Rate limit exceeded");
        let retry_after_secs = decision.retry_after_secs();
        let mut response = AppError::RateLimited {
            message: format!(
                "Too many requests. Please try again in {} seconds.",
                retry_after_secs
            ),
            retry_after_secs,
        }
        .into_response();
        apply_headers(response.headers_mut(), &decision);
        return response;
    }

    let mut response = next.run(req).await;
    apply_headers(response.headers_mut(), &decision);
    response
}
