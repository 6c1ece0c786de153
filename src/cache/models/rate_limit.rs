use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 固定窗口限流计数
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: i64, // Unix 毫秒
}

/// 一次限流检查的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl RateLimitDecision {
    /// 从窗口内计数推导结果；`count` 包含本次请求
    pub fn from_count(count: u32, limit: u32, reset_after: Duration) -> Self {
        Self {
            allowed: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_after,
        }
    }

    /// Retry-After 以整秒计，至少为 1
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

impl RateLimitEntry {
    pub fn new(now: i64) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    pub fn is_expired(&self, now: i64, window: Duration) -> bool {
        now.saturating_sub(self.window_start) >= window.as_millis() as i64
    }

    /// 记录一次请求；窗口已过期时重新开始计数
    pub fn register(&mut self, now: i64, window: Duration, limit: u32) -> RateLimitDecision {
        if self.is_expired(now, window) {
            self.count = 0;
            self.window_start = now;
        }

        // 超限后不再累加，避免计数无限增长
        if self.count <= limit {
            self.count += 1;
        }

        let elapsed = now.saturating_sub(self.window_start).max(0) as u64;
        let reset_after = window.saturating_sub(Duration::from_millis(elapsed));
        RateLimitDecision::from_count(self.count, limit, reset_after)
    }
}
