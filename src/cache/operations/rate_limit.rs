use std::sync::Arc;
use std::time::Duration;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::rate_limit_key;
use crate::cache::models::rate_limit::RateLimitDecision;

/// 基于 Redis 的限流计数操作
pub struct RateLimitCacheOperations;

impl RateLimitCacheOperations {
    /// 使用 INCR 和 EXPIRE 实现固定窗口计数
    pub async fn register(
        redis: &Arc<RedisClient>,
        client_ip: &str,
        window: Duration,
        limit: u32,
    ) -> Result<RateLimitDecision, redis::RedisError> {
        let mut conn = redis.get_multiplexed_async_connection().await?;
        let key = rate_limit_key(client_ip);

        let count: u32 = conn.incr(&key, 1).await?;
        if count == 1 {
            // 第一次请求，设置窗口过期时间
            let _: () = conn.expire(&key, window.as_secs() as i64).await?;
        }

        // 键没有过期时间时（例如 EXPIRE 之前进程中断）补设
        let ttl: i64 = conn.ttl(&key).await?;
        let reset_after = if ttl > 0 {
            Duration::from_secs(ttl as u64)
        } else {
            let _: () = conn.expire(&key, window.as_secs() as i64).await?;
            window
        };

        Ok(RateLimitDecision::from_count(count, limit, reset_after))
    }
}
