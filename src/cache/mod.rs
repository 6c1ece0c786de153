// 缓存模块
// 包含限流计数、LRU 缓存及其键生成逻辑

pub mod keys;
pub mod lru;
pub mod models;
pub mod operations;

pub use lru::{CacheSnapshot, CacheStats, LruCache};
pub use models::rate_limit::{RateLimitDecision, RateLimitEntry};
pub use operations::rate_limit::RateLimitCacheOperations;
