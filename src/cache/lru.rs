//! 带 TTL 的 LRU 缓存
//!
//! 容量满时淘汰最久未访问的条目；过期条目在访问时惰性清除。
//! 所有依赖时间的操作都有 `*_at` 版本，时间由调用方以毫秒传入。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::now_millis;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: i64,
    tick: u64,
}

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

/// 持久化快照中的单个条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry<K, V> {
    pub key: K,
    pub value: V,
    pub stored_at: i64,
}

/// 缓存快照，条目按从旧到新的访问顺序排列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot<K, V> {
    pub version: u32,
    pub entries: Vec<SnapshotEntry<K, V>>,
}

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    ttl: Option<Duration>,
    entries: HashMap<K, Entry<V>>,
    order: BTreeMap<u64, K>,
    next_tick: u64,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// `ttl` 为 `None` 时条目永不过期；容量至少为 1
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_tick: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn is_expired(&self, stored_at: i64, now: i64) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_sub(stored_at) >= ttl.as_millis() as i64,
            None => false,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, now_millis())
    }

    pub fn get_at(&mut self, key: &K, now: i64) -> Option<V> {
        let (stored_at, old_tick) = match self.entries.get(key) {
            Some(entry) => (entry.stored_at, entry.tick),
            None => {
                self.stats.misses += 1;
                return None;
            }
        };

        if self.is_expired(stored_at, now) {
            self.order.remove(&old_tick);
            self.entries.remove(key);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            return None;
        }

        let tick = self.bump();
        self.order.remove(&old_tick);
        self.order.insert(tick, key.clone());
        let entry = self.entries.get_mut(key)?;
        entry.tick = tick;
        self.stats.hits += 1;
        Some(entry.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, now_millis());
    }

    pub fn insert_at(&mut self, key: K, value: V, now: i64) {
        if let Some(old) = self.entries.remove(&key) {
            self.order.remove(&old.tick);
        } else if self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        let tick = self.bump();
        self.order.insert(tick, key.clone());
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
                tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        if let Some((_, key)) = self.order.pop_first() {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.tick);
        Some(entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// 清除所有已过期条目，返回清除数量
    pub fn purge_expired_at(&mut self, now: i64) -> usize {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, e)| self.is_expired(e.stored_at, now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        self.stats.expirations += expired.len() as u64;
        expired.len()
    }

    pub fn snapshot(&self) -> CacheSnapshot<K, V> {
        let entries = self
            .order
            .values()
            .filter_map(|key| {
                self.entries.get(key).map(|e| SnapshotEntry {
                    key: key.clone(),
                    value: e.value.clone(),
                    stored_at: e.stored_at,
                })
            })
            .collect();
        CacheSnapshot {
            version: SNAPSHOT_VERSION,
            entries,
        }
    }

    pub fn restore(&mut self, snapshot: CacheSnapshot<K, V>) -> usize {
        self.restore_at(snapshot, now_millis())
    }

    /// 从快照恢复，跳过已过期条目；保留原始写入时间。返回恢复后仍在缓存中的条目数
    pub fn restore_at(&mut self, snapshot: CacheSnapshot<K, V>, now: i64) -> usize {
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                version = snapshot.version,
                "Ignoring cache snapshot with unknown version"
            );
            return 0;
        }

        let mut restored = HashSet::new();
        for entry in snapshot.entries {
            if self.is_expired(entry.stored_at, now) {
                continue;
            }
            restored.insert(entry.key.clone());
            self.insert_at(entry.key, entry.value, entry.stored_at);
        }
        restored
            .iter()
            .filter(|key| self.entries.contains_key(*key))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
        fn peek(&self, key: &K) -> Option<&V> {
            self.entries.get(key).map(|e| &e.value)
        }
    }

    fn cache(capacity: usize, ttl_ms: u64) -> LruCache<String, u32> {
        LruCache::new(capacity, Some(Duration::from_millis(ttl_ms)))
    }

    #[test]
    fn hit_and_miss_are_counted() {
        let mut c = cache(2, 1_000);
        c.insert_at("en".into(), 1, 0);
        assert_eq!(c.get_at(&"en".into(), 10), Some(1));
        assert_eq!(c.get_at(&"fr".into(), 10), None);
        let stats = c.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let mut c = cache(2, 10_000);
        c.insert_at("a".into(), 1, 0);
        c.insert_at("b".into(), 2, 1);
        // 访问 a，使 b 成为最久未使用
        assert_eq!(c.get_at(&"a".into(), 2), Some(1));
        c.insert_at("c".into(), 3, 3);

        assert_eq!(c.len(), 2);
        assert!(c.peek(&"b".into()).is_none());
        assert_eq!(c.peek(&"a".into()), Some(&1));
        assert_eq!(c.peek(&"c".into()), Some(&3));
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn overwrite_does_not_evict() {
        let mut c = cache(2, 10_000);
        c.insert_at("a".into(), 1, 0);
        c.insert_at("b".into(), 2, 0);
        c.insert_at("a".into(), 10, 1);
        assert_eq!(c.len(), 2);
        assert_eq!(c.stats().evictions, 0);
        assert_eq!(c.peek(&"a".into()), Some(&10));
    }

    #[test]
    fn expired_entries_miss_and_are_dropped() {
        let mut c = cache(4, 100);
        c.insert_at("a".into(), 1, 0);
        assert_eq!(c.get_at(&"a".into(), 99), Some(1));
        assert_eq!(c.get_at(&"a".into(), 100), None);
        assert!(c.is_empty());
        assert_eq!(c.stats().expirations, 1);
    }

    #[test]
    fn no_ttl_never_expires() {
        let mut c: LruCache<String, u32> = LruCache::new(1, None);
        c.insert_at("a".into(), 1, 0);
        assert_eq!(c.get_at(&"a".into(), i64::MAX), Some(1));
    }

    #[test]
    fn purge_removes_only_expired() {
        let mut c = cache(4, 100);
        c.insert_at("old".into(), 1, 0);
        c.insert_at("new".into(), 2, 90);
        assert_eq!(c.purge_expired_at(150), 1);
        assert!(c.peek(&"new".into()).is_some());
    }

    #[test]
    fn snapshot_restore_keeps_order_and_drops_expired() {
        let mut c = cache(3, 1_000);
        c.insert_at("a".into(), 1, 0);
        c.insert_at("b".into(), 2, 500);
        c.insert_at("c".into(), 3, 900);
        c.get_at(&"b".into(), 950);

        let snap = c.snapshot();
        let keys: Vec<_> = snap.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c", "b"]);

        let json = serde_json::to_string(&snap).unwrap();
        let snap: CacheSnapshot<String, u32> = serde_json::from_str(&json).unwrap();

        let mut restored = cache(3, 1_000);
        // 时间 1200 时 a 已过期
        assert_eq!(restored.restore_at(snap, 1_200), 2);
        assert!(restored.peek(&"a".into()).is_none());
        assert_eq!(restored.get_at(&"b".into(), 1_300), Some(2));
        // b 的写入时间保留为 500，1500 时过期
        assert_eq!(restored.get_at(&"b".into(), 1_500), None);
    }

    #[test]
    fn restore_respects_capacity() {
        let mut big = cache(3, 10_000);
        big.insert_at("a".into(), 1, 0);
        big.insert_at("b".into(), 2, 0);
        big.insert_at("c".into(), 3, 0);

        let mut small = cache(2, 10_000);
        assert_eq!(small.restore_at(big.snapshot(), 10), 2);
        assert_eq!(small.len(), 2);
        // 最近使用的条目被保留
        assert!(small.peek(&"c".into()).is_some());
        assert!(small.peek(&"b".into()).is_some());
    }

    #[test]
    fn restore_count_excludes_entries_evicted_later() {
        let mut source = cache(3, 10_000);
        source.insert_at("a".into(), 1, 0);
        source.insert_at("b".into(), 2, 0);

        // 已有条目占位，恢复的 a 随后被 b 挤出
        let mut target = cache(1, 10_000);
        target.insert_at("x".into(), 9, 0);
        assert_eq!(target.restore_at(source.snapshot(), 10), 1);
        assert_eq!(target.len(), 1);
        assert!(target.peek(&"b".into()).is_some());

        let mut roomy = cache(4, 10_000);
        roomy.insert_at("x".into(), 9, 0);
        assert_eq!(roomy.restore_at(source.snapshot(), 10), 2);
        assert_eq!(roomy.len(), 3);
    }

    #[test]
    fn unknown_snapshot_version_is_ignored() {
        let mut c = cache(2, 1_000);
        let snap = CacheSnapshot {
            version: 99,
            entries: vec![SnapshotEntry {
                key: "a".to_string(),
                value: 1,
                stored_at: 0,
            }],
        };
        assert_eq!(c.restore_at(snap, 0), 0);
        assert!(c.is_empty());
    }
}
