use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::cache::{CacheSnapshot, CacheStats, LruCache};
use crate::cache::lru::SnapshotEntry;
use crate::config::Config;

use super::locale::LocaleSettings;
use super::messages::{Messages, interpolate};

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("unsupported locale: {0}")]
    UnsupportedLocale(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize cache snapshot for {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// 页面元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
}

/// 翻译资源存储，按语言经 LRU 缓存加载 `{dir}/{locale}.json`
pub struct MessageStore {
    dir: PathBuf,
    settings: LocaleSettings,
    cache: Mutex<LruCache<String, Arc<Messages>>>,
    snapshot_path: Option<PathBuf>,
}

impl MessageStore {
    pub fn new(
        dir: impl Into<PathBuf>,
        settings: LocaleSettings,
        capacity: usize,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            dir: dir.into(),
            settings,
            cache: Mutex::new(LruCache::new(capacity, ttl)),
            snapshot_path: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let ttl = (config.message_cache_ttl_secs > 0).then(|| config.message_cache_ttl());
        let store = Self::new(
            &config.messages_dir,
            LocaleSettings::new(&config.default_locale, &config.supported_locales),
            config.message_cache_capacity,
            ttl,
        );
        match &config.message_cache_snapshot {
            Some(path) => store.with_snapshot_path(path),
            None => store,
        }
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &LocaleSettings {
        &self.settings
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, LruCache<String, Arc<Messages>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    fn bundle_path(&self, locale: &str) -> PathBuf {
        self.dir.join(format!("{}.json", locale))
    }

    fn load(&self, locale: &str) -> Result<Messages, I18nError> {
        let path = self.bundle_path(locale);
        let raw = fs::read_to_string(&path).map_err(|source| I18nError::Io {
            path: path.clone(),
            source,
        })?;
        let value = serde_json::from_str(&raw).map_err(|source| I18nError::Parse {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(locale, path = %path.display(), "Loaded translation bundle");
        Ok(Messages::new(value))
    }

    /// 获取某语言的翻译资源，命中缓存时不读盘
    pub fn messages(&self, locale: &str) -> Result<Arc<Messages>, I18nError> {
        let locale = self
            .settings
            .match_locale(locale)
            .ok_or_else(|| I18nError::UnsupportedLocale(locale.to_string()))?;

        if let Some(hit) = self.cache().get(&locale) {
            return Ok(hit);
        }

        // 读盘时不持有锁
        let messages = Arc::new(self.load(&locale)?);
        self.cache().insert(locale, messages.clone());
        Ok(messages)
    }

    /// 先查目标语言，再查默认语言
    pub fn lookup(&self, locale: &str, key: &str) -> Option<String> {
        let mut locales = vec![locale.to_string()];
        if self.settings.default_locale() != locale {
            locales.push(self.settings.default_locale().to_string());
        }

        for candidate in locales {
            match self.messages(&candidate) {
                Ok(messages) => {
                    if let Some(text) = messages.lookup(key) {
                        return Some(text.to_string());
                    }
                }
                Err(e) => tracing::debug!(locale = %candidate, error = %e, "Translation bundle unavailable"),
            }
        }
        None
    }

    /// 翻译并替换占位符；找不到时返回键本身
    pub fn translate(&self, locale: &str, key: &str, params: &[(&str, &str)]) -> String {
        match self.lookup(locale, key) {
            Some(template) => interpolate(&template, params),
            None => {
                tracing::debug!(locale, key, "Missing translation");
                key.to_string()
            }
        }
    }

    /// 找不到时使用给定的默认文本
    pub fn translate_or(
        &self,
        locale: &str,
        key: &str,
        fallback: &str,
        params: &[(&str, &str)],
    ) -> String {
        let template = self.lookup(locale, key);
        interpolate(template.as_deref().unwrap_or(fallback), params)
    }

    /// 读取 `metadata.{page}.title/description`，缺失时使用 `metadata.default`
    pub fn page_metadata(&self, locale: &str, page: &str) -> PageMetadata {
        let field = |name: &str| {
            self.lookup(locale, &format!("metadata.{}.{}", page, name))
                .or_else(|| self.lookup(locale, &format!("metadata.default.{}", name)))
        };

        PageMetadata {
            title: field("title").unwrap_or_else(|| page.to_string()),
            description: field("description").unwrap_or_default(),
        }
    }

    /// 将缓存内容写入快照文件
    pub fn persist(&self) -> Result<usize, I18nError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(0);
        };

        let snapshot = self.cache().snapshot();
        let owned = CacheSnapshot {
            version: snapshot.version,
            entries: snapshot
                .entries
                .into_iter()
                .map(|e| SnapshotEntry {
                    key: e.key,
                    value: (*e.value).clone(),
                    stored_at: e.stored_at,
                })
                .collect::<Vec<SnapshotEntry<String, Messages>>>(),
        };
        let count = owned.entries.len();

        let io_err = |source| I18nError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_vec(&owned).map_err(|source| I18nError::Serialize {
            path: path.clone(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)?;

        tracing::info!(entries = count, path = %path.display(), "Persisted message cache");
        Ok(count)
    }

    /// 从快照文件恢复缓存；文件不存在时忽略
    pub fn restore(&self) -> Result<usize, I18nError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(0);
        };
        if !Path::new(path).exists() {
            return Ok(0);
        }

        let raw = fs::read(path).map_err(|source| I18nError::Io {
            path: path.clone(),
            source,
        })?;
        let snapshot: CacheSnapshot<String, Messages> =
            serde_json::from_slice(&raw).map_err(|source| I18nError::Parse {
                path: path.clone(),
                source,
            })?;

        let shared = CacheSnapshot {
            version: snapshot.version,
            entries: snapshot
                .entries
                .into_iter()
                .filter(|e| self.settings.is_supported(&e.key))
                .map(|e| SnapshotEntry {
                    key: e.key,
                    value: Arc::new(e.value),
                    stored_at: e.stored_at,
                })
                .collect(),
        };
        let restored = self.cache().restore(shared);
        tracing::info!(entries = restored, path = %path.display(), "Restored message cache");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_bundle(dir: &Path, locale: &str, value: serde_json::Value) {
        fs::write(dir.join(format!("{}.json", locale)), value.to_string()).unwrap();
    }

    fn store(dir: &Path) -> MessageStore {
        write_bundle(
            dir,
            "en",
            json!({
                "metadata": {
                    "default": { "title": "Acme", "description": "We build things" },
                    "contact": { "title": "Contact us" }
                },
                "greeting": "Hello {name}",
                "only_en": "English only"
            }),
        );
        write_bundle(
            dir,
            "es",
            json!({
                "metadata": { "contact": { "title": "Contáctanos" } },
                "greeting": "Hola {name}"
            }),
        );
        MessageStore::new(
            dir,
            LocaleSettings::new("en", &["en".into(), "es".into(), "fr".into()]),
            4,
            Some(Duration::from_secs(60)),
        )
    }

    #[test]
    fn translates_with_interpolation() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert_eq!(store.translate("es", "greeting", &[("name", "Ana")]), "Hola Ana");
    }

    #[test]
    fn falls_back_to_default_locale_then_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert_eq!(store.translate("es", "only_en", &[]), "English only");
        // fr 没有资源文件，回退到 en
        assert_eq!(store.translate("fr", "greeting", &[("name", "Zoé")]), "Hello Zoé");
        assert_eq!(store.translate("es", "nope.missing", &[]), "nope.missing");
        assert_eq!(store.translate_or("es", "nope", "Default", &[]), "Default");
    }

    #[test]
    fn second_read_is_a_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.messages("en").unwrap();
        store.messages("en-US").unwrap();
        let stats = store.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn unsupported_locale_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert!(matches!(
            store.messages("de"),
            Err(I18nError::UnsupportedLocale(_))
        ));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        fs::write(dir.path().join("fr.json"), "{ not json").unwrap();
        assert!(matches!(store.messages("fr"), Err(I18nError::Parse { .. })));
    }

    #[test]
    fn page_metadata_uses_page_then_default_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let meta = store.page_metadata("es", "contact");
        assert_eq!(meta.title, "Contáctanos");
        assert_eq!(meta.description, "We build things");

        let meta = store.page_metadata("en", "pricing");
        assert_eq!(meta.title, "Acme");
    }

    #[test]
    fn snapshot_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("cache/messages.json");

        let first = store(dir.path()).with_snapshot_path(&snapshot);
        first.messages("en").unwrap();
        first.messages("es").unwrap();
        assert_eq!(first.persist().unwrap(), 2);

        // 删除资源文件后仍可从快照读取
        fs::remove_file(dir.path().join("es.json")).unwrap();
        let second = MessageStore::new(
            dir.path(),
            LocaleSettings::new("en", &["en".into(), "es".into()]),
            4,
            Some(Duration::from_secs(60)),
        )
        .with_snapshot_path(&snapshot);
        assert_eq!(second.restore().unwrap(), 2);
        assert_eq!(second.translate("es", "greeting", &[("name", "Ana")]), "Hola Ana");
    }

    #[test]
    fn snapshot_encoding_failure_is_not_reported_as_parse() {
        let source = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err = I18nError::Serialize {
            path: PathBuf::from("cache/messages.json"),
            source,
        };
        assert!(err.to_string().starts_with("failed to serialize cache snapshot for cache/messages.json"));
    }

    #[test]
    fn from_config_picks_up_snapshot_path() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "en", serde_json::json!({ "hi": "Hello" }));
        let config = Config {
            messages_dir: dir.path().to_path_buf(),
            message_cache_snapshot: Some(dir.path().join("snap.json")),
            ..Config::default()
        };

        let store = MessageStore::from_config(&config);
        store.messages("en").unwrap();
        assert_eq!(store.persist().unwrap(), 1);
        assert!(dir.path().join("snap.json").exists());
    }

    #[test]
    fn restore_without_snapshot_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path()).with_snapshot_path(dir.path().join("absent.json"));
        assert_eq!(store.restore().unwrap(), 0);
    }
}
