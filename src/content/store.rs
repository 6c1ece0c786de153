//! 扁平文件内容存储
//!
//! 启动时递归读取内容目录下的所有 `*.md` 文件：
//!
//! ```text
//! content/
//! ├── blog/
//! │   ├── en/hello-world.md      # 文章，语言取自父目录
//! │   └── launch.es.md           # 文章，语言取自文件名后缀
//! └── about.md                   # 页面，使用默认语言
//! ```
//!
//! 文件以 `---` 包围的 YAML 头部开始，`title` 为必填项。

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::i18n::LocaleSettings;

use super::model::{
    ContentItem, ContentKind, ContentSummary, FrontMatter, excerpt, parse_date,
    reading_time_minutes,
};
use super::query::{self, ContentFilter, ContentQuery, Page, SortField, SortOrder};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
    #[error("unterminated front matter block")]
    UnterminatedFrontMatter,
    #[error("missing required field `title`")]
    MissingTitle,
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    #[error("invalid content type: {0}")]
    InvalidKind(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// 相邻文章（按日期）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjacent {
    pub newer: Option<ContentSummary>,
    pub older: Option<ContentSummary>,
}

/// 拆分 YAML 头部与正文
pub fn split_front_matter(raw: &str) -> Result<(Option<&str>, &str), ContentError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let Some(rest) = raw
        .strip_prefix("---\r\n")
        .or_else(|| raw.strip_prefix("---\n"))
    else {
        return Ok((None, raw));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(yaml), body.trim_start_matches(['\r', '\n'])));
        }
        offset += line.len();
    }
    Err(ContentError::UnterminatedFrontMatter)
}

fn optional_date(raw: Option<&str>) -> Result<Option<chrono::DateTime<chrono::Utc>>, ContentError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| ContentError::InvalidDate(s.to_string())),
        None => Ok(None),
    }
}

/// 由路径推断的默认值
#[derive(Debug, Clone)]
pub struct PathDefaults {
    pub slug: String,
    pub locale: String,
    pub kind: ContentKind,
}

impl PathDefaults {
    /// `relative` 为相对内容根目录的路径
    pub fn infer(relative: &Path, settings: &LocaleSettings) -> Self {
        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        // launch.es.md → slug "launch"，语言 "es"
        let (slug, suffix_locale) = match stem.rsplit_once('.') {
            Some((base, suffix)) if settings.is_supported(suffix) => {
                (base.to_string(), Some(crate::i18n::normalize(suffix)))
            }
            _ => (stem.clone(), None),
        };

        let dirs: Vec<String> = relative
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let locale = suffix_locale
            .or_else(|| {
                dirs.iter()
                    .rev()
                    .find(|d| settings.is_supported(d))
                    .map(|d| crate::i18n::normalize(d))
            })
            .unwrap_or_else(|| settings.default_locale().to_string());

        let kind = if dirs
            .iter()
            .any(|d| matches!(d.to_ascii_lowercase().as_str(), "blog" | "posts"))
        {
            ContentKind::Post
        } else {
            ContentKind::Page
        };

        Self { slug, locale, kind }
    }
}

/// 解析单个 markdown 文档
pub fn parse_document(
    raw: &str,
    defaults: &PathDefaults,
    settings: &LocaleSettings,
) -> Result<ContentItem, ContentError> {
    let (yaml, body) = split_front_matter(raw)?;
    let front: FrontMatter = match yaml {
        Some(y) if !y.trim().is_empty() => serde_yaml::from_str(y)?,
        _ => FrontMatter::default(),
    };

    let title = front
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ContentError::MissingTitle)?;

    let kind = match front.kind.as_deref() {
        Some(k) => k.parse().map_err(ContentError::InvalidKind)?,
        None => defaults.kind,
    };

    let locale = front
        .locale
        .as_deref()
        .and_then(|l| settings.match_locale(l))
        .unwrap_or_else(|| defaults.locale.clone());

    let description = front
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let body = body.to_string();
    Ok(ContentItem {
        slug: front
            .slug
            .map(|s| s.trim().trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults.slug.clone()),
        kind,
        locale,
        date: optional_date(front.date.as_deref())?,
        updated: optional_date(front.updated.as_deref())?,
        author: front.author,
        tags: front
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        category: front.category,
        image: front.image,
        draft: front.draft,
        featured: front.featured,
        excerpt: description.clone().unwrap_or_else(|| excerpt(&body)),
        reading_time_minutes: reading_time_minutes(&body),
        description,
        title,
        body,
    })
}

pub struct ContentStore {
    items: Vec<ContentItem>,
    settings: LocaleSettings,
}

impl ContentStore {
    /// 由已解析的条目构建；重复的 (语言, 类型, slug) 只保留第一个
    pub fn from_items(items: Vec<ContentItem>, settings: LocaleSettings) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| {
                let fresh = seen.insert((item.locale.clone(), item.kind, item.slug.clone()));
                if !fresh {
                    tracing::warn!(
                        locale = %item.locale,
                        kind = %item.kind,
                        slug = %item.slug,
                        "Duplicate content entry skipped"
                    );
                }
                fresh
            })
            .collect();
        Self { items, settings }
    }

    /// 加载内容目录；目录不存在时返回空存储，单个文件出错时跳过
    pub fn load(root: &Path, settings: LocaleSettings) -> Self {
        if !root.is_dir() {
            tracing::warn!(path = %root.display(), "Content directory not found, serving no content");
            return Self::from_items(Vec::new(), settings);
        }

        let mut items = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable content entry");
                    None
                }
            });

        for entry in walker {
            let path = entry.path();
            let is_markdown = entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
            if !is_markdown {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path);
            let defaults = PathDefaults::infer(relative, &settings);
            let parsed = fs::read_to_string(path)
                .map_err(|source| ContentError::Io {
                    path: path.to_path_buf(),
                    source,
                })
                .and_then(|raw| parse_document(&raw, &defaults, &settings));

            match parsed {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping invalid content file")
                }
            }
        }

        let store = Self::from_items(items, settings);
        tracing::info!(items = store.len(), path = %root.display(), "Loaded content store");
        store
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn query(&self, query: &ContentQuery) -> Page<&ContentItem> {
        query::run(&self.items, query)
    }

    /// 查找已发布条目；目标语言没有时回退到默认语言
    pub fn find(&self, locale: &str, slug: &str) -> Option<&ContentItem> {
        let lookup = |locale: &str| {
            self.items
                .iter()
                .filter(|i| !i.draft && i.locale == locale && i.slug == slug)
                // 同名时文章优先于页面
                .min_by_key(|i| i.kind != ContentKind::Post)
        };
        lookup(locale).or_else(|| {
            let default = self.settings.default_locale();
            (default != locale).then(|| lookup(default)).flatten()
        })
    }

    /// 标签及出现次数，按次数降序、名称升序
    pub fn tags(&self, locale: &str) -> Vec<TagCount> {
        let mut counts: HashMap<String, (String, usize)> = HashMap::new();
        for item in self.items.iter().filter(|i| !i.draft && i.locale == locale) {
            for tag in &item.tags {
                counts
                    .entry(tag.to_lowercase())
                    .or_insert_with(|| (tag.clone(), 0))
                    .1 += 1;
            }
        }

        let mut tags: Vec<TagCount> = counts
            .into_values()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        tags.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.tag.to_lowercase().cmp(&b.tag.to_lowercase()))
        });
        tags
    }

    /// 同语言已发布文章中，按日期相邻的前后两篇
    pub fn adjacent(&self, locale: &str, slug: &str) -> Option<Adjacent> {
        let filter = ContentFilter {
            kind: Some(ContentKind::Post),
            locale: Some(locale.to_string()),
            ..Default::default()
        };
        let mut posts = query::filter(&self.items, &filter);
        query::sort(&mut posts, SortField::Date, SortOrder::Desc);

        let idx = posts.iter().position(|p| p.slug == slug)?;
        Some(Adjacent {
            newer: idx
                .checked_sub(1)
                .and_then(|i| posts.get(i))
                .map(|p| ContentSummary::from(*p)),
            older: posts.get(idx + 1).map(|p| ContentSummary::from(*p)),
        })
    }
}
