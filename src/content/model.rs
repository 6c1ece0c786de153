use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Page,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Post => write!(f, "post"),
            ContentKind::Page => write!(f, "page"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" | "posts" | "blog" => Ok(ContentKind::Post),
            "page" | "pages" => Ok(ContentKind::Page),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// markdown 文件头部的 YAML 元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub updated: Option<String>,
    pub author: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub draft: bool,
    pub featured: bool,
    pub slug: Option<String>,
    pub locale: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// `tags: rust, web` 与 `tags: [rust, web]` 两种写法
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

/// 解析日期：`YYYY-MM-DD` 或 RFC 3339
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// 内容条目（文章或页面）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub slug: String,
    pub kind: ContentKind,
    pub locale: String,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub draft: bool,
    pub featured: bool,
    pub excerpt: String,
    pub reading_time_minutes: u32,
    pub body: String,
}

/// 列表视图使用的摘要，不含正文
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub slug: String,
    pub kind: ContentKind,
    pub locale: String,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub featured: bool,
    pub excerpt: String,
    pub reading_time_minutes: u32,
}

impl From<&ContentItem> for ContentSummary {
    fn from(item: &ContentItem) -> Self {
        ContentSummary {
            slug: item.slug.clone(),
            kind: item.kind,
            locale: item.locale.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            date: item.date,
            updated: item.updated,
            author: item.author.clone(),
            tags: item.tags.clone(),
            category: item.category.clone(),
            image: item.image.clone(),
            featured: item.featured,
            excerpt: item.excerpt.clone(),
            reading_time_minutes: item.reading_time_minutes,
        }
    }
}

const WORDS_PER_MINUTE: usize = 200;
const EXCERPT_LENGTH: usize = 160;

pub fn reading_time_minutes(body: &str) -> u32 {
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// 取正文前 160 个字符，在词边界截断；跳过标题行
pub fn excerpt(body: &str) -> String {
    let text = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("```"))
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.chars().count() <= EXCERPT_LENGTH {
        return text;
    }

    let cut: String = text.chars().take(EXCERPT_LENGTH).collect();
    let trimmed = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end_matches(|c: char| c.is_ascii_punctuation()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_plain_and_rfc3339_dates() {
        let d = parse_date("2024-03-05").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 3, 5));
        let d = parse_date("2024-03-05T10:00:00+02:00").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-03-05T08:00:00+00:00");
        assert!(parse_date("March 5").is_none());
    }

    #[test]
    fn tags_accept_scalar_or_list() {
        let fm: FrontMatter = serde_yaml::from_str("title: T\ntags: rust").unwrap();
        assert_eq!(fm.tags, vec!["rust"]);

        let fm: FrontMatter = serde_yaml::from_str("title: T\ntags: rust, web").unwrap();
        assert_eq!(fm.tags, vec!["rust", "web"]);

        let fm: FrontMatter = serde_yaml::from_str("title: T\ntags: [a, b]").unwrap();
        assert_eq!(fm.tags, vec!["a", "b"]);

        let fm: FrontMatter = serde_yaml::from_str("title: T\ntags:").unwrap();
        assert!(fm.tags.is_empty());

        let fm: FrontMatter = serde_yaml::from_str("title: T").unwrap();
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn kind_accepts_aliases() {
        assert_eq!("Blog".parse::<ContentKind>(), Ok(ContentKind::Post));
        assert_eq!("pages".parse::<ContentKind>(), Ok(ContentKind::Page));
        assert!("video".parse::<ContentKind>().is_err());
    }

    #[test]
    fn reading_time_is_at_least_one_minute() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(401)), 3);
    }

    #[test]
    fn excerpt_skips_headings_and_cuts_on_word_boundary() {
        let body = format!("# Title\n\n{}", "lorem ipsum ".repeat(40));
        let ex = excerpt(&body);
        assert!(!ex.contains('#'));
        assert!(ex.ends_with('…'));
        assert!(ex.chars().count() <= EXCERPT_LENGTH + 1);
        assert!(!ex.contains("  "));

        assert_eq!(excerpt("Short body."), "Short body.");
    }
}
