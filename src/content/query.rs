//! 内容查询：过滤、排序、分页

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::model::{ContentItem, ContentKind};

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub kind: Option<ContentKind>,
    pub locale: Option<String>,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub featured: Option<bool>,
    pub include_drafts: bool,
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Updated,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
    pub filter: ContentFilter,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: usize,
    pub per_page: Option<usize>,
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl ContentFilter {
    pub fn matches(&self, item: &ContentItem) -> bool {
        if item.draft && !self.include_drafts {
            return false;
        }
        if self.kind.is_some_and(|k| k != item.kind) {
            return false;
        }
        if self.locale.as_deref().is_some_and(|l| !eq_ignore_case(l, &item.locale)) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !item.tags.iter().any(|t| eq_ignore_case(t, tag)) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !item.category.as_deref().is_some_and(|c| eq_ignore_case(c, category)) {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if !item.author.as_deref().is_some_and(|a| eq_ignore_case(a, author)) {
                return false;
            }
        }
        if self.featured.is_some_and(|f| f != item.featured) {
            return false;
        }
        if self.from.is_some() || self.to.is_some() {
            let Some(date) = item.date.map(|d| d.date_naive()) else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = item.title.to_lowercase().contains(&needle)
                || item
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || item.body.to_lowercase().contains(&needle)
                || item.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

pub fn filter<'a>(
    items: impl IntoIterator<Item = &'a ContentItem>,
    filter: &ContentFilter,
) -> Vec<&'a ContentItem> {
    items.into_iter().filter(|item| filter.matches(item)).collect()
}

/// 稳定排序；无日期的条目始终排在最后，slug 作为次序键
pub fn sort(items: &mut [&ContentItem], field: SortField, order: SortOrder) {
    items.sort_by(|a, b| compare(a, b, field, order));
}

fn compare(a: &ContentItem, b: &ContentItem, field: SortField, order: SortOrder) -> Ordering {
    let directed = |ord: Ordering| match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    };

    let primary = match field {
        SortField::Title => directed(a.title.to_lowercase().cmp(&b.title.to_lowercase())),
        SortField::Date | SortField::Updated => {
            let key = |item: &ContentItem| match field {
                SortField::Updated => item.updated.or(item.date),
                _ => item.date,
            };
            match (key(a), key(b)) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }
    };

    primary.then_with(|| a.slug.cmp(&b.slug))
}

/// 1 起始页码；每页数量限制在 1..=100，页码 0 视为 1
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: Option<usize>) -> Page<T> {
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let page = page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

/// 过滤 → 排序 → 分页
pub fn run<'a>(
    items: impl IntoIterator<Item = &'a ContentItem>,
    query: &ContentQuery,
) -> Page<&'a ContentItem> {
    let mut matched = filter(items, &query.filter);
    sort(&mut matched, query.sort, query.order);
    paginate(&matched, query.page, query.per_page)
}
