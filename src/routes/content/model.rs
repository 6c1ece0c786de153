use serde::{Deserialize, Serialize};

use crate::content::{Adjacent, ContentItem, ContentKind, SortField, SortOrder, TagCount};

/// 列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentListParams {
    #[serde(rename = "type")]
    pub kind: Option<ContentKind>,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub featured: Option<bool>,
    pub q: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort: Option<SortField>,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ContentDetail<'a> {
    pub item: &'a ContentItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjacent: Option<Adjacent>,
}

#[derive(Debug, Serialize)]
pub struct TagList {
    pub locale: String,
    pub tags: Vec<TagCount>,
}
