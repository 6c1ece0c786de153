use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessagesParams {
    /// 只返回某个命名空间，例如 `contact`
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub locale: String,
    pub page: String,
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub alternates: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SwitchParams {
    pub path: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    pub locale: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub locale: String,
    pub default_locale: String,
    pub supported: Vec<String>,
}
