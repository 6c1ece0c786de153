pub mod contact;
pub mod content;
pub mod i18n;

use axum::{Json, response::IntoResponse};
use serde::Serialize;

use crate::{AppState, error::AppError, utils::iso_timestamp};

/// 路径中的语言必须是支持的语言
pub(crate) fn supported_locale(state: &AppState, locale: &str) -> Result<String, AppError> {
    if state.locales().is_supported(locale) {
        Ok(crate::i18n::normalize(locale))
    } else {
        Err(AppError::NotFound(format!("Unknown locale: {}", locale)))
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
}

pub async fn health() -> impl IntoResponse {
    Json(Health {
        status: "ok",
        timestamp: iso_timestamp(),
    })
}
