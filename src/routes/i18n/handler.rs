use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::header,
    response::IntoResponse,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};

use crate::{
    AppState,
    error::{AppError, FieldError},
    extractors::{LOCALE_COOKIE, RequestLocale},
    i18n::I18nError,
    result::ApiResult,
    routes::supported_locale,
};

use super::model::{
    DetectResponse, MessagesParams, MetadataResponse, SwitchParams, SwitchResponse,
};

// 语言偏好 Cookie 有效期一年
const LOCALE_COOKIE_MAX_AGE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn page_path(locale: &str, page: &str) -> String {
    match page {
        "home" | "index" => format!("/{}", locale),
        other => format!("/{}/{}", locale, other.trim_matches('/')),
    }
}

/// 返回某语言的完整翻译资源
#[axum::debug_handler]
pub async fn get_messages(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    params: Result<Query<MessagesParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let locale = supported_locale(&state, &locale)?;
    let Query(params) = params?;
    let messages = state.messages.messages(&locale).map_err(|e| match &e {
        I18nError::UnsupportedLocale(l) => AppError::NotFound(format!("Unknown locale: {}", l)),
        I18nError::Io { .. } => {
            tracing::warn!(error = %e, "Translation bundle missing");
            AppError::NotFound(format!("No messages for locale: {}", locale))
        }
        I18nError::Parse { .. } | I18nError::Serialize { .. } => AppError::Internal(e.to_string()),
    })?;

    let body = match params.namespace.as_deref() {
        Some(ns) => messages
            .namespace(ns)
            .ok_or_else(|| AppError::NotFound(format!("Unknown namespace: {}", ns)))?,
        None => (*messages).clone(),
    };

    let cache_control = format!("public, max-age={}", state.config.message_cache_ttl_secs);
    Ok(([(header::CACHE_CONTROL, cache_control)], Json(body)))
}

/// 页面标题和描述，附带各语言版本的路径
#[axum::debug_handler]
pub async fn page_metadata(
    State(state): State<AppState>,
    Path((locale, page)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let locale = supported_locale(&state, &locale)?;
    let meta = state.messages.page_metadata(&locale, &page);

    let alternates = state
        .locales()
        .supported()
        .iter()
        .map(|l| (l.clone(), page_path(l, &page)))
        .collect();

    Ok(Json(ApiResult::success(
        "ok",
        MetadataResponse {
            canonical: page_path(&locale, &page),
            locale,
            page,
            title: meta.title,
            description: meta.description,
            alternates,
        },
    )))
}

/// 切换语言：返回新路径并写入语言偏好 Cookie
#[axum::debug_handler]
pub async fn switch_locale(
    State(state): State<AppState>,
    jar: CookieJar,
    params: Result<Query<SwitchParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let target = params
        .to
        .as_deref()
        .filter(|t| state.locales().is_supported(t))
        .map(crate::i18n::normalize)
        .ok_or_else(|| AppError::Validation {
            message: "Invalid query parameters".into(),
            errors: vec![FieldError::new("to", "Unsupported locale")],
        })?;

    let path = state
        .locales()
        .switch_locale_path(params.path.as_deref().unwrap_or("/"), &target);

    let mut cookie = Cookie::build((LOCALE_COOKIE, target.clone()))
        .path("/")
        .same_site(SameSite::Lax);
    if let Ok(max_age) = LOCALE_COOKIE_MAX_AGE.try_into() {
        cookie = cookie.max_age(max_age);
    }

    Ok((
        jar.add(cookie),
        Json(ApiResult::success(
            "ok",
            SwitchResponse {
                locale: target,
                path,
            },
        )),
    ))
}

/// 根据 Cookie 和 Accept-Language 推断语言
#[axum::debug_handler]
pub async fn detect_locale(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
) -> impl IntoResponse {
    let settings = state.locales();
    Json(ApiResult::success(
        "ok",
        DetectResponse {
            locale,
            default_locale: settings.default_locale().to_string(),
            supported: settings.supported().to_vec(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_page_maps_to_locale_root() {
        assert_eq!(page_path("es", "home"), "/es");
        assert_eq!(page_path("es", "contact"), "/es/contact");
    }
}
