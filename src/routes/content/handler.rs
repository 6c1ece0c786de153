use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use chrono::NaiveDate;

use crate::{
    AppState,
    content::{ContentFilter, ContentQuery, ContentSummary, ContentKind},
    error::{AppError, FieldError},
    result::ApiResult,
    routes::supported_locale,
};

use super::model::{ContentDetail, ContentListParams, TagList};

fn parse_day(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, FieldError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FieldError::new(field, "Expected a date in YYYY-MM-DD format")),
        None => Ok(None),
    }
}

impl ContentListParams {
    fn into_query(self, locale: String) -> Result<ContentQuery, AppError> {
        let from = parse_day("from", self.from.as_deref());
        let to = parse_day("to", self.to.as_deref());

        let errors: Vec<FieldError> = [&from, &to]
            .into_iter()
            .filter_map(|r| r.as_ref().err().cloned())
            .collect();
        if !errors.is_empty() {
            return Err(AppError::Validation {
                message: "Invalid query parameters".into(),
                errors,
            });
        }

        Ok(ContentQuery {
            filter: ContentFilter {
                kind: self.kind,
                locale: Some(locale),
                tag: self.tag,
                category: self.category,
                author: self.author,
                featured: self.featured,
                include_drafts: false,
                search: self.q,
                from: from.ok().flatten(),
                to: to.ok().flatten(),
            },
            sort: self.sort.unwrap_or_default(),
            order: self.order.unwrap_or_default(),
            page: self.page.unwrap_or(1),
            per_page: self.per_page,
        })
    }
}

#[axum::debug_handler]
pub async fn list_content(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    params: Result<Query<ContentListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let locale = supported_locale(&state, &locale)?;
    let Query(params) = params?;
    let query = params.into_query(locale)?;

    let page = state.content.query(&query).map(ContentSummary::from);
    Ok(Json(ApiResult::success("ok", page)))
}

#[axum::debug_handler]
pub async fn get_content(
    State(state): State<AppState>,
    Path((locale, slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let locale = supported_locale(&state, &locale)?;
    let item = state
        .content
        .find(&locale, &slug)
        .ok_or_else(|| AppError::NotFound(format!("Content not found: {}", slug)))?;

    let adjacent = match item.kind {
        ContentKind::Post => state.content.adjacent(&item.locale, &item.slug),
        ContentKind::Page => None,
    };

    Ok(Json(ApiResult::success("ok", ContentDetail { item, adjacent })).into_response())
}

#[axum::debug_handler]
pub async fn list_tags(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let locale = supported_locale(&state, &locale)?;
    let tags = state.content.tags(&locale);
    Ok(Json(ApiResult::success("ok", TagList { locale, tags })))
}
