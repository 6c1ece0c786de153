use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, FieldError},
    extractors::{ClientIp, RequestLocale},
    infrastructure::Lead,
    result::ApiResult,
    utils::user_agent,
};

use super::model::{ContactReceipt, ContactRequest};

/// 接收联系表单：校验 → 人机验证 → 转发线索
#[axum::debug_handler(state = AppState)]
pub async fn submit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    RequestLocale(request_locale): RequestLocale,
    headers: HeaderMap,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let messages = state.messages.clone();

    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected contact payload");
        AppError::BadRequest(messages.translate_or(
            &request_locale,
            "contact.errors.invalidBody",
            "Invalid request body",
            &[],
        ))
    })?;

    let locale = req
        .locale
        .as_deref()
        .and_then(|l| state.locales().match_locale(l))
        .unwrap_or_else(|| request_locale.clone());

    // 蜜罐被填写时假装成功，不转发
    if req.is_honeypot_filled() {
        tracing::info!(ip = %ip, "Honeypot triggered, dropping contact submission");
        let name = req.name.as_deref().map(str::trim).unwrap_or_default();
        let message = messages.translate_or(
            &locale,
            "contact.success",
            "Thank you, {name}! We'll be in touch soon.",
            &[("name", name)],
        );
        return Ok((
            StatusCode::OK,
            Json(ApiResult::success(message, ContactReceipt { id: Uuid::new_v4() })),
        ));
    }

    let contact = req.validate(state.locales()).map_err(|violations| {
        let errors = violations
            .into_iter()
            .map(|v| FieldError::new(v.field, messages.translate_or(&locale, v.key, &v.fallback, &[])))
            .collect();
        AppError::Validation {
            message: messages.translate_or(
                &locale,
                "contact.errors.validation",
                "Please correct the highlighted fields",
                &[],
            ),
            errors,
        }
    })?;
    let locale = contact.locale.clone().unwrap_or(locale);

    let verification = state
        .turnstile
        .verify(&contact.turnstile_token, Some(&ip))
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    if !verification.is_accepted() {
        tracing::info!(ip = %ip, ?verification, "Contact submission failed bot verification");
        return Err(AppError::BotVerification(messages.translate_or(
            &locale,
            "contact.errors.botCheck",
            "Security verification failed. Please try again.",
            &[],
        )));
    }

    let lead = Lead {
        id: Uuid::new_v4(),
        name: contact.name,
        email: contact.email,
        company: contact.company,
        phone: contact.phone,
        subject: contact.subject,
        message: contact.message,
        locale: locale.clone(),
        ip,
        user_agent: user_agent(&headers),
        source: "contact-form".to_string(),
        submitted_at: Utc::now(),
    };

    state
        .leads
        .forward(&lead)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let message = messages.translate_or(
        &locale,
        "contact.success",
        "Thank you, {name}! We'll be in touch soon.",
        &[("name", lead.name.as_str())],
    );
    Ok((
        StatusCode::OK,
        Json(ApiResult::success(message, ContactReceipt { id: lead.id })),
    ))
}
