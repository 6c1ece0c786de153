use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    AppState,
    middleware::{RateLimiter, log_errors, rate_limit},
    routes,
};

// 联系表单路由，单独挂载限流中间件
pub fn contact_routes(rate_limiter: Arc<RateLimiter>) -> Router<AppState> {
    Router::new()
        .route("/contact", post(routes::contact::submit))
        .route_layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
}

// 内容查询路由
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/{locale}/content", get(routes::content::list_content))
        .route("/{locale}/content/{slug}", get(routes::content::get_content))
        .route("/{locale}/tags", get(routes::content::list_tags))
}

// 多语言相关路由
pub fn i18n_routes() -> Router<AppState> {
    Router::new()
        .route("/{locale}/messages", get(routes::i18n::get_messages))
        .route("/{locale}/metadata/{page}", get(routes::i18n::page_metadata))
        .route("/locale/switch", get(routes::i18n::switch_locale))
        .route("/locale/detect", get(routes::i18n::detect_locale))
}

// 创建主路由
pub fn create_router(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    let api = Router::new()
        .merge(contact_routes(rate_limiter))
        .merge(content_routes())
        .merge(i18n_routes());

    // 根路径不能 nest，改为 merge
    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(base, api)
    };

    let router = router
        .route("/health", get(routes::health))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(TraceLayer::new_for_http());

    // 开发环境允许任意来源
    let router = if state.config.cors_allow_any {
        tracing::debug!("Adding permissive CORS layer");
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}
