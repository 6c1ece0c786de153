//! 自定义提取器：客户端 IP 与请求语言

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;

use crate::{AppState, utils::client_ip};

/// 保存语言偏好的 Cookie 名
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

/// 客户端 IP，见 [`client_ip`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        Ok(ClientIp(client_ip(&parts.headers, remote)))
    }
}

/// 由 Cookie 和 `Accept-Language` 决定的请求语言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLocale(pub String);

impl FromRequestParts<AppState> for RequestLocale {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar.get(LOCALE_COOKIE).map(|c| c.value().to_string());
        let accept = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());

        let settings = state.messages.settings();
        Ok(RequestLocale(settings.resolve(
            None,
            cookie.as_deref(),
            accept,
        )))
    }
}
