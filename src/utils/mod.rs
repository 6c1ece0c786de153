use std::net::SocketAddr;

use axum::http::HeaderMap;
use chrono::{SecondsFormat, Utc};

/// ISO 8601 时间戳（毫秒精度，UTC）
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// 获取客户端 IP：优先代理头，其次连接地址，最后 "unknown"
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    header_str(headers, "cf-connecting-ip")
        .or_else(|| header_str(headers, "x-real-ip"))
        .or_else(|| {
            header_str(headers, "x-forwarded-for")
                .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        })
        .map(str::to_string)
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "user-agent").map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn cloudflare_header_wins() {
        let h = headers(&[
            ("cf-connecting-ip", "1.1.1.1"),
            ("x-real-ip", "2.2.2.2"),
            ("x-forwarded-for", "3.3.3.3"),
        ]);
        assert_eq!(client_ip(&h, None), "1.1.1.1");
    }

    #[test]
    fn forwarded_for_uses_first_non_empty_hop() {
        let h = headers(&[("x-forwarded-for", " , 10.0.0.1, 10.0.0.2")]);
        assert_eq!(client_ip(&h, None), "10.0.0.1");
    }

    #[test]
    fn falls_back_to_socket_then_unknown() {
        let addr: SocketAddr = "192.168.1.9:4000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(addr)), "192.168.1.9");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn timestamp_is_utc_iso() {
        let ts = iso_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
