/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:contact:";

/// 生成限流计数键
pub fn rate_limit_key(client_ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, client_ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_by_ip() {
        assert_eq!(rate_limit_key("1.2.3.4"), "rate_limit:contact:1.2.3.4");
    }
}
