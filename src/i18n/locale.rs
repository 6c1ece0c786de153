//! 语言标识的规范化、协商与路径切换

/// 规范化语言标识：去空白、小写、下划线转连字符
pub fn normalize(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', "-")
}

fn base_language(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// 支持的语言列表及默认语言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    default_locale: String,
    supported: Vec<String>,
}

impl LocaleSettings {
    pub fn new(default_locale: &str, supported: &[String]) -> Self {
        let default_locale = normalize(default_locale);
        let mut supported: Vec<String> = supported.iter().map(|l| normalize(l)).collect();
        if !supported.contains(&default_locale) {
            supported.insert(0, default_locale.clone());
        }
        Self {
            default_locale,
            supported,
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    pub fn is_supported(&self, tag: &str) -> bool {
        let tag = normalize(tag);
        self.supported.iter().any(|l| *l == tag)
    }

    /// 匹配支持的语言：先精确匹配，再按基础语言匹配（`en-us` → `en`，`pt` → `pt-br`）
    pub fn match_locale(&self, tag: &str) -> Option<String> {
        let tag = normalize(tag);
        if tag.is_empty() {
            return None;
        }
        if let Some(exact) = self.supported.iter().find(|l| **l == tag) {
            return Some(exact.clone());
        }
        let base = base_language(&tag);
        self.supported
            .iter()
            .find(|l| l.as_str() == base)
            .or_else(|| self.supported.iter().find(|l| base_language(l) == base))
            .cloned()
    }

    /// 按 `Accept-Language` 头协商语言，遵循 q 值
    pub fn negotiate(&self, accept_language: &str) -> Option<String> {
        let mut candidates: Vec<(String, f32)> = accept_language
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.split(';');
                let tag = pieces.next()?.trim();
                if tag.is_empty() || tag == "*" {
                    return None;
                }
                let q = pieces
                    .filter_map(|p| p.trim().strip_prefix("q="))
                    .find_map(|q| q.trim().parse::<f32>().ok())
                    .unwrap_or(1.0);
                (q > 0.0).then(|| (tag.to_string(), q))
            })
            .collect();

        // 稳定排序，q 值相同时保持原有顺序
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates
            .iter()
            .find_map(|(tag, _)| self.match_locale(tag))
    }

    /// 依次按路径段、Cookie、`Accept-Language` 决定语言，最后使用默认语言
    pub fn resolve(
        &self,
        path_segment: Option<&str>,
        cookie: Option<&str>,
        accept_language: Option<&str>,
    ) -> String {
        path_segment
            .filter(|s| self.is_supported(s))
            .map(normalize)
            .or_else(|| cookie.and_then(|c| self.match_locale(c)))
            .or_else(|| accept_language.and_then(|a| self.negotiate(a)))
            .unwrap_or_else(|| self.default_locale.clone())
    }

    /// 替换或插入路径中的语言段，保留查询字符串和锚点
    pub fn switch_locale_path(&self, path: &str, target: &str) -> String {
        let target = normalize(target);
        let split_at = path.find(['?', '#']).unwrap_or(path.len());
        let (path_part, suffix) = path.split_at(split_at);

        let mut segments: Vec<&str> = path_part.split('/').filter(|s| !s.is_empty()).collect();
        if segments.first().is_some_and(|s| self.is_supported(s)) {
            segments.remove(0);
        }

        let mut result = format!("/{}", target);
        for segment in segments {
            result.push('/');
            result.push_str(segment);
        }
        if path_part.len() > 1 && path_part.ends_with('/') {
            result.push('/');
        }
        result.push_str(suffix);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LocaleSettings {
        LocaleSettings::new("en", &["en".into(), "es".into(), "pt-br".into()])
    }

    #[test]
    fn normalizes_case_and_separator() {
        assert_eq!(normalize(" pt_BR "), "pt-br");
    }

    #[test]
    fn default_locale_is_always_supported() {
        let s = LocaleSettings::new("fr", &["en".into()]);
        assert!(s.is_supported("fr"));
        assert_eq!(s.default_locale(), "fr");
    }

    #[test]
    fn matches_by_base_language() {
        let s = settings();
        assert_eq!(s.match_locale("en-US").as_deref(), Some("en"));
        assert_eq!(s.match_locale("pt").as_deref(), Some("pt-br"));
        assert_eq!(s.match_locale("de"), None);
    }

    #[test]
    fn negotiation_honours_quality() {
        let s = settings();
        assert_eq!(
            s.negotiate("de-DE,de;q=0.9,es;q=0.5,en;q=0.7").as_deref(),
            Some("en")
        );
        assert_eq!(s.negotiate("es;q=0, en;q=0.1").as_deref(), Some("en"));
        assert_eq!(s.negotiate("*"), None);
    }

    #[test]
    fn resolution_order_is_path_cookie_header_default() {
        let s = settings();
        assert_eq!(s.resolve(Some("es"), Some("en"), Some("en")), "es");
        assert_eq!(s.resolve(Some("blog"), Some("es"), Some("en")), "es");
        assert_eq!(s.resolve(None, Some("xx"), Some("pt-PT")), "pt-br");
        assert_eq!(s.resolve(None, None, None), "en");
    }

    #[test]
    fn switch_replaces_existing_locale() {
        let s = settings();
        assert_eq!(s.switch_locale_path("/en/blog/hello", "es"), "/es/blog/hello");
        assert_eq!(s.switch_locale_path("/en", "es"), "/es");
    }

    #[test]
    fn switch_inserts_missing_locale_and_keeps_query() {
        let s = settings();
        assert_eq!(s.switch_locale_path("/blog?page=2", "es"), "/es/blog?page=2");
        assert_eq!(s.switch_locale_path("/", "pt-BR"), "/pt-br");
        assert_eq!(s.switch_locale_path("", "es"), "/es");
        assert_eq!(s.switch_locale_path("/es/contact/", "en"), "/en/contact/");
    }
}
