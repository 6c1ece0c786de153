use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 单个语言的翻译资源（嵌套 JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Messages(Value);

impl Default for Messages {
    fn default() -> Self {
        Messages(Value::Object(Default::default()))
    }
}

impl Messages {
    pub fn new(value: Value) -> Self {
        Messages(value)
    }

    /// 按点分隔的键查找，只有叶子为字符串时返回
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.node(key).and_then(Value::as_str)
    }

    /// 按点分隔的键查找任意节点
    pub fn node(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.0, |node, part| node.as_object()?.get(part))
    }

    /// 取出某个命名空间下的子树
    pub fn namespace(&self, key: &str) -> Option<Messages> {
        self.node(key)
            .filter(|v| v.is_object())
            .map(|v| Messages(v.clone()))
    }
}

/// 替换 `{name}` 占位符；未提供的占位符保持原样
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() || !template.contains('{') {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = after[..end].trim();
                match params.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[start..start + end + 2]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
