use serde::Serialize;

use crate::utils::iso_timestamp;

/// 成功响应体，`data` 中的字段会平铺到顶层
#[derive(Debug, Serialize)]
pub struct ApiResult<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub status: u16,
    pub timestamp: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiResult<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            status: 200,
            timestamp: iso_timestamp(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Receipt {
        id: String,
    }

    #[test]
    fn data_fields_are_flattened() {
        let result = ApiResult::success(
            "ok",
            Receipt {
                id: "abc".into(),
            },
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["status"], 200);
        assert_eq!(value["id"], "abc");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
