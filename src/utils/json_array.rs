//! 宽松解析模型返回中的 JSON 数组
//!
//! 模型经常在数组前后加说明文字或代码块，这里取第一个 `[` 到最后一个 `]`
//! 之间的子串；严格解析失败后，去掉 `]` 前的多余逗号再试一次。

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use crate::error::LlmError;

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*\]").expect("静态正则"))
}

/// 取出原始响应中的数组子串
pub fn extract_array_slice(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// 从模型响应中解析 JSON 数组
pub fn parse_json_array<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, LlmError> {
    let slice = extract_array_slice(raw).ok_or(LlmError::NoJsonArray)?;

    match serde_json::from_str::<Vec<T>>(slice) {
        Ok(items) => Ok(items),
        Err(first_err) => {
            let cleaned = trailing_comma_re().replace_all(slice, "]");
            serde_json::from_str::<Vec<T>>(&cleaned).map_err(|_| LlmError::MalformedJson {
                source: first_err,
            })
        }
    }
}
