use reqwest::header::HeaderMap;
use thiserror::Error;

/// 模型服务调用错误
///
/// 保留状态码和响应头，供限流退避计算使用
#[derive(Debug, Error)]
#[error("模型服务调用失败 (status: {status:?}): {message}")]
pub struct ProviderError {
    pub status: Option<u16>,
    pub headers: Option<HeaderMap>,
    pub message: String,
}

impl ProviderError {
    /// 没有拿到响应的错误（网络、序列化等）
    pub fn request(message: impl Into<String>) -> Self {
        Self {
            status: None,
            headers: None,
            message: message.into(),
        }
    }

    /// 非 2xx 响应
    pub fn http(status: u16, headers: HeaderMap, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            headers: Some(headers),
            message: message.into(),
        }
    }

    /// 是否被限流（HTTP 429）
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429)
    }
}
