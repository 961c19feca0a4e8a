//! 限流退避计算
//!
//! 纯函数：只看错误里携带的响应头，不做任何等待

use regex::Regex;
use reqwest::header::HeaderMap;
use std::sync::OnceLock;
use std::time::Duration;

use crate::clients::ProviderError;

const REMAINING_TOKENS: &str = "x-ratelimit-remaining-tokens";
const RESET_TOKENS: &str = "x-ratelimit-reset-tokens";
const RETRY_AFTER_MS: &str = "retry-after-ms";

/// 缺少可用信息时的默认等待
pub const DEFAULT_WAIT: Duration = Duration::from_millis(60_000);
const RESET_HEADROOM_MS: u64 = 1_000;
const RETRY_AFTER_HEADROOM_MS: u64 = 500;

fn reset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:(\d+)m)?(\d+)(?:\.(\d+))?s").expect("静态正则"))
}

/// 根据错误计算下一次重试前的等待时间
pub fn retry_delay(err: &ProviderError) -> Duration {
    match &err.headers {
        Some(headers) => delay_from_headers(headers),
        None => DEFAULT_WAIT,
    }
}

/// 根据响应头计算等待时间
///
/// 1. token 额度耗尽：等到 reset 时间 + 1s
/// 2. 有 `retry-after-ms`：等待该值 + 0.5s
/// 3. 其他情况等 60s
pub fn delay_from_headers(headers: &HeaderMap) -> Duration {
    if header_str(headers, REMAINING_TOKENS) == Some("0") {
        return header_str(headers, RESET_TOKENS)
            .and_then(parse_reset_ms)
            .and_then(|ms| ms.checked_add(RESET_HEADROOM_MS))
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_WAIT);
    }

    if let Some(ms) = header_str(headers, RETRY_AFTER_MS).and_then(|v| v.trim().parse::<u64>().ok()) {
        return ms
            .checked_add(RETRY_AFTER_HEADROOM_MS)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_WAIT);
    }

    DEFAULT_WAIT
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// 解析 `1m19.648s` / `59.848s` 形式的时长，返回毫秒
///
/// 小数部分只取到毫秒精度，溢出 u64 时返回 None
pub fn parse_reset_ms(value: &str) -> Option<u64> {
    let caps = reset_re().captures(value)?;
    let minutes: u64 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let seconds: u64 = caps.get(2)?.as_str().parse().ok()?;
    let millis: u64 = match caps.get(3) {
        Some(frac) => {
            let digits: String = frac.as_str().chars().chain("000".chars()).take(3).collect();
            digits.parse().ok()?
        }
        None => 0,
    };
    minutes
        .checked_mul(60_000)?
        .checked_add(seconds.checked_mul(1_000)?)?
        .checked_add(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn rate_limited(pairs: &[(&'static str, &'static str)]) -> ProviderError {
        ProviderError::http(429, headers(pairs), "rate limited")
    }

    #[test]
    fn test_token_reset_with_minutes() {
        let err = rate_limited(&[
            ("x-ratelimit-remaining-tokens", "0"),
            ("x-ratelimit-reset-tokens", "1m19.648s"),
        ]);
        assert_eq!(retry_delay(&err), Duration::from_millis(80_648));
    }

    #[test]
    fn test_token_reset_seconds_only() {
        let err = rate_limited(&[
            ("x-ratelimit-remaining-tokens", "0"),
            ("x-ratelimit-reset-tokens", "59.848s"),
        ]);
        assert_eq!(retry_delay(&err), Duration::from_millis(60_848));
    }

    #[test]
    fn test_tokens_exhausted_without_reset_header() {
        let err = rate_limited(&[("x-ratelimit-remaining-tokens", "0")]);
        assert_eq!(retry_delay(&err), DEFAULT_WAIT);
    }

    #[test]
    fn test_retry_after_ms() {
        let err = rate_limited(&[("retry-after-ms", "2500")]);
        assert_eq!(retry_delay(&err), Duration::from_millis(3_000));
    }

    #[test]
    fn test_remaining_tokens_nonzero_falls_through_to_retry_after() {
        let err = rate_limited(&[
            ("x-ratelimit-remaining-tokens", "1200"),
            ("x-ratelimit-reset-tokens", "1m0s"),
            ("retry-after-ms", "100"),
        ]);
        assert_eq!(retry_delay(&err), Duration::from_millis(600));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(retry_delay(&rate_limited(&[])), DEFAULT_WAIT);
        assert_eq!(retry_delay(&ProviderError::request("timeout")), DEFAULT_WAIT);
        assert_eq!(retry_delay(&rate_limited(&[("retry-after-ms", "soon")])), DEFAULT_WAIT);
    }

    #[test]
    fn test_parse_reset_ms() {
        assert_eq!(parse_reset_ms("2s"), Some(2_000));
        assert_eq!(parse_reset_ms("0.5s"), Some(500));
        assert_eq!(parse_reset_ms("3m0.1234s"), Some(180_123));
        assert_eq!(parse_reset_ms("soon"), None);
    }

    #[test]
    fn test_overflowing_values_fall_back_to_default() {
        assert_eq!(parse_reset_ms("999999999999999999m1s"), None);
        assert_eq!(parse_reset_ms("18446744073709551615s"), None);

        let err = rate_limited(&[("retry-after-ms", "18446744073709551615")]);
        assert_eq!(retry_delay(&err), DEFAULT_WAIT);

        let err = rate_limited(&[
            ("x-ratelimit-remaining-tokens", "0"),
            ("x-ratelimit-reset-tokens", "999999999999999999m1s"),
        ]);
        assert_eq!(retry_delay(&err), DEFAULT_WAIT);

        // 最后一步 +1s 溢出
        let err = rate_limited(&[
            ("x-ratelimit-remaining-tokens", "0"),
            ("x-ratelimit-reset-tokens", "307445734561825m51.615s"),
        ]);
        assert_eq!(retry_delay(&err), DEFAULT_WAIT);
    }
}
