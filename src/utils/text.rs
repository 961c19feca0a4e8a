//! 文本规范化与相似度

use std::collections::HashSet;

/// 规范化文本用于比较
///
/// 转小写，去掉字母数字和空白以外的字符，压缩连续空白
pub fn normalize_text(s: &str) -> String {
    let kept: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 基于词集合的 Jaccard 相似度，取值 [0, 1]
///
/// 两边规范化后都为空视为相同（1），只有一边为空时为 0
pub fn similarity(a: &str, b: &str) -> f64 {
    let na = normalize_text(a);
    let nb = normalize_text(b);
    match (na.is_empty(), nb.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }
    let words_a: HashSet<&str> = na.split_whitespace().collect();
    let words_b: HashSet<&str> = nb.split_whitespace().collect();

    let union = words_a.union(&words_b).count();
    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

/// 按字符截断（不追加省略号）
pub fn take_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
