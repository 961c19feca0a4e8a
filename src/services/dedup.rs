//! 去重与编号

use tracing::debug;

use crate::constants::SIMILARITY_THRESHOLD;
use crate::models::Question;
use crate::utils::text::similarity;

/// 贪心去重：按顺序保留与所有已保留题目相似度都不超过阈值的题目
pub fn deduplicate_questions(questions: Vec<Question>) -> Vec<Question> {
    let mut kept: Vec<Question> = Vec::with_capacity(questions.len());
    for q in questions {
        let duplicate = kept
            .iter()
            .any(|existing| similarity(&existing.question, &q.question) > SIMILARITY_THRESHOLD);
        if duplicate {
            debug!("丢弃重复题目: {}", q);
        } else {
            kept.push(q);
        }
    }
    kept
}

/// 按最终顺序重新编号为 q1..qN
pub fn renumber_questions(questions: &mut [Question]) {
    for (i, q) in questions.iter_mut().enumerate() {
        q.id = format!("q{}", i + 1);
    }
}
