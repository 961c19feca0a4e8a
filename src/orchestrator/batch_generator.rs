//! 分批出题编排器 - 编排层
//!
//! ## 状态流转
//!
//! ```text
//! PLANNING → BATCHING(0..n) → SHORTFALL_RETRY? → DEDUPLICATE → RENUMBER → DONE
//! ```
//!
//! - 批次严格顺序执行，每批都带上之前所有题目的原文防止重复
//! - 只有一批时跳过去重
//! - 数量不足时补一次，补齐失败只记日志
//! - 普通批次失败直接中止整个请求

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::constants::QUESTIONS_PER_BATCH;
use crate::error::AppResult;
use crate::models::{GenerationBatch, GenerationRequest, Question};
use crate::services::{deduplicate_questions, renumber_questions, GenerationService, QuestionGenerator};
use crate::utils::logging::{log_batch_complete, log_batch_start};

/// 分批出题编排器
pub struct BatchTestGenerator {
    generator: Arc<dyn QuestionGenerator>,
}

impl BatchTestGenerator {
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self { generator }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(GenerationService::from_config(config)))
    }

    /// 批次总数
    pub fn total_batches(questions_count: usize) -> usize {
        questions_count.div_ceil(QUESTIONS_PER_BATCH)
    }

    /// 生成整套题目，不关心进度
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<Vec<Question>> {
        self.generate_in_batches(request, |_, _| {}).await
    }

    /// 生成整套题目
    ///
    /// `on_progress(已完成批次, 批次总数)` 在每批开始前调用一次，最后以 `(n, n)` 结束
    pub async fn generate_in_batches<P>(
        &self,
        request: &GenerationRequest,
        mut on_progress: P,
    ) -> AppResult<Vec<Question>>
    where
        P: FnMut(usize, usize) + Send,
    {
        request.validate()?;

        let requested = request.questions_count;
        let total_batches = Self::total_batches(requested);
        info!(
            "📝 开始出题: {} 题，模型 {}，难度 {}，语言 {}，格式 {}，分 {} 批",
            requested,
            request.model.as_str(),
            request.difficulty.as_str(),
            request.language.as_str(),
            request.exam_format.unwrap_or_default().as_str(),
            total_batches
        );

        if total_batches <= 1 {
            on_progress(0, 1);
            log_batch_start(1, 1, requested, 0);
            let mut questions = self
                .generator
                .generate(request, &GenerationBatch::single(requested, Vec::new()))
                .await?;
            log_batch_complete(1, questions.len(), requested);
            on_progress(1, 1);
            questions.truncate(requested);
            renumber_questions(&mut questions);
            return Ok(questions);
        }

        let mut all_questions: Vec<Question> = Vec::with_capacity(requested);

        for batch_index in 0..total_batches {
            let remaining = requested.saturating_sub(all_questions.len());
            if remaining == 0 {
                break;
            }
            let batch_count = remaining.min(QUESTIONS_PER_BATCH);

            on_progress(batch_index, total_batches);
            log_batch_start(batch_index + 1, total_batches, batch_count, all_questions.len());

            let batch = GenerationBatch {
                batch_index,
                total_batches,
                questions_count: batch_count,
                previous_questions: question_texts(&all_questions),
            };
            let questions = self.generator.generate(request, &batch).await?;
            log_batch_complete(batch_index + 1, questions.len(), batch_count);

            all_questions.extend(questions);
        }

        let shortfall = requested.saturating_sub(all_questions.len());
        if shortfall > 0 {
            info!("⚠️ 还差 {} 题，补齐一次", shortfall);
            let batch = GenerationBatch::single(shortfall, question_texts(&all_questions));
            match self.generator.generate(request, &batch).await {
                Ok(extra) => {
                    info!("✓ 补齐收到 {} 题", extra.len());
                    all_questions.extend(extra);
                }
                Err(e) => warn!("⚠️ 补齐失败，接受较少的题目: {}", e),
            }
        }

        on_progress(total_batches, total_batches);

        let before = all_questions.len();
        let mut questions = deduplicate_questions(all_questions);
        if questions.len() < before {
            info!("🔁 去重移除 {} 题", before - questions.len());
        }
        questions.truncate(requested);
        renumber_questions(&mut questions);

        info!("✅ 出题完成: {}/{} 题", questions.len(), requested);
        Ok(questions)
    }
}

fn question_texts(questions: &[Question]) -> Vec<String> {
    questions.iter().map(|q| q.question.clone()).collect()
}
