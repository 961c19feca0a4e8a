use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_QUESTIONS;
use crate::error::{AppError, AppResult, ConfigError};

/// 难度（对应布鲁姆认知层级）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// 出题语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }
}

/// 试卷格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExamFormat {
    /// 全部四选一
    #[serde(rename = "mc_4")]
    Mc4,
    /// 全部五选一
    #[serde(rename = "mc_5")]
    Mc5,
    /// 选择 + 判断 + 简答
    #[serde(rename = "mixed")]
    Mixed,
    /// 选择 + 判断 + 简答 + 填空
    #[default]
    #[serde(rename = "mixed_fill")]
    MixedFill,
}

impl ExamFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExamFormat::Mc4 => "mc_4",
            ExamFormat::Mc5 => "mc_5",
            ExamFormat::Mixed => "mixed",
            ExamFormat::MixedFill => "mixed_fill",
        }
    }
}

/// 出题模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    /// OpenAI chat completion 接口
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    /// Anthropic messages 接口
    #[serde(rename = "claude")]
    Claude,
}

static MODEL_KEYS: phf::Map<&'static str, ModelId> = phf_map! {
    "gpt-4o-mini" => ModelId::Gpt4oMini,
    "claude" => ModelId::Claude,
};

impl ModelId {
    /// 从线上 key 解析模型
    pub fn parse(key: &str) -> AppResult<Self> {
        MODEL_KEYS.get(key.trim()).copied().ok_or_else(|| {
            ConfigError::UnknownModel {
                model: key.to_string(),
            }
            .into()
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Claude => "claude",
        }
    }

    /// 服务商名称（用于日志和错误信息）
    pub fn provider(self) -> &'static str {
        match self {
            ModelId::Gpt4oMini => "OpenAI",
            ModelId::Claude => "Anthropic",
        }
    }
}

/// 一次完整的出题请求
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// 各个来源的文本，与 `pdf_name` 中的名称一一对应
    pub texts: Vec<String>,
    pub difficulty: Difficulty,
    pub language: Language,
    pub model: ModelId,
    pub questions_count: usize,
    /// 以 `", "` 分隔的来源名称
    pub pdf_name: String,
    pub exam_format: Option<ExamFormat>,
    /// 真题样例，只作为风格参考
    pub exam_context: Option<String>,
    /// 自定义要求
    pub instructions: Option<String>,
}

impl GenerationRequest {
    /// 来源文本的最小长度
    pub const MIN_TEXT_CHARS: usize = 10;

    /// 在任何模型调用之前校验请求
    pub fn validate(&self) -> AppResult<()> {
        if self.texts.is_empty() {
            return Err(AppError::invalid_request("至少需要一个来源文本"));
        }
        if let Some(index) = self
            .texts
            .iter()
            .position(|t| t.chars().count() < Self::MIN_TEXT_CHARS)
        {
            return Err(AppError::invalid_request(format!(
                "第 {} 个来源文本少于 {} 个字符",
                index + 1,
                Self::MIN_TEXT_CHARS
            )));
        }
        if self.questions_count == 0 || self.questions_count > MAX_QUESTIONS {
            return Err(AppError::invalid_request(format!(
                "题目数量必须在 1 到 {} 之间，实际为 {}",
                MAX_QUESTIONS, self.questions_count
            )));
        }
        Ok(())
    }

    pub fn exam_format(&self) -> ExamFormat {
        self.exam_format.unwrap_or_default()
    }
}

/// 一个生成批次
///
/// 每次调用对模型来说都是无状态的，连续性只靠 `previous_questions`
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationBatch {
    pub batch_index: usize,
    pub total_batches: usize,
    pub questions_count: usize,
    /// 之前所有批次题目的原文
    pub previous_questions: Vec<String>,
}

impl GenerationBatch {
    /// 单批（或补齐调用）
    pub fn single(questions_count: usize, previous_questions: Vec<String>) -> Self {
        Self {
            batch_index: 0,
            total_batches: 1,
            questions_count,
            previous_questions,
        }
    }
}
