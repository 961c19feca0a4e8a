//! 出题服务 - 业务能力层
//!
//! 单批次出题：构建提示词 → 调用模型 → 宽松解析 → 校验

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::clients::{AnthropicClient, CompletionClient, OpenAiChatClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::models::{GenerationBatch, GenerationRequest, ModelId, Question};
use crate::services::prompt_builder::{build_test_prompt, PromptConfig};
use crate::services::question_validator::validate_questions;
use crate::utils::logging::truncate_text;
use crate::utils::parse_json_array;

/// 单批次出题能力
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// 生成一批题目，任何失败都会让这一批整体失败
    async fn generate(&self, request: &GenerationRequest, batch: &GenerationBatch) -> AppResult<Vec<Question>>;
}

/// 基于模型服务的出题实现
pub struct GenerationService {
    openai: Option<Box<dyn CompletionClient>>,
    anthropic: Option<Box<dyn CompletionClient>>,
}

impl GenerationService {
    /// 按配置创建，未配置 key 的服务商在被选中时报错
    pub fn from_config(config: &Config) -> Self {
        Self {
            openai: OpenAiChatClient::from_config(config).map(|c| Box::new(c) as Box<dyn CompletionClient>),
            anthropic: AnthropicClient::from_config(config).map(|c| Box::new(c) as Box<dyn CompletionClient>),
        }
    }

    /// 直接指定两个服务商的客户端
    pub fn with_clients(
        openai: Option<Box<dyn CompletionClient>>,
        anthropic: Option<Box<dyn CompletionClient>>,
    ) -> Self {
        Self { openai, anthropic }
    }

    fn client_for(&self, model: ModelId) -> AppResult<&dyn CompletionClient> {
        let client = match model {
            ModelId::Gpt4oMini => self.openai.as_deref(),
            ModelId::Claude => self.anthropic.as_deref(),
        };
        client.ok_or_else(|| AppError::missing_api_key(model.provider()))
    }
}

#[async_trait]
impl QuestionGenerator for GenerationService {
    async fn generate(&self, request: &GenerationRequest, batch: &GenerationBatch) -> AppResult<Vec<Question>> {
        let client = self.client_for(request.model)?;

        let prompt = build_test_prompt(&PromptConfig::for_batch(request, batch));
        debug!(
            "批次 {}/{} 提示词长度: {} 字符",
            batch.batch_index + 1,
            batch.total_batches,
            prompt.len()
        );
        debug!("提示词预览: {}", truncate_text(&prompt, 200));

        let raw = client.complete(&prompt).await?;
        debug!("{} 响应预览: {}", client.provider(), truncate_text(&raw, 200));
        if raw.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: client.provider().to_string(),
            }
            .into());
        }

        let items: Vec<Value> = parse_json_array(&raw)?;
        validate_questions(items)
    }
}
