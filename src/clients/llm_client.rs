/// LLM API 客户端
///
/// 封装出题调用：OpenAI chat completion 与 Anthropic messages 两种接口
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};

/// 文本补全能力
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// 服务商名称
    fn provider(&self) -> &str;

    /// 发送单条用户消息，返回模型的原始文本（可能为空）
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

/// OpenAI 客户端
pub struct OpenAiChatClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiChatClient {
    /// 创建新的 OpenAI 客户端，未配置 key 时返回 `None`
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.openai_api_key.as_deref()?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.openai_api_base_url);

        Some(Self {
            client: Client::with_config(openai_config),
            model_name: config.openai_model_name.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiChatClient {
    fn provider(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, prompt: &str) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", prompt.len());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| AppError::llm_request_failed(self.provider(), e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(0.7)
            .max_tokens(8192u32)
            .build()
            .map_err(|e| AppError::llm_request_failed(self.provider(), e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_request_failed(self.provider(), e)
        })?;

        debug!("LLM API 调用成功");

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

/// Anthropic 客户端
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<MessageParam<'a>>,
}

#[derive(Serialize)]
struct MessageParam<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    const API_VERSION: &'static str = "2023-06-01";

    /// 创建新的 Anthropic 客户端，未配置 key 时返回 `None`
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.anthropic_api_key.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            api_key,
            api_base_url: config.anthropic_api_base_url.trim_end_matches('/').to_string(),
            model_name: config.anthropic_model_name.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    fn provider(&self) -> &str {
        "Anthropic"
    }

    async fn complete(&self, prompt: &str) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);

        let body = MessagesRequest {
            model: &self.model_name,
            max_tokens: 8192,
            messages: vec![MessageParam {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/messages", self.api_base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                AppError::llm_request_failed(self.provider(), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::BadStatus {
                provider: self.provider().to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::llm_request_failed(self.provider(), e))?;

        debug!("LLM API 调用成功");

        Ok(parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .unwrap_or_default())
    }
}
