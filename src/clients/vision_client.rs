//! 视觉模型客户端
//!
//! 直接用 reqwest 发送请求，以便在 429 时拿到限流相关的响应头；
//! 请求体沿用 `async-openai` 的类型构建。

use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
    ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::clients::ProviderError;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 视觉 OCR 能力
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// 发送一条文字说明和若干页面图片，返回模型的原始文本
    async fn extract_text(&self, instruction: &str, images: &[String]) -> Result<String, ProviderError>;
}

/// OpenAI 兼容的视觉客户端
pub struct OpenAiVisionClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiVisionClient {
    /// 创建视觉客户端，未配置 OpenAI key 时返回错误
    pub fn new(config: &Config) -> AppResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| AppError::missing_api_key("OpenAI"))?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            api_base_url: config.openai_api_base_url.trim_end_matches('/').to_string(),
            model_name: config.openai_model_name.clone(),
        })
    }

    fn build_request_body(
        &self,
        instruction: &str,
        images: &[String],
    ) -> Result<async_openai::types::chat::CreateChatCompletionRequest, ProviderError> {
        let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = Vec::new();

        content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
            ChatCompletionRequestMessageContentPartText {
                text: instruction.to_string(),
            },
        ));

        for url in images.iter() {
            content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: url.clone(),
                        detail: Some(ImageDetail::High),
                    },
                },
            ));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()
            .map_err(|e| ProviderError::request(e.to_string()))?;

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(0.0)
            .max_tokens(16384u32)
            .build()
            .map_err(|e| ProviderError::request(e.to_string()))
    }
}

#[async_trait]
impl VisionClient for OpenAiVisionClient {
    async fn extract_text(&self, instruction: &str, images: &[String]) -> Result<String, ProviderError> {
        debug!("调用视觉模型 {}，包含 {} 张图片", self.model_name, images.len());

        let body = self.build_request_body(instruction, images)?;

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError {
                status: e.status().map(|s| s.as_u16()),
                headers: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::http(status.as_u16(), headers, text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::request(format!("无法解析视觉模型响应: {}", e)))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_else(|| "[]".to_string()))
    }
}
