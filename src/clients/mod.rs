pub mod llm_client;
pub mod provider_error;
pub mod vision_client;

pub use llm_client::{AnthropicClient, CompletionClient, OpenAiChatClient};
pub use provider_error::ProviderError;
pub use vision_client::{OpenAiVisionClient, VisionClient};
