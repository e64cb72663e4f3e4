//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；LlmResponder 的默认真实后端。
//! 每次完成后把本次 token 用量写入 tracing（debug）。

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// 未配置 key 时的占位值；请求会被端点拒绝，由 LlmResponder 报告为后端失败
const PLACEHOLDER_KEY: &str = "sk-placeholder";

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    /// api_key 缺省时读 OPENAI_API_KEY
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| PLACEHOLDER_KEY.to_string());

        let mut config = OpenAIConfig::new().with_api_key(key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Message -> 请求消息；LlmResponder 只发 system + user
fn to_request_message(m: &Message) -> Result<ChatCompletionRequestMessage, String> {
    let built = match m.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(m.content.as_str())
            .build()
            .map(ChatCompletionRequestMessage::System),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(m.content.as_str())
            .build()
            .map(ChatCompletionRequestMessage::User),
    };
    built.map_err(|e| format!("invalid {:?} message: {}", m.role, e))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| e.to_string())?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion finished"
            );
        }

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_roles() {
        let system = to_request_message(&Message::system("meta=0.35")).unwrap();
        let user = to_request_message(&Message::user("hi")).unwrap();
        assert!(matches!(system, ChatCompletionRequestMessage::System(_)));
        assert!(matches!(user, ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_new_with_base_url() {
        let client = OpenAiClient::new(Some("http://localhost:9"), "test-model", Some("sk-test"));
        assert_eq!(client.model(), "test-model");
    }
}
