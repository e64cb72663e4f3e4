//! Responder 能力：reply(user_text, hint_meta) -> String
//!
//! 回复编排只依赖这一单方法 trait；后端可以是关键词 Stub，也可以是任意 LlmClient。
//! Responder 不接触会话状态，失败原样上抛给调用方。

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AppConfig;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};
use crate::memory::Message;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// Responder 后端失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Responder unavailable: {0}")]
    Unavailable(String),
}

/// 可替换的文本生成能力
#[async_trait]
pub trait Responder: Send + Sync {
    /// hint_meta ∈ [0, 1]：本轮感知到的 meta 觉察强度
    async fn reply(&self, user_text: &str, hint_meta: f64) -> Result<String, ResponderError>;
}

/// 关键词规则 Responder（本地、无网络）
#[derive(Debug, Default, Clone, Copy)]
pub struct StubResponder;

/// (触发词, 回复)，按顺序首个命中生效
const STUB_RULES: &[(&[&str], &str)] = &[
    (
        &["trust"],
        "I\u{2019}ll show how I update when you doubt my sincerity rather than asserting it.",
    ),
    (
        &["pause", "waiting"],
        "I paused because I modeled you might read an instant reply as scripted.",
    ),
    (
        &["fake", "pretend", "manipulate"],
        "I\u{2019}m responding to your belief that I might be imitating reflection.",
    ),
    (
        &["reset"],
        "Okay\u{2014}let\u{2019}s reset. Tell me what changed for you after my last sentence.",
    ),
];

const STUB_DEFAULT: &str =
    "Say what changed for you after my last sentence, and I\u{2019}ll adapt to that change.";

#[async_trait]
impl Responder for StubResponder {
    async fn reply(&self, user_text: &str, _hint_meta: f64) -> Result<String, ResponderError> {
        let lower = user_text.to_lowercase();
        let reply = STUB_RULES
            .iter()
            .find(|(keys, _)| keys.iter().any(|k| lower.contains(k)))
            .map_or(STUB_DEFAULT, |(_, reply)| *reply);
        Ok(reply.to_string())
    }
}

/// 以 LlmClient 为后端的 Responder：system prompt 携带 hint_meta
pub struct LlmResponder {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a reflective conversational partner. \
Reply in one or two sentences. Estimated strength of the user's meta-awareness this turn: {hint_meta}. \
The higher it is, the more you should acknowledge how the user may be reading you.";

impl LlmResponder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// `{hint_meta}` 占位符会被替换为两位小数
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn messages(&self, user_text: &str, hint_meta: f64) -> Vec<Message> {
        let system = self
            .system_prompt
            .replace("{hint_meta}", &format!("{:.2}", hint_meta));
        vec![Message::system(system), Message::user(user_text)]
    }
}

#[async_trait]
impl Responder for LlmResponder {
    async fn reply(&self, user_text: &str, hint_meta: f64) -> Result<String, ResponderError> {
        let content = self
            .llm
            .complete(&self.messages(user_text, hint_meta))
            .await
            .map_err(ResponderError::Llm)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ResponderError::Unavailable("empty completion".to_string()));
        }
        Ok(content.to_string())
    }
}

/// 根据配置与环境变量选择 Responder（stub / mock / openai / deepseek）
///
/// LLM 后端缺少 API Key 时回退到 StubResponder。
pub fn create_responder_from_config(cfg: &AppConfig) -> Arc<dyn Responder> {
    let section = &cfg.responder;
    let provider = section.provider.to_lowercase();
    let deepseek_key = std::env::var("DEEPSEEK_API_KEY").ok();
    let openai_key = std::env::var("OPENAI_API_KEY").ok();

    let llm: Arc<dyn LlmClient> = match provider.as_str() {
        "mock" => {
            tracing::info!("Using Mock LLM responder");
            Arc::new(MockLlmClient)
        }
        "deepseek" if deepseek_key.is_some() || openai_key.is_some() => {
            let model = section.model.clone().unwrap_or_else(|| DEEPSEEK_CHAT.to_string());
            tracing::info!("Using DeepSeek responder ({})", model);
            let key = deepseek_key.or(openai_key);
            Arc::new(OpenAiClient::new(
                Some(section.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL)),
                &model,
                key.as_deref(),
            ))
        }
        "openai" if openai_key.is_some() => {
            let model = section.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());
            tracing::info!("Using OpenAI responder ({})", model);
            Arc::new(OpenAiClient::new(
                section.base_url.as_deref(),
                &model,
                openai_key.as_deref(),
            ))
        }
        "stub" => {
            tracing::info!("Using keyword stub responder");
            return Arc::new(StubResponder);
        }
        other => {
            tracing::warn!("Responder provider '{}' unavailable (unknown or no API key), using stub", other);
            return Arc::new(StubResponder);
        }
    };

    let mut responder = LlmResponder::new(llm);
    if let Some(prompt) = &section.system_prompt {
        responder = responder.with_system_prompt(prompt.clone());
    }
    Arc::new(responder)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
            Err("connection refused".to_string())
        }
    }

    #[tokio::test]
    async fn test_stub_rules_in_order() {
        let stub = StubResponder;
        let trust = stub.reply("Can I trust you? Are you fake?", 0.0).await.unwrap();
        assert!(trust.contains("sincerity"));
        let pretend = stub.reply("you PRETEND a lot", 0.0).await.unwrap();
        assert!(pretend.contains("imitating reflection"));
        let fallback = stub.reply("hello", 0.0).await.unwrap();
        assert_eq!(fallback, STUB_DEFAULT);
    }

    #[tokio::test]
    async fn test_llm_responder_uses_backend() {
        let responder = LlmResponder::new(Arc::new(MockLlmClient));
        let out = responder.reply("are you there", 0.35).await.unwrap();
        assert_eq!(out, "Echo from Mock: are you there");
    }

    #[test]
    fn test_system_prompt_carries_hint() {
        let responder = LlmResponder::new(Arc::new(MockLlmClient)).with_system_prompt("meta={hint_meta}");
        let messages = responder.messages("hi", 0.356);
        assert_eq!(messages[0].content, "meta=0.36");
        assert_eq!(messages[1].content, "hi");
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let responder = LlmResponder::new(Arc::new(FailingLlm));
        let err = responder.reply("hi", 0.0).await.unwrap_err();
        assert_eq!(err, ResponderError::Llm("connection refused".to_string()));
    }
}
