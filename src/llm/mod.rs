//! LLM 层：Responder 能力与 LLM 客户端实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod mock;
pub mod openai;
pub mod responder;
pub mod traits;

pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use responder::{
    create_responder_from_config, LlmResponder, Responder, ResponderError, StubResponder,
};
pub use traits::LlmClient;
