//! 记忆层：会话信念状态（valence / 测试信念 / 轮次）与对话消息

pub mod belief;
pub mod conversation;

pub use belief::{Affect, BeliefState};
pub use conversation::{Message, Role};
