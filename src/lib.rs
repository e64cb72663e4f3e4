//! Reflector - 递归心智对话代理
//!
//! 每轮维护「我认为用户如何看待我」的有界递归近似，给出递归深度得分（RDS），
//! 并据此与安全护栏共同决定回复节奏与内容。
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、会话数据、单轮流水线、会话注册表、优雅关闭
//! - **integrations**: HTTP API（web feature）
//! - **llm**: Responder 能力与 LLM 客户端（OpenAI 兼容 / DeepSeek / Mock）
//! - **memory**: 信念状态与对话消息
//! - **metrics**: RDS 得分、滑动窗口、离线 RLT 评估
//! - **observability**: tracing 初始化
//! - **reflect**: 递归他者模型、安全护栏、回复编排

pub mod config;
pub mod core;
pub mod integrations;
pub mod llm;
pub mod memory;
pub mod metrics;
pub mod observability;
pub mod reflect;

pub use crate::core::{Reflector, ReflectorError, SessionRegistry};
