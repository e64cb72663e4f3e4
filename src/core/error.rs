//! 错误类型
//!
//! - InvalidConfiguration：会话参数越界，创建即拒绝
//! - UnknownSession：会话不存在，绝不隐式创建
//! - ResponderFailure：Responder 失败，本轮不提交任何状态
//! 文本缺失 / 数值越界都不是错误（按空串处理、饱和截断）。

use thiserror::Error;

use crate::llm::ResponderError;

#[derive(Error, Debug)]
pub enum ReflectorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Responder failure: {0}")]
    ResponderFailure(#[from] ResponderError),

    #[error("IO error: {0}")]
    Io(String),
}
