//! 指标层：RDS 得分、会话滑动窗口、离线 RLT 评估

pub mod rds;
pub mod rlt;

pub use rds::{MetricsWindow, RdsScorer, TurnMetrics, ALPHA_DEFAULT};
pub use rlt::{evaluate, evaluate_file, evaluate_session, RecordedSession, RltReport};
