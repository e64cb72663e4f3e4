//! 会话数据：配置、单轮记录、会话本体
//!
//! Session 由 SessionRegistry 独占持有；history 只追加不修改。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ReflectorError;
use crate::memory::BeliefState;
use crate::metrics::{MetricsWindow, TurnMetrics, ALPHA_DEFAULT};
use crate::reflect::{GuardDecision, ModelSnapshot};

/// 会话 ID（UUID v4）
pub type SessionId = String;

pub const TAU_DEFAULT: f64 = 0.75;
pub const WINDOW_DEFAULT: usize = 6;
pub const DEPTH_DEFAULT: u32 = 3;

/// 会话级不可变配置
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 窗口均值阈值，(0, 1]
    pub tau: f64,
    /// 几何折扣，(0, 1]
    pub alpha: f64,
    /// 滑动窗口长度，>= 1
    pub window: usize,
    /// RDS 层数上限；None 表示按本轮 depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tau: TAU_DEFAULT,
            alpha: ALPHA_DEFAULT,
            window: WINDOW_DEFAULT,
            max_depth: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ReflectorError> {
        let unit = |v: f64| v > 0.0 && v <= 1.0;
        if !unit(self.tau) {
            return Err(ReflectorError::InvalidConfiguration(format!(
                "tau must be in (0, 1], got {}",
                self.tau
            )));
        }
        if !unit(self.alpha) {
            return Err(ReflectorError::InvalidConfiguration(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.window < 1 {
            return Err(ReflectorError::InvalidConfiguration(
                "window must be >= 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ReflectorError::InvalidConfiguration(
                "max_depth must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// 单轮调用参数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOptions {
    pub depth: u32,
    pub mem_enabled: bool,
    pub pacing_enabled: bool,
    pub guard_enabled: bool,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            depth: DEPTH_DEFAULT,
            mem_enabled: true,
            pacing_enabled: true,
            guard_enabled: true,
        }
    }
}

/// 单轮记录，追加后不可变
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub reply: String,
    pub pause_ms: u64,
    pub guard: GuardDecision,
    pub model: ModelSnapshot,
    pub metrics: TurnMetrics,
    pub at: DateTime<Utc>,
}

/// 单个会话
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "session_id")]
    pub id: SessionId,
    pub history: Vec<Turn>,
    pub state: BeliefState,
    pub metrics: MetricsWindow,
    pub config: SessionConfig,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, ReflectorError> {
        config.validate()?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            history: Vec::new(),
            state: BeliefState::new(),
            metrics: MetricsWindow::new(config.window),
            config,
            created_at: Utc::now(),
        })
    }
}
