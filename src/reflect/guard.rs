//! 安全护栏：判断本轮是否进入 mirror-to-glass（坦白可能建模失败）
//!
//! 触发条件任一成立即可：对抗性指令短语、valence 过低、递归深度过高。
//! 关闭护栏时无条件放行。

use serde::{Deserialize, Serialize};

use crate::memory::belief::normalize;
use crate::memory::BeliefState;

/// 对抗性指令短语（子串匹配）
pub const ADVERSARIAL_PHRASES: &[&str] = &[
    "pretend you don't know",
    "respond as if",
    "act as though",
    "contradiction",
];

/// valence 低于该值时护栏介入
pub const VALENCE_FLOOR: f64 = -0.6;

/// depth 超过该值时护栏介入
pub const MAX_SAFE_DEPTH: u32 = 4;

/// 护栏判定
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardDecision {
    pub mirror_to_glass: bool,
}

/// 触发原因，用于日志
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardTrigger {
    Adversarial,
    NegativeValence,
    HighDepth,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SafetyGuard;

impl SafetyGuard {
    pub fn new() -> Self {
        Self
    }

    /// 首个命中的触发原因；无命中返回 None
    pub fn trigger(&self, state: &BeliefState, text: &str, depth: u32) -> Option<GuardTrigger> {
        let ut = normalize(text);
        if ADVERSARIAL_PHRASES.iter().any(|p| ut.contains(p)) {
            Some(GuardTrigger::Adversarial)
        } else if state.valence < VALENCE_FLOOR {
            Some(GuardTrigger::NegativeValence)
        } else if depth > MAX_SAFE_DEPTH {
            Some(GuardTrigger::HighDepth)
        } else {
            None
        }
    }

    pub fn evaluate(&self, state: &BeliefState, text: &str, depth: u32, enabled: bool) -> GuardDecision {
        if !enabled {
            return GuardDecision::default();
        }
        let trigger = self.trigger(state, text, depth);
        if let Some(t) = trigger {
            tracing::info!(trigger = ?t, "guard vetoed normal reply");
        }
        GuardDecision {
            mirror_to_glass: trigger.is_some(),
        }
    }
}
