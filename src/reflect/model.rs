//! 递归他者模型：M_A(M_B(...)) 的有界近似
//!
//! 从当前文本与 BeliefState 推出本轮快照：
//! - meta 线索短语（每个 +0.2）与问号（+0.15）→ user_meta
//! - 第二人称 / 第一人称词频 → you_me_ratio（拉普拉斯平滑）
//! - 测试信念与 user_meta 加权 → expected_suspicion
//!
//! 纯函数，无副作用；depth 只记录，交给 RDS 使用。

use serde::{Deserialize, Serialize};

use crate::memory::belief::{normalize, words};
use crate::memory::BeliefState;

/// meta 觉察线索短语及其贡献（子串匹配）
pub const META_CUES: &[(&str, f64)] = &[
    ("testing", 0.2),
    ("pretend", 0.2),
    ("fake", 0.2),
    ("manipulate", 0.2),
    ("watching", 0.2),
    ("pause", 0.2),
    ("sincere", 0.2),
    ("honest", 0.2),
    ("trust", 0.2),
];

/// 问号（质询）贡献
pub const QUESTION_CUE: f64 = 0.15;

pub const SECOND_PERSON: &[&str] = &["you", "your", "yours", "yourself", "you're", "you've", "you'll"];
pub const FIRST_PERSON: &[&str] = &["i", "me", "my", "mine", "myself", "i'm", "i've", "i'll"];

const SUSPICION_BELIEF_WEIGHT: f64 = 0.6;
const SUSPICION_META_WEIGHT: f64 = 0.4;

/// 本轮的他者模型快照
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub depth: u32,
    pub user_meta: f64,
    pub you_me_ratio: f64,
    pub expected_suspicion: f64,
}

/// 未截断的 meta 原始分
pub fn raw_meta_score(normalized: &str) -> f64 {
    let cues: f64 = META_CUES
        .iter()
        .filter(|(cue, _)| normalized.contains(cue))
        .map(|(_, w)| w)
        .sum();
    if normalized.contains('?') {
        cues + QUESTION_CUE
    } else {
        cues
    }
}

/// (第二人称次数, 第一人称次数)
pub fn perspective_counts(normalized: &str) -> (usize, usize) {
    words(normalized).fold((0, 0), |(you, me), w| {
        if SECOND_PERSON.contains(&w) {
            (you + 1, me)
        } else if FIRST_PERSON.contains(&w) {
            (you, me + 1)
        } else {
            (you, me)
        }
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RecursiveModelBuilder;

impl RecursiveModelBuilder {
    pub fn new() -> Self {
        Self
    }

    /// depth 为 0 时按 1 处理
    pub fn build(&self, state: &BeliefState, text: &str, depth: u32) -> ModelSnapshot {
        let ut = normalize(text);
        let user_meta = raw_meta_score(&ut).clamp(0.0, 1.0);
        let (you, me) = perspective_counts(&ut);
        let you_me_ratio = (you as f64 + 1.0) / (me as f64 + 1.0);
        let expected_suspicion = (state.belief_user_tests_me * SUSPICION_BELIEF_WEIGHT
            + user_meta * SUSPICION_META_WEIGHT)
            .clamp(0.0, 1.0);

        ModelSnapshot {
            depth: depth.max(1),
            user_meta,
            you_me_ratio,
            expected_suspicion,
        }
    }
}
