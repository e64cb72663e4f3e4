//! 信念状态：会话级的情感效价与「用户在测试我」的信念
//!
//! 每轮调用一次 `update`：按关键词表给 valence 加减分、按测试标记抬升 belief_user_tests_me，并推进 turn。
//! 所有字段均做饱和截断，不会产生错误。

use serde::{Deserialize, Serialize};

/// 正向情感关键词（匹配规则见 `affect_matches`）
pub const POSITIVE_AFFECT: &[&str] = &["thanks", "appreciate", "helpful", "yes"];

/// 负向情感 / 不信任关键词
pub const NEGATIVE_AFFECT: &[&str] = &["fake", "manipulate", "no", "doubt", "angry"];

/// 短于此长度的关键词（no / yes）只做整词匹配
pub const AFFECT_STEM_MIN: usize = 4;

/// 「用户在测试系统」标记（子串匹配，覆盖 testing / pretending 等变形）
pub const TESTING_MARKERS: &[&str] = &["test", "testing", "pretend", "fake"];

pub const POSITIVE_DELTA: f64 = 0.05;
pub const NEGATIVE_DELTA: f64 = -0.07;
pub const TESTS_ME_STEP: f64 = 0.05;

/// 新会话的初始怀疑信念
pub const INITIAL_TESTS_ME: f64 = 0.3;

/// 会话持久信念状态
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeliefState {
    /// 情感效价，[-1, 1]
    pub valence: f64,
    /// 用户在测试我的信念，[0, 1]，只增不减（除非 reset）
    pub belief_user_tests_me: f64,
    /// 已处理轮数
    pub turn: u64,
}

impl Default for BeliefState {
    fn default() -> Self {
        Self {
            valence: 0.0,
            belief_user_tests_me: INITIAL_TESTS_ME,
            turn: 0,
        }
    }
}

/// 单轮文本的情感分类
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affect {
    Positive,
    Negative,
    Neutral,
}

impl Affect {
    pub fn delta(self) -> f64 {
        match self {
            Affect::Positive => POSITIVE_DELTA,
            Affect::Negative => NEGATIVE_DELTA,
            Affect::Neutral => 0.0,
        }
    }
}

/// 小写并统一弯引号，供所有关键词表匹配使用
pub fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// 按非字母数字（保留撇号）切词
pub fn words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
}

/// 词是否命中情感关键词：短词整词匹配，其余按词干前缀匹配（去掉结尾 e），
/// 因此 doubted / manipulating / faked / appreciated 都算命中，know 不算 no
pub fn affect_matches(word: &str, keyword: &str) -> bool {
    if keyword.len() < AFFECT_STEM_MIN {
        word == keyword
    } else {
        word.starts_with(keyword.trim_end_matches('e'))
    }
}

/// 情感分类；正负同时出现时正向优先
pub fn classify_affect(normalized: &str) -> Affect {
    let hit = |table: &[&str]| {
        words(normalized).any(|w| table.iter().any(|k| affect_matches(w, k)))
    };
    if hit(POSITIVE_AFFECT) {
        Affect::Positive
    } else if hit(NEGATIVE_AFFECT) {
        Affect::Negative
    } else {
        Affect::Neutral
    }
}

/// 文本是否带有测试系统的意图
pub fn signals_testing(normalized: &str) -> bool {
    TESTING_MARKERS.iter().any(|m| normalized.contains(m))
}

impl BeliefState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 完整的记忆更新：情感增量 + 测试信念 + turn 推进
    pub fn update(&mut self, text: &str) {
        let ut = normalize(text);
        let affect = classify_affect(&ut);
        self.valence = (self.valence + affect.delta()).clamp(-1.0, 1.0);
        if signals_testing(&ut) {
            self.belief_user_tests_me = (self.belief_user_tests_me + TESTS_ME_STEP).min(1.0);
        }
        self.advance_turn();
        tracing::debug!(
            turn = self.turn,
            valence = self.valence,
            tests_me = self.belief_user_tests_me,
            ?affect,
            "belief updated"
        );
    }

    /// 仅推进轮次（记忆更新关闭时使用）
    pub fn advance_turn(&mut self) {
        self.turn += 1;
    }

    /// 显式重置怀疑信念到初始值
    pub fn reset_suspicion(&mut self) {
        self.belief_user_tests_me = INITIAL_TESTS_ME;
    }
}
