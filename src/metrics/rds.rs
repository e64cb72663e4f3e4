//! RDS（Recursion Depth Score）：递归深度得分与滑动窗口
//!
//! r = clamp(Σ_{i=1..d} alpha^i * layer(i), 0, 1)，d = min(max_depth, depth)，
//! layer(i) = user_meta * (i >= 3 ? 1.0 : 0.5)。
//! 窗口保留最近 window 个 r（FIFO），窗口均值 >= tau 时 turns_above_tau 加一。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::reflect::ModelSnapshot;

pub const ALPHA_DEFAULT: f64 = 0.7;

/// 从该层起 user_meta 按全权重计入
pub const FULL_WEIGHT_LAYER: u32 = 3;

/// 单轮指标结果（写入 Turn）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnMetrics {
    pub r: f64,
    pub rds_window: f64,
    pub turns_above_tau: u64,
}

/// 得分器：几何折扣 alpha 与可选深度上限
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RdsScorer {
    alpha: f64,
    max_depth: Option<u32>,
}

impl Default for RdsScorer {
    fn default() -> Self {
        Self::new(ALPHA_DEFAULT)
    }
}

impl RdsScorer {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_depth: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 闭式求和，深度再大也是常数时间
    pub fn score(&self, model: &ModelSnapshot) -> f64 {
        let d = self.max_depth.map_or(model.depth, |m| m.min(model.depth));
        if model.user_meta <= 0.0 || d == 0 {
            return 0.0;
        }
        let shallow = geometric_sum(self.alpha, 1, d.min(FULL_WEIGHT_LAYER - 1));
        let deep = geometric_sum(self.alpha, FULL_WEIGHT_LAYER, d);
        (model.user_meta * (0.5 * shallow + deep)).clamp(0.0, 1.0)
    }
}

/// Σ_{i=from..=to} alpha^i；to < from 时为 0
fn geometric_sum(alpha: f64, from: u32, to: u32) -> f64 {
    if to < from {
        return 0.0;
    }
    let terms = f64::from(to - from) + 1.0;
    if alpha == 1.0 {
        return terms;
    }
    alpha.powi(from as i32) * (1.0 - alpha.powf(terms)) / (1.0 - alpha)
}

/// 会话级滑动窗口
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsWindow {
    pub window: usize,
    pub history: VecDeque<f64>,
    pub turns_above_tau: u64,
    /// 最近一次窗口均值（首轮前为 0）
    pub rds_window: f64,
}

impl MetricsWindow {
    /// window 为 0 时按 1 处理（SessionConfig 已拒绝 0）
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
            turns_above_tau: 0,
            rds_window: 0.0,
        }
    }

    pub fn mean(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    pub fn update(&mut self, r: f64, tau: f64) -> TurnMetrics {
        while self.history.len() >= self.window.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(r);
        self.rds_window = self.mean();
        if self.rds_window >= tau {
            self.turns_above_tau += 1;
        }
        TurnMetrics {
            r,
            rds_window: self.rds_window,
            turns_above_tau: self.turns_above_tau,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(depth: u32, user_meta: f64) -> ModelSnapshot {
        ModelSnapshot {
            depth,
            user_meta,
            you_me_ratio: 1.0,
            expected_suspicion: 0.0,
        }
    }

    #[test]
    fn test_score_depth_three() {
        let r = RdsScorer::new(0.7).score(&model(3, 0.35));
        let expected = 0.35 * (0.7 * 0.5 + 0.49 * 0.5 + 0.343);
        assert!((r - expected).abs() < 1e-9);
    }

    #[test]
    fn test_shallow_layers_half_weight() {
        let r = RdsScorer::new(0.5).score(&model(2, 1.0));
        assert!((r - (0.25 + 0.125)).abs() < 1e-9);
    }

    #[test]
    fn test_score_clamped() {
        let r = RdsScorer::new(1.0).score(&model(10, 1.0));
        assert_eq!(r, 1.0);
        assert_eq!(RdsScorer::new(0.7).score(&model(5, 0.0)), 0.0);
    }

    #[test]
    fn test_max_depth_caps_layers() {
        let capped = RdsScorer::new(0.7).with_max_depth(Some(1)).score(&model(4, 1.0));
        assert!((capped - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_huge_depth_is_constant_time() {
        let scorer = RdsScorer::new(0.7);
        let start = std::time::Instant::now();
        let huge = scorer.score(&model(u32::MAX, 0.15));
        assert!(start.elapsed() < std::time::Duration::from_millis(100));
        let deep = scorer.score(&model(200, 0.15));
        assert!((huge - deep).abs() < 1e-12);
        assert_eq!(scorer.score(&model(u32::MAX, 0.0)), 0.0);
        assert_eq!(RdsScorer::new(1.0).score(&model(u32::MAX, 0.15)), 1.0);
    }

    #[test]
    fn test_closed_form_matches_layer_sum() {
        for alpha in [0.3_f64, 0.7, 0.95] {
            for depth in 1..12u32 {
                let mut expected: f64 = 0.0;
                for i in 1..=depth {
                    let w = if i >= FULL_WEIGHT_LAYER { 1.0 } else { 0.5 };
                    expected += alpha.powi(i as i32) * 0.2 * w;
                }
                let r = RdsScorer::new(alpha).score(&model(depth, 0.2));
                assert!((r - expected.min(1.0)).abs() < 1e-12, "alpha={} depth={}", alpha, depth);
            }
        }
    }

    #[test]
    fn test_oversized_window_shrinks_on_update() {
        let mut w = MetricsWindow::new(2);
        w.history = VecDeque::from(vec![0.1, 0.2, 0.3, 0.4]);
        w.update(0.5, 0.9);
        assert_eq!(w.history.iter().copied().collect::<Vec<_>>(), vec![0.4, 0.5]);
        assert!((w.rds_window - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_window_fifo_eviction() {
        let mut w = MetricsWindow::new(2);
        w.update(0.1, 0.9);
        w.update(0.2, 0.9);
        w.update(0.3, 0.9);
        assert_eq!(w.history.len(), 2);
        assert_eq!(w.history.iter().copied().collect::<Vec<_>>(), vec![0.2, 0.3]);
        assert!((w.rds_window - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_turns_above_tau_uses_window_mean() {
        let mut w = MetricsWindow::new(2);
        // 首轮 r 高于 tau，均值也高于 tau
        assert_eq!(w.update(0.8, 0.75).turns_above_tau, 1);
        // r 低，均值 0.45 < tau
        assert_eq!(w.update(0.1, 0.75).turns_above_tau, 1);
        // r 高于 tau，但均值 (0.1 + 0.9) / 2 = 0.5 仍低于 tau
        let m = w.update(0.9, 0.75);
        assert_eq!(m.turns_above_tau, 1);
        assert!((m.rds_window - 0.5).abs() < 1e-9);
        // 均值 0.9 >= tau
        assert_eq!(w.update(0.9, 0.75).turns_above_tau, 2);
    }

    #[test]
    fn test_window_counter_inclusive_at_tau() {
        let mut w = MetricsWindow::new(1);
        assert_eq!(w.update(0.5, 0.5).turns_above_tau, 1);
    }
}
