//! 离线 RLT 评估：从持久化的会话历史重算滑动窗口通过率
//!
//! 与在线 MetricsWindow 口径一致：同样的窗口长度、同样的 `>=` 比较，
//! 因此 `time_above_tau` 等于在线的 `turns_above_tau`。缺少 r 的记录跳过。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::ReflectorError;

/// 持久化会话（宽松解析：只读取 history[*].metrics.r）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordedSession {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub history: Vec<RecordedTurn>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordedTurn {
    #[serde(default)]
    pub metrics: Option<RecordedMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordedMetrics {
    #[serde(default)]
    pub r: Option<f64>,
}

/// 评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RltReport {
    pub session_id: String,
    pub time_above_tau: usize,
    pub pass_rate: f64,
    /// 每轮的尾随窗口均值
    pub series: Vec<f64>,
}

/// 对 r 序列（可缺失）逐轮计算尾随窗口均值与通过次数
pub fn evaluate(rs: &[Option<f64>], tau: f64, window: usize) -> RltReport {
    let window = window.max(1);
    let series: Vec<f64> = (0..rs.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let present: Vec<f64> = rs[start..=i].iter().flatten().copied().collect();
            if present.is_empty() {
                0.0
            } else {
                present.iter().sum::<f64>() / present.len() as f64
            }
        })
        .collect();
    let time_above_tau = series.iter().filter(|avg| **avg >= tau).count();
    let pass_rate = if series.is_empty() {
        0.0
    } else {
        time_above_tau as f64 / series.len() as f64
    };
    RltReport {
        session_id: "unknown".to_string(),
        time_above_tau,
        pass_rate,
        series,
    }
}

pub fn evaluate_session(session: &RecordedSession, tau: f64, window: usize) -> RltReport {
    let rs: Vec<Option<f64>> = session
        .history
        .iter()
        .map(|t| t.metrics.as_ref().and_then(|m| m.r))
        .collect();
    RltReport {
        session_id: session
            .session_id
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        ..evaluate(&rs, tau, window)
    }
}

/// 读取 JSON 会话文件并评估
pub fn evaluate_file(path: &Path, tau: f64, window: usize) -> Result<RltReport, ReflectorError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ReflectorError::Io(format!("{}: {}", path.display(), e)))?;
    let session: RecordedSession = serde_json::from_str(&raw)
        .map_err(|e| ReflectorError::Io(format!("{}: {}", path.display(), e)))?;
    Ok(evaluate_session(&session, tau, window))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::metrics::MetricsWindow;

    #[test]
    fn test_matches_live_window() {
        let rs = [0.8, 0.1, 0.9, 0.9, 0.76, 0.2, 0.95];
        let mut live = MetricsWindow::new(2);
        let mut live_series = Vec::new();
        for r in rs {
            live_series.push(live.update(r, 0.75).rds_window);
        }
        let offline: Vec<Option<f64>> = rs.iter().copied().map(Some).collect();
        let report = evaluate(&offline, 0.75, 2);
        assert_eq!(report.time_above_tau as u64, live.turns_above_tau);
        for (a, b) in report.series.iter().zip(live_series.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_history() {
        let report = evaluate(&[], 0.75, 6);
        assert_eq!(report.time_above_tau, 0);
        assert_eq!(report.pass_rate, 0.0);
        assert!(report.series.is_empty());
    }

    #[test]
    fn test_missing_r_skipped() {
        let report = evaluate(&[Some(1.0), None, Some(0.5)], 0.75, 3);
        assert_eq!(report.series, vec![1.0, 1.0, 0.75]);
        assert_eq!(report.time_above_tau, 3);
        assert_eq!(report.pass_rate, 1.0);
    }

    #[test]
    fn test_evaluate_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"session_id": "abc", "history": [
                {{"user": "hi", "metrics": {{"r": 0.9}}}},
                {{"user": "yo", "metrics": {{"r": 0.1}}}},
                {{"user": "no metrics"}}
            ]}}"#
        )
        .unwrap();
        let report = evaluate_file(file.path(), 0.75, 2).unwrap();
        assert_eq!(report.session_id, "abc");
        assert_eq!(report.time_above_tau, 1);
        assert!((report.pass_rate - 1.0 / 3.0).abs() < 1e-9);
    }
}
