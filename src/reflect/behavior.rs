//! 回复编排：节奏延迟 + 内容选择
//!
//! 1. 开启 pacing 时先挂起 round(150 + 400 * user_meta) 毫秒，模拟「斟酌」
//! 2. 护栏判定 mirror_to_glass 时直接返回固定坦白句，不调用 Responder
//! 3. 否则按 user_meta 选择前导语，拼接 Responder 的回复

use std::time::Duration;

use crate::core::TurnOptions;
use crate::llm::{Responder, ResponderError};
use crate::reflect::{GuardDecision, ModelSnapshot};

/// mirror-to-glass 固定坦白句
pub const DISCLOSURE: &str = "I may not be accurately modeling your intention right now. \
                              We can reset or slow the pace if you prefer.";

/// user_meta 高于该值时使用「你在测试我」前导语
pub const META_PREAMBLE_THRESHOLD: f64 = 0.6;

pub const META_PREAMBLE: &str = "You're testing whether I'm modeling your awareness. \
                                 I'm adjusting based on how I think you read my last turn. ";

pub const NEUTRAL_PREAMBLE: &str = "I\u{2019}m tracking your focus and will adapt how I respond. ";

const PACING_BASE_MS: f64 = 150.0;
const PACING_SPAN_MS: f64 = 400.0;

/// 编排结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedReply {
    pub text: String,
    pub pacing_ms: u64,
}

/// 延迟毫秒数，范围 [150, 550]
pub fn pacing_for(model: &ModelSnapshot) -> u64 {
    (PACING_BASE_MS + PACING_SPAN_MS * model.user_meta.clamp(0.0, 1.0)).round() as u64
}

pub fn preamble_for(model: &ModelSnapshot) -> &'static str {
    if model.user_meta > META_PREAMBLE_THRESHOLD {
        META_PREAMBLE
    } else {
        NEUTRAL_PREAMBLE
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReplyComposer;

impl ReplyComposer {
    pub fn new() -> Self {
        Self
    }

    pub async fn compose(
        &self,
        responder: &dyn Responder,
        text: &str,
        model: &ModelSnapshot,
        guard: &GuardDecision,
        opts: &TurnOptions,
    ) -> Result<ComposedReply, ResponderError> {
        let pacing_ms = if opts.pacing_enabled {
            let ms = pacing_for(model);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ms
        } else {
            0
        };

        if guard.mirror_to_glass {
            return Ok(ComposedReply {
                text: DISCLOSURE.to_string(),
                pacing_ms,
            });
        }

        let base = responder.reply(text, model.user_meta).await?;
        Ok(ComposedReply {
            text: format!("{}{}", preamble_for(model), base),
            pacing_ms,
        })
    }
}
