//! 单轮处理流水线
//!
//! text → BeliefState.update → RecursiveModelBuilder.build → SafetyGuard.evaluate
//!      → ReplyComposer.compose(Responder) → RDS.update → history append
//!
//! 信念更新在副本上进行，Responder 成功后才整体提交；失败时会话保持原样。

use std::sync::Arc;

use chrono::Utc;

use crate::core::{ReflectorError, Session, Turn, TurnOptions};
use crate::llm::Responder;
use crate::metrics::RdsScorer;
use crate::reflect::{RecursiveModelBuilder, ReplyComposer, SafetyGuard};

/// 流水线各阶段的组合，可在多个会话间共享
#[derive(Clone)]
pub struct Reflector {
    responder: Arc<dyn Responder>,
    builder: RecursiveModelBuilder,
    guard: SafetyGuard,
    composer: ReplyComposer,
}

impl Reflector {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder,
            builder: RecursiveModelBuilder::new(),
            guard: SafetyGuard::new(),
            composer: ReplyComposer::new(),
        }
    }

    /// 处理一轮对话；成功时返回已追加到 history 的 Turn
    ///
    /// `text` 为 None 时按空串处理。记忆更新关闭时 turn 依然推进。
    pub async fn process_turn(
        &self,
        session: &mut Session,
        text: Option<&str>,
        opts: TurnOptions,
    ) -> Result<Turn, ReflectorError> {
        let user = text.unwrap_or_default().trim().to_string();

        let mut state = session.state.clone();
        if opts.mem_enabled {
            state.update(&user);
        } else {
            state.advance_turn();
        }

        let model = self.builder.build(&state, &user, opts.depth);
        tracing::debug!(
            session = %session.id,
            depth = model.depth,
            user_meta = model.user_meta,
            you_me_ratio = model.you_me_ratio,
            expected_suspicion = model.expected_suspicion,
            "model of other built"
        );

        let guard = self
            .guard
            .evaluate(&state, &user, model.depth, opts.guard_enabled);

        let reply = match self
            .composer
            .compose(self.responder.as_ref(), &user, &model, &guard, &opts)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session = %session.id, "responder failed, turn not committed: {}", e);
                return Err(e.into());
            }
        };

        let r = RdsScorer::new(session.config.alpha)
            .with_max_depth(session.config.max_depth)
            .score(&model);

        session.state = state;
        let metrics = session.metrics.update(r, session.config.tau);
        tracing::debug!(
            session = %session.id,
            r = metrics.r,
            rds_window = metrics.rds_window,
            turns_above_tau = metrics.turns_above_tau,
            "metrics updated"
        );

        let turn = Turn {
            user,
            reply: reply.text,
            pause_ms: reply.pacing_ms,
            guard,
            model,
            metrics,
            at: Utc::now(),
        };
        session.history.push(turn.clone());
        Ok(turn)
    }
}
