//! 反思层：递归他者模型、安全护栏、回复编排

pub mod behavior;
pub mod guard;
pub mod model;

pub use behavior::{ComposedReply, ReplyComposer, DISCLOSURE};
pub use guard::{GuardDecision, GuardTrigger, SafetyGuard};
pub use model::{ModelSnapshot, RecursiveModelBuilder};
