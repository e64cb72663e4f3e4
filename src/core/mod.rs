//! 核心层：错误、会话数据、单轮流水线、会话注册表、优雅关闭

pub mod error;
pub mod pipeline;
pub mod registry;
pub mod session;
pub mod shutdown;

pub use error::ReflectorError;
pub use pipeline::Reflector;
pub use registry::SessionRegistry;
pub use session::{Session, SessionConfig, SessionId, Turn, TurnOptions};
pub use shutdown::{run_cleanup, RegistryCleanup, ShutdownCleanup, ShutdownManager};
