//! 可观测性：tracing 订阅器初始化
//!
//! 默认级别由调用方给出，RUST_LOG 可覆盖；日志写 stderr，stdout 留给回复输出。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // 重复初始化（如测试中）静默忽略
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
