//! 优雅关闭处理
//!
//! 监听 Ctrl+C / SIGTERM，停止接收新请求后执行清理：
//! - 拆除会话注册表（会话只在进程生命周期内存在）
//! - 正在处理的轮次先跑完再退出，不做中途取消

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::SessionRegistry;

/// 关闭信号：一个可克隆的取消令牌
#[derive(Clone, Default)]
pub struct ShutdownManager {
    token: CancellationToken,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown(&self, reason: &str) {
        if !self.token.is_cancelled() {
            tracing::info!("Shutdown requested: {}", reason);
        }
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }

    /// 安装系统信号处理器 (Ctrl+C, SIGTERM)
    pub fn install_signal_handlers(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                manager.shutdown("Ctrl+C");
            }
        });

        #[cfg(unix)]
        {
            let manager = self.clone();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                    sigterm.recv().await;
                    manager.shutdown("SIGTERM");
                }
            });
        }
    }
}

/// 关闭时需要执行的清理任务
#[async_trait]
pub trait ShutdownCleanup: Send + Sync {
    async fn cleanup(&self) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

/// 会话注册表清理：进程退出时拆除所有会话
pub struct RegistryCleanup {
    registry: Arc<SessionRegistry>,
}

impl RegistryCleanup {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ShutdownCleanup for RegistryCleanup {
    async fn cleanup(&self) -> anyhow::Result<()> {
        let n = self.registry.clear().await;
        tracing::info!("{} sessions torn down", n);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SessionRegistry"
    }
}

/// 依次执行清理任务，每个任务有独立超时
pub async fn run_cleanup(tasks: &[Arc<dyn ShutdownCleanup>], timeout: Duration) {
    for task in tasks {
        match tokio::time::timeout(timeout, task.cleanup()).await {
            Ok(Ok(())) => tracing::info!("Cleanup task '{}' completed", task.name()),
            Ok(Err(e)) => tracing::warn!("Cleanup task '{}' failed: {}", task.name(), e),
            Err(_) => tracing::warn!("Cleanup task '{}' timed out after {:?}", task.name(), timeout),
        }
    }
}
