//! 会话注册表
//!
//! 进程内的 session_id -> Session 映射：创建、查询、删除、按轮处理。
//! 每个会话一把互斥锁，保证同一会话同时至多一轮在处理；不同会话之间互不阻塞。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::core::{
    ReflectorError, Reflector, Session, SessionConfig, SessionId, Turn, TurnOptions,
};
use crate::llm::Responder;
use crate::metrics::MetricsWindow;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    reflector: Reflector,
}

impl SessionRegistry {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            reflector: Reflector::new(responder),
        }
    }

    /// 校验配置并创建会话
    pub async fn create(&self, config: SessionConfig) -> Result<SessionId, ReflectorError> {
        let session = Session::new(config)?;
        let id = session.id.clone();
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        tracing::info!(session = %id, tau = config.tau, alpha = config.alpha, window = config.window, "session created");
        Ok(id)
    }

    async fn handle(&self, id: &str) -> Result<Arc<Mutex<Session>>, ReflectorError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ReflectorError::UnknownSession(id.to_string()))
    }

    /// 处理一轮；持有会话锁直到本轮完成
    pub async fn respond(
        &self,
        id: &str,
        text: Option<&str>,
        opts: TurnOptions,
    ) -> Result<Turn, ReflectorError> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        self.reflector.process_turn(&mut session, text, opts).await
    }

    /// 会话完整快照（history / state / metrics / config）
    pub async fn snapshot(&self, id: &str) -> Result<Session, ReflectorError> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Ok(session.clone())
    }

    pub async fn metrics(&self, id: &str) -> Result<MetricsWindow, ReflectorError> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Ok(session.metrics.clone())
    }

    /// 删除会话；返回是否存在
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "session removed");
        }
        removed
    }

    /// 清空全部会话（进程关闭时调用），返回清理数量
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let n = sessions.len();
        sessions.clear();
        n
    }

    pub async fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
