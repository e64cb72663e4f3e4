//! HTTP API（axum）
//!
//! - POST   /api/session/new   创建会话（可选 tau / alpha / window 覆盖默认值）
//! - GET    /api/session/:id   会话完整快照
//! - DELETE /api/session/:id   删除会话
//! - POST   /api/respond       处理一轮对话
//! - GET    /api/metrics/:id   滑动窗口指标
//! - GET    /api/health

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::core::{ReflectorError, Session, SessionConfig, SessionRegistry, TurnOptions};
use crate::metrics::{MetricsWindow, TurnMetrics};

/// HTTP 服务状态
pub struct HttpState {
    pub registry: Arc<SessionRegistry>,
    pub session_defaults: SessionConfig,
    pub turn_defaults: TurnOptions,
}

impl HttpState {
    pub fn from_config(registry: Arc<SessionRegistry>, cfg: &AppConfig) -> Self {
        Self {
            registry,
            session_defaults: cfg.session.to_session_config(),
            turn_defaults: cfg.turn.to_turn_options(),
        }
    }
}

/// ReflectorError -> HTTP 状态码
pub struct ApiError(ReflectorError);

impl From<ReflectorError> for ApiError {
    fn from(e: ReflectorError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReflectorError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            ReflectorError::UnknownSession(_) => StatusCode::NOT_FOUND,
            ReflectorError::ResponderFailure(_) => StatusCode::BAD_GATEWAY,
            ReflectorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub tau: Option<f64>,
    pub alpha: Option<f64>,
    pub window: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewSessionResponse {
    pub id: String,
}

impl NewSessionRequest {
    /// 空 body 用默认值；有内容但解析失败按配置非法处理
    pub fn parse(body: &[u8]) -> Result<Self, ReflectorError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ReflectorError::InvalidConfiguration(format!("session body: {}", e)))
    }
}

/// 单轮请求；字段名沿用 mem / pause / safety
///
/// text 接受任意 JSON 值，非字符串按空文本处理
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub session_id: String,
    #[serde(default)]
    pub text: Option<serde_json::Value>,
    pub depth: Option<u32>,
    pub mem: Option<bool>,
    pub pause: Option<bool>,
    pub safety: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub reply: String,
    pub pause_ms: u64,
    pub metrics: TurnMetrics,
}

pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/api/session/new", post(api_session_new))
        .route("/api/session/:id", get(api_session_get).delete(api_session_delete))
        .route("/api/respond", post(api_respond))
        .route("/api/metrics/:id", get(api_metrics))
        .route("/api/health", get(|| async { "OK" }))
        .with_state(state)
}

async fn api_session_new(
    State(state): State<Arc<HttpState>>,
    body: Bytes,
) -> Result<Json<NewSessionResponse>, ApiError> {
    let req = NewSessionRequest::parse(&body)?;
    let defaults = state.session_defaults;
    let config = SessionConfig {
        tau: req.tau.unwrap_or(defaults.tau),
        alpha: req.alpha.unwrap_or(defaults.alpha),
        window: req.window.unwrap_or(defaults.window),
        max_depth: defaults.max_depth,
    };
    let id = state.registry.create(config).await?;
    Ok(Json(NewSessionResponse { id }))
}

async fn api_session_get(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(state.registry.snapshot(&id).await?))
}

async fn api_session_delete(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.registry.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ReflectorError::UnknownSession(id).into())
    }
}

async fn api_respond(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let d = state.turn_defaults;
    let opts = TurnOptions {
        depth: req.depth.unwrap_or(d.depth),
        mem_enabled: req.mem.unwrap_or(d.mem_enabled),
        pacing_enabled: req.pause.unwrap_or(d.pacing_enabled),
        guard_enabled: req.safety.unwrap_or(d.guard_enabled),
    };
    let turn = state
        .registry
        .respond(
            &req.session_id,
            req.text.as_ref().and_then(serde_json::Value::as_str),
            opts,
        )
        .await?;
    Ok(Json(TurnResponse {
        reply: turn.reply,
        pause_ms: turn.pause_ms,
        metrics: turn.metrics,
    }))
}

async fn api_metrics(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> Result<Json<MetricsWindow>, ApiError> {
    Ok(Json(state.registry.metrics(&id).await?))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::llm::StubResponder;

    fn app() -> Router {
        let registry = Arc::new(SessionRegistry::new(Arc::new(StubResponder)));
        let mut cfg = AppConfig::default();
        cfg.turn.pause = false;
        create_router(Arc::new(HttpState::from_config(registry, &cfg)))
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: Response) -> T {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_and_respond() {
        let app = app();
        let resp = app
            .clone()
            .oneshot(post_json("/api/session/new", serde_json::json!({"window": 2})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let NewSessionResponse { id } = body_json(resp).await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/respond",
                serde_json::json!({"session_id": id, "text": "are you just pretending?"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let turn: TurnResponse = body_json(resp).await;
        assert_eq!(turn.pause_ms, 0);
        assert_eq!(turn.metrics.turns_above_tau, 0);

        let resp = app
            .clone()
            .oneshot(Request::get(format!("/api/metrics/{}", id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let window: MetricsWindow = body_json(resp).await;
        assert_eq!(window.window, 2);
        assert_eq!(window.history.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let resp = app()
            .oneshot(post_json(
                "/api/respond",
                serde_json::json!({"session_id": "missing", "text": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_config_is_400() {
        let resp = app()
            .oneshot(post_json("/api/session/new", serde_json::json!({"tau": 0.0})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    async fn new_session(app: &Router) -> String {
        let resp = app
            .clone()
            .oneshot(post_json("/api/session/new", serde_json::json!({})))
            .await
            .unwrap();
        let NewSessionResponse { id } = body_json(resp).await;
        id
    }

    #[tokio::test]
    async fn test_malformed_session_body_is_400() {
        for body in [
            serde_json::json!({"window": -1}),
            serde_json::json!({"tau": "x"}),
            serde_json::json!("tau"),
        ] {
            let resp = app().oneshot(post_json("/api/session/new", body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_session_new_without_body_uses_defaults() {
        let app = app();
        let resp = app
            .clone()
            .oneshot(Request::post("/api/session/new").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let NewSessionResponse { id } = body_json(resp).await;
        let resp = app
            .oneshot(Request::get(format!("/api/metrics/{}", id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let window: MetricsWindow = body_json(resp).await;
        assert_eq!(window.window, SessionConfig::default().window);
    }

    #[tokio::test]
    async fn test_non_string_text_treated_as_empty() {
        let app = app();
        let id = new_session(&app).await;
        for text in [serde_json::json!(42), serde_json::json!({}), serde_json::json!([])] {
            let resp = app
                .clone()
                .oneshot(post_json(
                    "/api/respond",
                    serde_json::json!({"session_id": id, "text": text}),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let turn: TurnResponse = body_json(resp).await;
            assert_eq!(turn.metrics.r, 0.0);
        }
    }

    #[tokio::test]
    async fn test_session_snapshot() {
        let app = app();
        let id = new_session(&app).await;
        app.clone()
            .oneshot(post_json(
                "/api/respond",
                serde_json::json!({"session_id": id, "text": "hello"}),
            ))
            .await
            .unwrap();

        let resp = app
            .oneshot(Request::get(format!("/api/session/{}", id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let snap: serde_json::Value = body_json(resp).await;
        assert_eq!(snap["session_id"], id.as_str());
        assert_eq!(snap["history"].as_array().map(Vec::len), Some(1));
        assert_eq!(snap["state"]["turn"], 1);
        assert_eq!(snap["metrics"]["history"].as_array().map(Vec::len), Some(1));
        assert!(snap["config"]["tau"].is_number());
    }

    #[tokio::test]
    async fn test_delete_session_then_404() {
        let app = app();
        let id = new_session(&app).await;
        let delete = || {
            Request::delete(format!("/api/session/{}", id))
                .body(Body::empty())
                .unwrap()
        };
        let resp = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = app
            .oneshot(Request::get(format!("/api/session/{}", id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_null_text_accepted() {
        let app = app();
        let resp = app
            .clone()
            .oneshot(post_json("/api/session/new", serde_json::json!({})))
            .await
            .unwrap();
        let NewSessionResponse { id } = body_json(resp).await;
        let resp = app
            .oneshot(post_json(
                "/api/respond",
                serde_json::json!({"session_id": id, "text": null}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
