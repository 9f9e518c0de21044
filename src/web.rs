use crate::{
    config::Config,
    history::{record_best_effort, HistoryLog, HistoryRecord},
    semantic::RetrievalEngine,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
pub struct SharedState {
    pub engine: Arc<RetrievalEngine>,
    pub history: Arc<dyn HistoryLog>,
    pub recent_limit: usize,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/history", get(history))
        .route("/health", get(health))
        .layer(
            tower::ServiceBuilder::new()
                .layer(
                    tower_http::trace::TraceLayer::new_for_http()
                        .make_span_with(
                            tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                        )
                        .on_response(
                            tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                        ),
                )
                .layer(tower_http::cors::CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::warn!("shutting down");
}

async fn start_app(state: SharedState, listen: String) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    log::info!("listening on {listen}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Serve an engine that is already fully initialized.
pub fn start_daemon(
    engine: Arc<RetrievalEngine>,
    history: Arc<dyn HistoryLog>,
    config: &Config,
) -> anyhow::Result<()> {
    let state = SharedState {
        engine,
        history,
        recent_limit: config.history.recent_limit,
    };
    let listen = config.server.listen.clone();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { start_app(state, listen).await })
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": self.to_string(),
                    "answer": "",
                    "confidence": 0.0,
                })),
            ),
        }
        .into_response()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub confidence: f32,
    pub timestamp: String,
}

impl AskResponse {
    /// Trim, resolve and record one question.
    ///
    /// Returns `None` for blank input; the engine is never asked about it.
    pub fn answer(
        engine: &RetrievalEngine,
        history: Option<&dyn HistoryLog>,
        question: &str,
    ) -> Option<Self> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        let resolution = engine.resolve_query(question);
        if let Some(history) = history {
            record_best_effort(history, question, &resolution.answer);
        }

        Some(Self {
            question: question.to_string(),
            answer: resolution.answer,
            confidence: resolution.confidence,
            timestamp: chrono::Local::now().to_rfc3339(),
        })
    }
}

// A body that isn't JSON at all gets the same 400 as a missing question.
async fn ask(
    State(state): State<Arc<SharedState>>,
    payload: Option<Json<AskRequest>>,
) -> Result<Json<AskResponse>, ApiError> {
    log::debug!("payload: {payload:?}");

    let question = payload
        .and_then(|Json(payload)| payload.question)
        .ok_or(ApiError::BadRequest("Question is required"))?;

    // embedding is CPU-bound; keep it off the async workers
    tokio::task::block_in_place(move || {
        AskResponse::answer(&state.engine, Some(state.history.as_ref()), &question)
            .map(Json)
            .ok_or(ApiError::BadRequest("Question cannot be empty"))
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn history(
    State(state): State<Arc<SharedState>>,
    Query(params): Query<HistoryParams>,
) -> Json<HistoryResponse> {
    let limit = params.limit.unwrap_or(state.recent_limit);

    tokio::task::block_in_place(move || match state.history.recent(limit) {
        Ok(history) => Json(HistoryResponse {
            history,
            error: None,
        }),
        Err(err) => {
            log::error!("Error getting chat history: {err}");
            Json(HistoryResponse {
                history: vec![],
                error: Some("Error retrieving chat history".to_string()),
            })
        }
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub knowledge_base_loaded: bool,
    pub model: String,
    pub entries: usize,
}

async fn health(State(state): State<Arc<SharedState>>) -> Json<HealthResponse> {
    let status = state.engine.status();
    let label = if status.ready { "healthy" } else { "starting" };

    Json(HealthResponse {
        status: label.to_string(),
        model_loaded: status.dimensions > 0,
        knowledge_base_loaded: status.entries > 0,
        model: status.model,
        entries: status.entries,
    })
}
