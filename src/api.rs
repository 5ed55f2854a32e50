//! REST API Server for the Financial Research Agent
//!
//! Exposes research, chat and table extraction over HTTP
//! Integrates with frontend UI

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::agent::ResearchAgent;
use crate::config::Config;
use crate::error::ResearchError;
use crate::research::{self, resolve_api_key, ResearchOptions, EXAMPLE_QUERIES};
use crate::store::{ReportStore, SessionStore};
use crate::tables::{render_collection, ExtractOptions, TableExtractor};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    pub api_key: Option<String>,
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub options: ResearchOptions,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub markdown: String,
    #[serde(default)]
    pub flush_trailing_region: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub api_key: Option<String>,
    pub prompt: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn error_status(e: &ResearchError) -> StatusCode {
    match e {
        ResearchError::EmptyQuery | ResearchError::MissingApiKey => StatusCode::BAD_REQUEST,
        ResearchError::NotFound(_) => StatusCode::NOT_FOUND,
        ResearchError::Upstream(_) | ResearchError::HttpError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(e: ResearchError) -> ApiResult {
    (error_status(&e), Json(ApiResponse::error(e.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<dyn ResearchAgent>,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub reports: Arc<ReportStore>,
}

impl ApiState {
    pub fn new(agent: Arc<dyn ResearchAgent>, config: Config) -> Self {
        Self {
            agent,
            sessions: Arc::new(SessionStore::new()),
            reports: Arc::new(ReportStore::with_capacity(config.max_stored_reports)),
            config: Arc::new(config),
        }
    }
}

/// =============================
/// Helpers — Session Ids
/// =============================

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

/// Parse a client session id; arbitrary strings map to a stable uuid and a
/// missing id starts a fresh session.
fn session_uuid(value: Option<&str>) -> uuid::Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            uuid::Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => uuid::Uuid::new_v4(),
    }
}

/// =============================
/// Health / Examples
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn examples() -> Json<ApiResponse> {
    Json(ApiResponse::success(EXAMPLE_QUERIES))
}

/// =============================
/// Research Endpoint
/// =============================

async fn run_research(
    State(state): State<ApiState>,
    Json(req): Json<ResearchRequest>,
) -> ApiResult {
    info!("Received research request: {}", req.query);

    // The session lock is released before the agent call; only the
    // remembered key and last query are touched here.
    let remembered_key = match req.session_id.as_deref() {
        Some(id) => {
            let handle = state.sessions.get_or_create(session_uuid(Some(id))).await;
            let mut session = handle.lock().await;
            if let Some(key) = req.api_key.as_deref() {
                session.set_api_key(key);
            }
            session.query = req.query.clone();
            session.api_key.clone()
        }
        None => None,
    };

    let api_key = resolve_api_key(&[
        req.api_key.as_deref(),
        remembered_key.as_deref(),
        state.config.groq_api_key.as_deref(),
    ])
    .map(str::to_string);

    let mut options = req.options;
    options.extract.flush_trailing_region |= state.config.flush_trailing_tables;

    let report =
        match research::run_research(state.agent.as_ref(), api_key.as_deref(), &req.query, &options)
            .await
        {
            Ok(report) => report,
            Err(e) => return failure(e),
        };

    if let Some(view) = &report.tables {
        let exports = view.sections.iter().map(|s| s.export.clone()).collect();
        state.reports.insert(report.report_id, exports).await;
    }

    for warning in &report.warnings {
        warn!("Table warning at line {}: {}", warning.line, warning.message);
    }

    let downloads: Vec<String> = report
        .tables
        .iter()
        .flat_map(|view| view.sections.iter())
        .map(|s| format!("/api/reports/{}/{}", report.report_id, s.export.file_name))
        .collect();

    let mut data = match serde_json::to_value(&report) {
        Ok(data) => data,
        Err(e) => return failure(e.into()),
    };
    data["downloads"] = serde_json::json!(downloads);

    (StatusCode::OK, Json(ApiResponse::success(data)))
}

/// =============================
/// Table Extraction Endpoint
/// =============================

async fn extract_tables(
    State(state): State<ApiState>,
    Json(req): Json<ExtractRequest>,
) -> ApiResult {
    let options = ExtractOptions {
        flush_trailing_region: req
            .flush_trailing_region
            .unwrap_or(state.config.flush_trailing_tables),
    };

    let extraction = TableExtractor::new(options).extract(&req.markdown);
    let view = match render_collection(&extraction.tables) {
        Ok(view) => view,
        Err(e) => return failure(e),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "tables": extraction.tables,
            "view": view,
            "warnings": extraction.warnings,
        }))),
    )
}

/// =============================
/// CSV Download Endpoint
/// =============================

async fn download_table(
    State(state): State<ApiState>,
    Path((report_id, file_name)): Path<(String, String)>,
) -> Response {
    let report_id = match uuid::Uuid::parse_str(&report_id) {
        Ok(id) => id,
        Err(_) => return failure(ResearchError::NotFound(format!("report {}", report_id))).into_response(),
    };

    match state.reports.export(report_id, &file_name).await {
        Ok(export) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, export.mime.clone()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export.file_name),
                ),
            ],
            export.bytes,
        )
            .into_response(),
        Err(e) => failure(e).into_response(),
    }
}

/// =============================
/// Chat Endpoints
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult {
    let session_id = session_uuid(req.session_id.as_deref());
    let handle = state.sessions.get_or_create(session_id).await;
    // Held across the agent call: turns of one session are serialized.
    let mut session = handle.lock().await;

    if let Some(key) = resolve_api_key(&[
        req.api_key.as_deref(),
        state.config.groq_api_key.as_deref(),
    ]) {
        if session.api_key.is_none() || req.api_key.is_some() {
            session.set_api_key(key);
        }
    }

    info!(session_id = %session_id, "Received chat message");

    let outcome = research::chat(state.agent.as_ref(), &mut session, &req.prompt).await;
    let messages = session.messages().to_vec();
    drop(session);

    match outcome {
        Ok(reply) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "session_id": session_id,
                "reply": reply,
                "messages": messages,
            }))),
        ),
        Err(e) => failure(e),
    }
}

async fn chat_history(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> ApiResult {
    let session_id = session_uuid(Some(&session_id));

    match state.sessions.history(session_id).await {
        Ok(messages) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "session_id": session_id,
                "messages": messages,
            }))),
        ),
        Err(e) => failure(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/examples", get(examples))
        .route("/api/research", post(run_research))
        .route("/api/tables/extract", post(extract_tables))
        .route("/api/reports/:report_id/:file_name", get(download_table))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/:session_id", get(chat_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
