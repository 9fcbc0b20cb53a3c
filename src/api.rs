//! REST API Server for the financial chatbot
//!
//! Thin HTTP wrapper over [`FinancialChatbot`]: upload a dataset (or load the
//! sample), then ask questions about it.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agent::FinancialChatbot;
use crate::error::ChatbotError;
use crate::models::DataFormat;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
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

fn bad_request(message: &str) -> ApiResult {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message.to_string())))
}

/// Caller errors are echoed back; anything else is logged and kept opaque
fn failure(context: &str, e: ChatbotError) -> ApiResult {
    if e.is_user_error() {
        (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string())))
    } else {
        error!(error = %e, "{} failed", context);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("{} failed", context))),
        )
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub chatbot: Arc<FinancialChatbot>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Dataset Endpoints
/// =============================

async fn upload_file(State(state): State<ApiState>, mut multipart: Multipart) -> ApiResult {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(&format!("Malformed upload: {}", e)),
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return bad_request("No selected file");
        }

        let Ok(format) = DataFormat::from_filename(&filename) else {
            return bad_request("Invalid file type. Please upload CSV or JSON file");
        };

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return bad_request(&format!("Failed to read upload: {}", e)),
        };

        info!(filename = %filename, size = bytes.len(), "Received upload");

        return match state.chatbot.load_bytes(&filename, &bytes, format).await {
            Ok(summary) => (
                StatusCode::OK,
                Json(ApiResponse::success(serde_json::json!({
                    "message": "File uploaded successfully",
                    "session": summary,
                }))),
            ),
            Err(e) => failure("Upload", e),
        };
    }

    bad_request("No file part")
}

async fn use_sample_data(State(state): State<ApiState>) -> ApiResult {
    match state.chatbot.load_sample().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "message": "Sample data loaded successfully",
                "session": summary,
            }))),
        ),
        Err(e) => failure("Loading sample data", e),
    }
}

async fn session_info(State(state): State<ApiState>) -> ApiResult {
    match state.chatbot.session().await {
        Ok(summary) => (StatusCode::OK, Json(ApiResponse::success(summary))),
        Err(e) => failure("Session lookup", e),
    }
}

/// =============================
/// Query Endpoint
/// =============================

async fn process_query(State(state): State<ApiState>, Json(req): Json<QueryRequest>) -> ApiResult {
    info!("Received query: {}", req.query);

    match state.chatbot.query(&req.query).await {
        Ok(answer) => (StatusCode::OK, Json(ApiResponse::success(answer))),
        Err(e) => failure("Query", e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(chatbot: Arc<FinancialChatbot>, max_upload_bytes: usize) -> Router {
    let state = ApiState { chatbot };

    Router::new()
        .route("/health", get(health))
        .route("/api/upload", post(upload_file))
        .route("/api/sample", post(use_sample_data))
        .route("/api/query", post(process_query))
        .route("/api/session", get(session_info))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    chatbot: Arc<FinancialChatbot>,
    bind_addr: &str,
    port: u16,
    max_upload_bytes: usize,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(chatbot, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port)).await?;

    info!("API Server listening on http://{}:{}", bind_addr, port);

    axum::serve(listener, router).await?;

    Ok(())
}
