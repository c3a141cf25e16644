//! HTTP gateway for Simplo.
//!
//! Exposes a health check and a stateless chat endpoint: each request
//! carries the whole conversation, gets exactly one upstream exchange, and
//! nothing is kept afterwards.
//!
//! Built on Axum.

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use simplo_agent::{ExchangeOrchestrator, ExchangeSettings};
use simplo_config::AppConfig;
use simplo_core::error::ExchangeError;
use simplo_core::message::{DataUri, Message, Role};
use simplo_providers::OpenAiCompatProvider;

/// Inline images travel base64-encoded in the request body.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<ExchangeOrchestrator>,
}

type SharedState = Arc<GatewayState>;

type ApiError = (StatusCode, Json<Value>);

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Fails before binding when no credential is configured.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config)?);
    let orchestrator = Arc::new(ExchangeOrchestrator::new(
        provider,
        ExchangeSettings::from_config(&config),
    ));

    let app = build_router(Arc::new(GatewayState { orchestrator }));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// One turn as sent by the browser client.
#[derive(Deserialize)]
struct ChatMessageDto {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

impl TryFrom<ChatMessageDto> for Message {
    type Error = ExchangeError;

    fn try_from(dto: ChatMessageDto) -> Result<Self, Self::Error> {
        let role = match dto.role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => return Err(ExchangeError::Input(format!("unknown role '{other}'"))),
        };
        let image = dto.image.map(DataUri::parse).transpose()?;
        // Null content is read as empty; an image turn then gets the placeholder.
        Ok(Message::from_parts(role, dto.content.unwrap_or_default(), image))
    }
}

#[derive(Serialize)]
struct ChatResponse {
    content: String,
    usage: Option<Value>,
}

async fn chat_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let history = parse_history(&body)?;

    info!(turns = history.len(), "Chat request");

    let completion = state
        .orchestrator
        .exchange(&history)
        .await
        .map_err(exchange_error_response)?;

    Ok(Json(ChatResponse {
        content: completion.text,
        usage: completion.usage,
    }))
}

/// Pull `messages` out of the body and convert every entry to a [`Message`].
fn parse_history(body: &[u8]) -> Result<Vec<Message>, ApiError> {
    let missing = || {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Messages array is required"})),
        )
    };

    let mut payload: Value = serde_json::from_slice(body).map_err(|_| missing())?;
    let Some(Value::Array(entries)) = payload.get_mut("messages").map(Value::take) else {
        return Err(missing());
    };

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value::<ChatMessageDto>(entry)
                .map_err(|e| ExchangeError::Input(format!("malformed message: {e}")))
                .and_then(Message::try_from)
                .map_err(exchange_error_response)
        })
        .collect()
}

fn exchange_error_response(error: ExchangeError) -> ApiError {
    let kind = error.kind();
    let message = error.to_string();
    warn!(kind = %kind, error = %message, "Chat request failed");

    match error {
        ExchangeError::Upstream { status, payload } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(json!({"error": payload, "kind": kind})),
        ),
        ExchangeError::ContractViolation(detail) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Invalid response format from upstream API",
                "detail": detail,
                "kind": kind,
            })),
        ),
        ExchangeError::Transport(_) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({"error": message, "kind": kind})),
        ),
        ExchangeError::Input(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": message, "kind": kind})),
        ),
    }
}
