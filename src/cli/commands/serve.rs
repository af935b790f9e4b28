//! HTTP chat endpoint.
//!
//! Each request runs in a fresh session that starts at the entry agent.
//! `POST /chat` collects the turn's events into one JSON body,
//! `POST /chat/stream` forwards them as server-sent events while the turn
//! is still running.

use crate::agent::AgentDescriptor;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Credentials, Settings};
use crate::relay::RelayEvent;
use crate::team::Team;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

const EVENT_CHANNEL_BUFFER: usize = 32;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    team: Team,
}

impl AppState {
    pub fn new(team: Team) -> Self {
        Self { team }
    }
}

/// Run the HTTP server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'huddle doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let credentials = Credentials::from_env()?;
    let team = Team::from_settings(&settings, &credentials)?;

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Huddle Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Agents", "GET  /agents");
    Output::kv("Chat", "POST /chat");
    Output::kv("Chat (SSE)", "POST /chat/stream");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, router(AppState::new(team))).await?;

    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/agents", get(list_agents))
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatResponse {
    messages: Vec<RelayEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AgentInfo {
    name: String,
    model: String,
    tools: Vec<String>,
}

impl From<&AgentDescriptor> for AgentInfo {
    fn from(agent: &AgentDescriptor) -> Self {
        Self {
            name: agent.name.clone(),
            model: agent.model.clone(),
            tools: agent.tools.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AgentListResponse {
    agents: Vec<AgentInfo>,
    entry_agent: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

fn empty_message() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Message must not be empty".to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_agents(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.team.registry();
    Json(AgentListResponse {
        agents: registry.iter().map(AgentInfo::from).collect(),
        entry_agent: registry.entry().name.clone(),
    })
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    if req.message.trim().is_empty() {
        return empty_message();
    }

    let mut relay = state.team.session();
    let messages = relay.respond(&req.message).await;
    debug!("Turn produced {} events", messages.len());

    Json(ChatResponse { messages }).into_response()
}

async fn chat_stream(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    if req.message.trim().is_empty() {
        return empty_message();
    }

    let (mut tx, rx) = mpsc::channel::<RelayEvent>(EVENT_CHANNEL_BUFFER);
    let mut relay = state.team.session();

    tokio::spawn(async move {
        relay.handle_message(&req.message, &mut tx).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| Event::default().json_data(&event));
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
