//! HTTP API for the chat and speech front end.
//!
//! - `POST /process-speech`: chat turn against the shared transcript
//! - `POST /synthesize-speech`: text to MP3
//! - `POST /start-speech`: reset the transcript
//! - `GET /`: bundled landing page

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::chat::ChatClient;
use crate::chat_log::ChatLog;
use crate::conversation::{Conversation, Role};
use crate::error::Result;
use crate::speech::{SpeechSynthesizer, AUDIO_CONTENT_TYPE};

const INDEX_HTML: &str = include_str!("../templates/index.html");

#[derive(Clone)]
pub struct AppState {
    pub conversation: Conversation,
    pub chat: Arc<ChatClient>,
    pub speech: Arc<SpeechSynthesizer>,
    pub log: Arc<ChatLog>,
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Serialize)]
struct TextResponse {
    response: String,
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/synthesize-speech", post(handle_synthesize_speech))
        .route("/process-speech", post(handle_process_speech))
        .route("/start-speech", post(handle_start_speech))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until `shutdown` resolves.
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP API listening on {addr}");

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(80).collect();
    let ellipsis = if text.chars().count() > 80 { "..." } else { "" };
    format!("\"{}{ellipsis}\" ({} chars)", head.replace('\n', " "), text.chars().count())
}

// --- Handlers ---

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_synthesize_speech(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<impl IntoResponse> {
    info!("HTTP /synthesize-speech: {}", preview(&req.text));
    let audio = state.speech.synthesize(&req.text).await?;
    Ok(([(header::CONTENT_TYPE, AUDIO_CONTENT_TYPE)], audio))
}

async fn handle_process_speech(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<TextResponse>> {
    info!("HTTP /process-speech: {}", preview(&req.text));

    // The user turn stays in the transcript even if the completion fails.
    let messages = state.conversation.append_and_snapshot(Role::User, req.text.as_str());
    let reply = state.chat.complete(&messages).await?;
    state.conversation.append(Role::Assistant, reply.as_str());
    debug!("Transcript now holds {} messages", state.conversation.len());

    state.log.record(&req.text, &reply).await;

    Ok(Json(TextResponse { response: reply }))
}

async fn handle_start_speech(State(state): State<AppState>) -> Json<TextResponse> {
    state.conversation.reset();
    info!("Conversation reset");
    Json(TextResponse {
        response: "OK".into(),
    })
}
