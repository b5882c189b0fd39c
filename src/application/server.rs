#[cfg(test)]
#[path = "server_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use axum::Json;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatFailure;
use crate::domain::services::ChatGateway;
use crate::domain::services::SpeechGateway;
use crate::infrastructure::backends::elevenlabs::ElevenLabs;
use crate::infrastructure::backends::groq::Groq;

/// Request bodies are small JSON documents. 5000 characters of message plus
/// ten history entries fit comfortably.
const BODY_LIMIT: usize = 256 * 1024;

pub struct AppState {
    pub chat: ChatGateway,
    pub speech: SpeechGateway,
}

impl AppState {
    pub fn from_config() -> Result<AppState> {
        let timeout = Config::get_duration(ConfigKey::CompletionTimeout)?;

        return Ok(AppState {
            chat: ChatGateway::new(Arc::new(Groq::default()), timeout),
            speech: SpeechGateway::new(Arc::new(ElevenLabs::default())),
        });
    }
}

fn status(code: u16) -> StatusCode {
    return StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
}

async fn chat_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match state.chat.handle(&body).await {
        Ok(success) => return (StatusCode::OK, Json(success)).into_response(),
        Err(err) => {
            tracing::info!(kind = %err.kind, status = err.kind.status_code(), "Chat request rejected");
            return (
                status(err.kind.status_code()),
                Json(ChatFailure::from_error(&err)),
            )
                .into_response();
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    return Json(state.chat.health()).into_response();
}

async fn speech_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match state.speech.handle(&body).await {
        Ok(success) => return (StatusCode::OK, Json(success)).into_response(),
        Err(rejection) => {
            return (status(rejection.status), Json(rejection.body)).into_response();
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    return Router::new()
        .route("/api/chat", post(chat_handler).get(health_handler))
        .route("/api/text-to-speech", post(speech_handler))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state);
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?err, "Failed to listen for shutdown signal");
        return;
    }

    tracing::info!("Gateway shutting down");
}

pub async fn serve(state: AppState) -> Result<()> {
    let listen = Config::get(ConfigKey::Listen);
    let listener = TcpListener::bind(&listen).await?;
    let addr = listener.local_addr()?;

    tracing::info!(
        addr = %addr,
        configured = state.chat.health().configured,
        model = %state.chat.health().model,
        "Gateway listening"
    );

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    return Ok(());
}
