#[cfg(test)]
#[path = "server_test.rs"]
mod tests;

use std::net::SocketAddr;
use std::path;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Json;
use axum::Router;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tower_http::trace::TraceLayer;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Message;
use crate::domain::models::ProviderName;
use crate::domain::models::Session;
use crate::domain::models::SessionError;
use crate::domain::services::Sessions;
use crate::infrastructure::backends::BackendManager;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Sessions>,
}

#[derive(Default, Debug, Deserialize)]
pub struct SessionRequest {
    pub title: Option<String>,
    pub provider: Option<String>,
}

#[derive(Default, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

pub struct ApiError(SessionError);

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> ApiError {
        return ApiError(err);
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SessionError::Validation(_) => StatusCode::BAD_REQUEST,
            SessionError::NotFound => StatusCode::NOT_FOUND,
            SessionError::Backend(_) | SessionError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        return (status, Json(body)).into_response();
    }
}

/// Empty strings count as absent, anything else must name a known provider.
fn parse_provider(provider: Option<&str>) -> Result<Option<ProviderName>, SessionError> {
    let provider = match provider.filter(|e| return !e.is_empty()) {
        Some(provider) => provider,
        None => return Ok(None),
    };

    return ProviderName::parse(provider).map(Some).ok_or_else(|| {
        return SessionError::Validation(format!("Unknown provider: {provider}"));
    });
}

pub async fn create_session_handler(
    State(state): State<AppState>,
    payload: Option<Json<SessionRequest>>,
) -> Result<Json<Session>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let provider = parse_provider(payload.provider.as_deref())?;

    let session = state
        .sessions
        .create(payload.title.as_deref(), provider)
        .await?;

    return Ok(Json(session));
}

pub async fn list_sessions_handler(State(state): State<AppState>) -> Json<SessionsResponse> {
    return Json(SessionsResponse {
        sessions: state.sessions.list().await,
    });
}

pub async fn get_messages_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let messages = state.sessions.messages(&id).await?;
    return Ok(Json(MessagesResponse { messages }));
}

pub async fn update_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Option<Json<SessionRequest>>,
) -> Result<Json<Session>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let provider = parse_provider(payload.provider.as_deref())?;

    let session = state
        .sessions
        .update(&id, payload.title.as_deref(), provider)
        .await?;

    return Ok(Json(session));
}

pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.sessions.delete(&id).await?;
    return Ok(Json(DeleteResponse { ok: true }));
}

pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Option<Json<ChatRequest>>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let session_id = payload.session_id.unwrap_or_default();
    let message = payload.message.unwrap_or_default();

    let provider = match parse_provider(payload.provider.as_deref()) {
        Ok(provider) => provider,
        // Missing fields are reported ahead of a bad provider.
        Err(err) if !session_id.is_empty() && !message.is_empty() => return Err(err.into()),
        Err(_) => None,
    };

    tracing::debug!(session_id = session_id, "Chat request");
    let answer = state.sessions.chat(&session_id, &message, provider).await?;

    return Ok(Json(ChatResponse { answer }));
}

pub fn router(state: AppState) -> Router {
    return Router::new()
        .route("/api/session", post(create_session_handler))
        .route(
            "/api/session/:id",
            put(update_session_handler).delete(delete_session_handler),
        )
        .route("/api/sessions", get(list_sessions_handler))
        .route("/api/messages/:id", get(get_messages_handler))
        .route("/api/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);
}

pub async fn run_server(state: AppState, port: u16) -> Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Listening");
    println!("Listening on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?err, "Failed to listen for shutdown signal");
            }
            tracing::info!("Server shutting down signal received");
        })
        .await?;

    return Ok(());
}

pub async fn start() -> Result<()> {
    let port = Config::get(ConfigKey::Port).parse::<u16>()?;
    let default_provider = Config::default_provider();
    let backends = BackendManager::from_config();

    if let Err(err) = backends.service(default_provider).health_check().await {
        tracing::warn!(error = ?err, provider = %default_provider, "Backend health check failed");
    }

    let sessions = Sessions::new(
        path::PathBuf::from(Config::get(ConfigKey::DataDir)),
        default_provider,
        backends,
    );
    let restored = sessions
        .init(Config::get_bool(ConfigKey::RestoreSessions))
        .await?;
    tracing::info!(
        data_dir = sessions.data_dir().to_string_lossy().to_string(),
        default_provider = %sessions.default_provider(),
        restored = restored,
        "Session store ready"
    );

    let state = AppState {
        sessions: Arc::new(sessions),
    };

    return run_server(state, port).await;
}
