use std::error::Error;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Mutex;
use tower_http::normalize_path::NormalizePath;

use crate::common::ErrorBody;
use crate::error::{QueryError, Result};
use crate::storage::DatasetStore;

use super::auth::CredentialCheck;

/// Shared handler state. The mutex serializes every store access.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<DatasetStore>>,
    credentials: Arc<dyn CredentialCheck>,
}

impl AppState {
    pub fn new(store: DatasetStore, credentials: impl CredentialCheck + 'static) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            credentials: Arc::new(credentials),
        }
    }
}

/// The routed service. Trailing slashes are trimmed before routing, so
/// `/removeUserFromChatOrChats/u1/` addresses every chat.
pub type App = NormalizePath<Router>;

pub fn app(state: AppState) -> App {
    NormalizePath::trim_trailing_slash(router(state))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/getUser/{user_id}", get(get_user))
        .route(
            "/getMutualUsers/{user_id}/{another_user_id}",
            get(get_mutual_users),
        )
        .route("/addChatMessage/{chat_id}", post(add_chat_message))
        .route(
            "/removeUserFromChatOrChats/{user_id}",
            get(remove_user_from_all_chats),
        )
        .route(
            "/removeUserFromChatOrChats/{user_id}/{chat_id}",
            get(remove_user_from_chat),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_credentials,
        ))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn run(addr: &str, state: AppState) -> std::result::Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind HTTP on {addr}: {e}"))?;
    log::info!("Chat query service listening on http://{}", listener.local_addr()?);

    let service = axum::ServiceExt::<Request>::into_make_service(app(state));
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("Received shutdown signal, stopping server...");
}

async fn require_credentials(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.credentials.is_authorized(request.headers()) {
        next.run(request).await
    } else {
        log::warn!("Rejected {} {}: bad credentials", request.method(), request.uri().path());
        QueryError::Unauthorized.into_response()
    }
}

async fn get_user(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let store = state.store.lock().await;
    reply(store.get_user(&user_id))
}

async fn get_mutual_users(
    State(state): State<AppState>,
    Path((user_id, another_user_id)): Path<(String, String)>,
) -> Response {
    let store = state.store.lock().await;
    reply(store.mutual_users(&user_id, &another_user_id))
}

async fn add_chat_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message = match message_from_body(&headers, &body) {
        Ok(message) => message,
        Err(err) => {
            log::debug!("Rejected message for chat {chat_id}: {err}");
            return err.into_response();
        }
    };

    let mut store = state.store.lock().await;
    reply(store.add_chat_message(&chat_id, message))
}

/// Extract `message` from a JSON body.
///
/// Non-JSON content types, empty bodies and bodies without a `message` key
/// yield `null`. A JSON body that fails to parse is an error.
fn message_from_body(headers: &HeaderMap, body: &[u8]) -> Result<Value> {
    if !is_json(headers) || body.is_empty() {
        return Ok(Value::Null);
    }

    let parsed = serde_json::from_slice::<Value>(body)
        .map_err(|err| QueryError::MalformedBody(err.to_string()))?;
    Ok(parsed.get("message").cloned().unwrap_or(Value::Null))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

async fn remove_user_from_all_chats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let mut store = state.store.lock().await;
    reply(store.remove_user_from_chats(&user_id, None))
}

async fn remove_user_from_chat(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(String, String)>,
) -> Response {
    let mut store = state.store.lock().await;
    reply(store.remove_user_from_chats(&user_id, Some(&chat_id)))
}

fn reply<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for QueryError {
    /// Errors keep status 200 and carry the message in the body.
    fn into_response(self) -> Response {
        Json(ErrorBody::new(self.to_string())).into_response()
    }
}
