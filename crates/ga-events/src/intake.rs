//! Endpoint that stores a browser-generated client id in the session.
//!
//! The host mounts [`router`] and, in its own middleware, inserts a
//! [`SessionHandle`] extension for the current request. Without it every
//! request fails with `500` and a "no session" error. Anti-forgery checks
//! are the host's responsibility.

use crate::config::Config;
use crate::session::SessionHandle;
use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Request body posted by the browser.
#[derive(Debug, Deserialize)]
pub struct StoreClientIdRequest {
    #[serde(rename = "clientId", default)]
    pub client_id: Option<String>,
}

/// Intake error mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("no session attached to the request")]
    MissingSession,
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            IntakeError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            IntakeError::MissingSession => {
                warn!("intake request without a SessionHandle extension");
                (StatusCode::INTERNAL_SERVER_ERROR, IntakeError::MissingSession.to_string())
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug)]
struct IntakeState {
    session_key: String,
}

/// Router serving `POST {http_uri}`.
pub fn router(config: &Config) -> Router {
    let state = Arc::new(IntakeState {
        session_key: config.client_id_session_key().to_owned(),
    });

    Router::new()
        .route(config.http_uri(), post(store_client_id))
        .with_state(state)
}

async fn store_client_id(
    State(state): State<Arc<IntakeState>>,
    session: Option<Extension<SessionHandle>>,
    Json(payload): Json<StoreClientIdRequest>,
) -> Result<impl IntoResponse, IntakeError> {
    let Some(Extension(SessionHandle(session))) = session else {
        return Err(IntakeError::MissingSession);
    };

    let client_id = payload
        .client_id
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| IntakeError::BadRequest("clientId is required".into()))?;

    if session.get(&state.session_key).as_deref() == Some(client_id.as_str()) {
        debug!("client id unchanged");
    } else {
        debug!("storing client id in session");
        session.put(&state.session_key, client_id);
    }

    Ok(axum::Json(json!({ "status": "ok" })))
}
