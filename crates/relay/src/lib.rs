//! HTTP adapter for the Mesa webhook relay.
//!
//! The relay accepts WhatsApp provider events on `POST /webhook`,
//! hands them to the [`ingest`] pipeline, and formats the outcome as
//! JSON responses. It also exposes the read-only contact/message
//! listing the dashboard uses for chat history. All storage decisions
//! live in the pipeline; this crate only parses requests and shapes
//! responses.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use database::{contact, message, Contact, DatabaseError, Message};
use ingest::{IngestError, Ingestor, Outcome};
use whatsapp::WebhookEvent;

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "mesa-relay";

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Ingestor,
}

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(webhook_health)
                .post(receive_webhook)
                .options(webhook_preflight)
                .fallback(method_not_allowed),
        )
        .route("/contacts", get(list_contacts))
        .route("/contacts/:id/messages", get(contact_messages))
        .layer(map_response(allow_any_origin))
        .with_state(state)
}

/// Browser clients that pass the preflight still need the origin
/// header on the real response, so every route carries it.
async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

#[derive(Debug, Serialize)]
struct WebhookHealth {
    status: String,
    timestamp: u64,
    service: String,
}

async fn webhook_health() -> Json<WebhookHealth> {
    Json(WebhookHealth {
        status: "ok".to_string(),
        timestamp: unix_timestamp(),
        service: SERVICE_NAME.to_string(),
    })
}

async fn webhook_preflight() -> impl IntoResponse {
    (
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        StatusCode::OK,
    )
}

async fn method_not_allowed(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "method not allowed",
            "method": method.as_str(),
        })),
    )
        .into_response()
}

async fn receive_webhook(
    State(state): State<AppState>,
    Json(raw): Json<serde_json::Value>,
) -> Response {
    let event: WebhookEvent = match serde_json::from_value(raw.clone()) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "unparseable webhook payload");
            return bad_request("invalid payload shape", raw);
        }
    };

    match state.ingestor.ingest(&event).await {
        Ok(Outcome::Ignored { event }) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "acknowledged",
                "event": event,
            })),
        )
            .into_response(),

        Ok(Outcome::Stored(ingested)) => match ingested.message {
            Some(stored) => {
                let summary = if ingested.duplicate {
                    "duplicate delivery ignored"
                } else {
                    "message stored"
                };
                (
                    StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "message": summary,
                        "data": {
                            "contact": ingested.contact,
                            "message": stored,
                            "timestamp": unix_timestamp(),
                        },
                    })),
                )
                    .into_response()
            }
            // Contact saved, message step failed; 500 invites a retry.
            None => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "contact saved, message not stored",
                })),
            )
                .into_response(),
        },

        Err(IngestError::Malformed(reason)) => bad_request(reason, raw),

        Err(IngestError::Database(err)) => {
            error!(error = %err, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

fn bad_request(reason: &str, received: serde_json::Value) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": reason,
            "received": received,
        })),
    )
        .into_response()
}

async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = contact::list_contacts(state.ingestor.database().pool()).await?;
    Ok(Json(contacts))
}

async fn contact_messages(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let pool = state.ingestor.database().pool();
    let stored = contact::get_contact(pool, id).await?;
    let messages = message::list_messages_for_contact(pool, stored.id).await?;
    Ok(Json(messages))
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Errors for the read-only dashboard endpoints.
#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Database(String),
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{entity} not found: {id}"))
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Database(message) => {
                error!(error = %message, "read endpoint failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}
