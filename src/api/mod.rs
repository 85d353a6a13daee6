//! HTTP API module - REST endpoints for dice rolls and initiative

mod docs;
mod initiative;
mod roll;

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::dice::{ParseError, RollError, SavedRollError, SavedRollRegistry};
use crate::initiative::{InitiativeError, InitiativeTracker};

pub use docs::swagger_document;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub initiative: Arc<InitiativeTracker>,
    pub saved_rolls: Arc<SavedRollRegistry>,
    pub rng: Arc<Mutex<StdRng>>,
    /// Host advertised in the API documentation
    pub docs_host: Arc<str>,
}

impl AppState {
    /// RNG for one request, seeded from the shared one
    ///
    /// The shared lock is only held while drawing the seed, so large rolls
    /// do not serialize other requests. A seeded server stays deterministic
    /// for a fixed request order.
    pub fn request_rng(&self) -> StdRng {
        StdRng::from_rng(&mut *self.rng.lock())
    }
}

/// Build the API router
pub fn router(state: AppState, cors_permissive: bool) -> Router {
    let cors = if cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .merge(initiative::router())
        .merge(roll::router())
        .merge(docs::router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "dungeonbot",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Error response body shared by all endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl ErrorResponse {
    fn new(error: &'static str, message: String) -> Self {
        Self {
            error,
            message,
            position: None,
            fragment: None,
        }
    }
}

impl From<&ParseError> for ErrorResponse {
    fn from(err: &ParseError) -> Self {
        Self {
            error: err.kind.as_str(),
            message: err.to_string(),
            position: Some(err.position),
            fragment: Some(err.fragment.clone()),
        }
    }
}

impl From<&SavedRollError> for ErrorResponse {
    fn from(err: &SavedRollError) -> Self {
        match err {
            SavedRollError::InvalidName(_) => Self::new("invalid_name", err.to_string()),
            SavedRollError::InvalidExpression { source, .. } => Self {
                error: "invalid_expression",
                message: err.to_string(),
                position: Some(source.position),
                fragment: Some(source.fragment.clone()),
            },
            SavedRollError::NotFound(_) => Self::new("not_found", err.to_string()),
        }
    }
}

impl From<&RollError> for ErrorResponse {
    fn from(err: &RollError) -> Self {
        match err {
            RollError::Parse(e) => e.into(),
            RollError::SavedRoll(e) => e.into(),
            RollError::InvalidRequest(_) => Self::new("invalid_request", err.to_string()),
        }
    }
}

impl From<&InitiativeError> for ErrorResponse {
    fn from(err: &InitiativeError) -> Self {
        let kind = match err {
            InitiativeError::EmptyName => "empty_name",
            InitiativeError::DuplicateName(_) => "duplicate_name",
            InitiativeError::NotFound(_) => "not_found",
        };
        Self::new(kind, err.to_string())
    }
}

/// Reply for a request body that is not valid JSON of the expected shape
fn invalid_body(rejection: JsonRejection) -> Response {
    let body = ErrorResponse::new("invalid_request", rejection.body_text());
    (rejection.status(), Json(body)).into_response()
}

/// Status code for a saved roll failure
fn saved_roll_status(err: &SavedRollError) -> StatusCode {
    match err {
        SavedRollError::NotFound(_) => StatusCode::NOT_FOUND,
        SavedRollError::InvalidName(_) | SavedRollError::InvalidExpression { .. } => {
            StatusCode::BAD_REQUEST
        }
    }
}

/// Status code for an initiative failure
fn initiative_status(err: &InitiativeError) -> StatusCode {
    match err {
        InitiativeError::EmptyName => StatusCode::BAD_REQUEST,
        InitiativeError::DuplicateName(_) => StatusCode::CONFLICT,
        InitiativeError::NotFound(_) => StatusCode::NOT_FOUND,
    }
}
