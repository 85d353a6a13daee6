//! Roll API endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{invalid_body, saved_roll_status, AppState, ErrorResponse};
use crate::dice::{self, RollRequest, RollResult, SavedRoll, MAX_BATCH_SIZE};

const HELP_TEXT: &str = "\
Dice roller

  GET  /roll                       this help text
  POST /roll                       roll a batch: {\"rolls\": [\"1d20+5\", {\"saved_roll\": \"fireball\"}]}
  GET  /roll/{expression}          roll one expression, e.g. /roll/2d6+3
  GET  /roll/savedroll             list saved rolls
  GET  /roll/savedroll/{rollname}  roll a saved roll
  PUT  /roll/savedroll/{rollname}  save a roll: {\"expression\": \"8d6\"}

Notation: terms like 2d6 or 3 joined by + or -, e.g. 1d20 + 1d4 - 1.
Dice need at least 2 sides; a term may roll at most 1000 dice and a whole
expression at most 2000. A batch holds at most 50 rolls; its items are
rolled in order and fail independently.
";

/// Build roll router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/roll", get(help).post(roll_batch))
        .route("/roll/savedroll", get(list_saved))
        .route("/roll/savedroll/{rollname}", get(roll_saved).put(save_roll))
        .route("/roll/{expression}", get(roll_single))
}

/// GET /roll
async fn help() -> &'static str {
    HELP_TEXT
}

/// Batch roll request
#[derive(Debug, Deserialize)]
pub struct RollBatchRequest {
    pub rolls: Vec<RollRequest>,
}

/// One batch entry; exactly one of `result` or `error` is set
#[derive(Debug, Serialize)]
pub struct RollBatchEntry {
    pub request: RollRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RollResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// Batch roll response, aligned with the request's `rolls`
#[derive(Debug, Serialize)]
pub struct RollBatchResponse {
    pub results: Vec<RollBatchEntry>,
}

/// POST /roll
async fn roll_batch(
    State(state): State<AppState>,
    payload: Result<Json<RollBatchRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return invalid_body(rejection),
    };

    if req.rolls.len() > MAX_BATCH_SIZE {
        warn!("Rejected batch of {} rolls", req.rolls.len());
        let body = ErrorResponse::new(
            "batch_too_large",
            format!(
                "batch of {} rolls exceeds the limit of {}",
                req.rolls.len(),
                MAX_BATCH_SIZE
            ),
        );
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    let mut rng = state.request_rng();
    let items = dice::roll_batch(req.rolls, &state.saved_rolls, &mut rng);

    let results = items
        .into_iter()
        .map(|item| match item.outcome {
            Ok(result) => RollBatchEntry {
                request: item.request,
                result: Some(result),
                error: None,
            },
            Err(e) => RollBatchEntry {
                request: item.request,
                result: None,
                error: Some(ErrorResponse::from(&e)),
            },
        })
        .collect();

    (StatusCode::ACCEPTED, Json(RollBatchResponse { results })).into_response()
}

/// GET /roll/{expression}
async fn roll_single(
    State(state): State<AppState>,
    Path(expression): Path<String>,
) -> impl IntoResponse {
    let outcome = dice::roll_expression(&expression, &mut state.request_rng());

    match outcome {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&e))).into_response(),
    }
}

/// GET /roll/savedroll/{rollname}
async fn roll_saved(
    State(state): State<AppState>,
    Path(rollname): Path<String>,
) -> impl IntoResponse {
    let outcome = dice::roll_saved(&rollname, &state.saved_rolls, &mut state.request_rng());

    match outcome {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => (saved_roll_status(&e), Json(ErrorResponse::from(&e))).into_response(),
    }
}

/// Save roll request
#[derive(Debug, Deserialize)]
pub struct SaveRollRequest {
    pub expression: String,
}

/// A saved roll as reported by the API
#[derive(Debug, Serialize)]
pub struct SavedRollView {
    pub name: String,
    /// Expression as it was saved
    pub expression: String,
    pub canonical: String,
    pub min: i64,
    pub max: i64,
    pub average: i64,
}

impl From<SavedRoll> for SavedRollView {
    fn from(roll: SavedRoll) -> Self {
        Self {
            expression: roll.expression.source().to_string(),
            canonical: roll.expression.to_string(),
            min: roll.expression.min(),
            max: roll.expression.max(),
            average: roll.expression.average(),
            name: roll.name,
        }
    }
}

/// PUT /roll/savedroll/{rollname}
async fn save_roll(
    State(state): State<AppState>,
    Path(rollname): Path<String>,
    payload: Result<Json<SaveRollRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return invalid_body(rejection),
    };

    match state.saved_rolls.save(&rollname, &req.expression) {
        Ok(saved) => (StatusCode::ACCEPTED, Json(SavedRollView::from(saved))).into_response(),
        Err(e) => (saved_roll_status(&e), Json(ErrorResponse::from(&e))).into_response(),
    }
}

/// Saved roll listing
#[derive(Debug, Serialize)]
pub struct SavedRollListResponse {
    pub saved_rolls: Vec<SavedRollView>,
}

/// GET /roll/savedroll
async fn list_saved(State(state): State<AppState>) -> impl IntoResponse {
    Json(SavedRollListResponse {
        saved_rolls: state
            .saved_rolls
            .list()
            .into_iter()
            .map(SavedRollView::from)
            .collect(),
    })
}
