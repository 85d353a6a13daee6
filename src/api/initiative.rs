//! Initiative API endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{initiative_status, invalid_body, AppState, ErrorResponse};
use crate::initiative::InitiativeEntry;

const HELP_TEXT: &str = "\
Initiative tracker

  GET    /init                  this help text
  POST   /init                  add an entity: {\"entityName\": \"Goblin\", \"initiativeValue\": 12}
  GET    /init/entity/{entity}  describe an entity
  DELETE /init/entity/{entity}  remove an entity
  GET    /init/list             the current turn order
  DELETE /init/clear            remove every entity

Higher initiative acts first; on a tie, the entity added first acts first.
Entity names are unique; remove an entity before re-adding it with a new value.
";

/// Build initiative router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/init", get(help).post(add_entity))
        .route("/init/entity/{entity}", get(get_entity).delete(remove_entity))
        .route("/init/list", get(list_entities))
        .route("/init/clear", delete(clear))
}

/// GET /init
async fn help() -> &'static str {
    HELP_TEXT
}

/// Add entity request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntityRequest {
    pub entity_name: String,
    pub initiative_value: i64,
}

/// POST /init
async fn add_entity(
    State(state): State<AppState>,
    payload: Result<Json<AddEntityRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return invalid_body(rejection),
    };

    match state.initiative.add(&req.entity_name, req.initiative_value) {
        Ok(entry) => (StatusCode::ACCEPTED, Json(entry)).into_response(),
        Err(e) => (initiative_status(&e), Json(ErrorResponse::from(&e))).into_response(),
    }
}

/// GET /init/entity/{entity}
async fn get_entity(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> impl IntoResponse {
    match state.initiative.get(&entity) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(e) => (initiative_status(&e), Json(ErrorResponse::from(&e))).into_response(),
    }
}

/// DELETE /init/entity/{entity}
async fn remove_entity(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> impl IntoResponse {
    match state.initiative.remove(&entity) {
        Ok(entry) => (StatusCode::ACCEPTED, Json(entry)).into_response(),
        Err(e) => (initiative_status(&e), Json(ErrorResponse::from(&e))).into_response(),
    }
}

/// Turn order response
#[derive(Debug, Serialize)]
pub struct ListEntitiesResponse {
    pub entities: Vec<InitiativeEntry>,
}

/// GET /init/list
async fn list_entities(State(state): State<AppState>) -> impl IntoResponse {
    Json(ListEntitiesResponse {
        entities: state.initiative.list(),
    })
}

/// Clear response
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// DELETE /init/clear
async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    let removed = state.initiative.clear();
    (StatusCode::ACCEPTED, Json(ClearResponse { removed }))
}
