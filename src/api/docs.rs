//! API documentation
//!
//! Serves a Swagger 2.0 document assembled from a static route table.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Map, Value};

use super::AppState;

/// One documented operation
struct RouteDoc {
    path: &'static str,
    method: &'static str,
    tag: &'static str,
    summary: &'static str,
    /// (name, description) of a path parameter
    path_param: Option<(&'static str, &'static str)>,
    /// (definition, description) of the JSON body
    body: Option<(&'static str, &'static str)>,
    status: &'static str,
    response: &'static str,
    /// Response definition, if the response has a JSON body
    schema: Option<&'static str>,
}

const ROUTES: &[RouteDoc] = &[
    RouteDoc {
        path: "/init",
        method: "get",
        tag: "Initiative",
        summary: "Print help text",
        path_param: None,
        body: None,
        status: "200",
        response: "The help text",
        schema: None,
    },
    RouteDoc {
        path: "/init",
        method: "post",
        tag: "Initiative",
        summary: "Add an entity to the initiative order",
        path_param: None,
        body: Some(("InitiativeAddEntityRequest", "Entity to add")),
        status: "202",
        response: "The added entity",
        schema: Some("InitiativeEntry"),
    },
    RouteDoc {
        path: "/init/entity/{entity}",
        method: "get",
        tag: "Initiative",
        summary: "Describe an initiative entity",
        path_param: Some(("entity", "Entity to describe")),
        body: None,
        status: "200",
        response: "The desired entity",
        schema: Some("InitiativeEntry"),
    },
    RouteDoc {
        path: "/init/entity/{entity}",
        method: "delete",
        tag: "Initiative",
        summary: "Remove an entity from the initiative order",
        path_param: Some(("entity", "Entity to remove")),
        body: None,
        status: "202",
        response: "The deleted entity",
        schema: Some("InitiativeEntry"),
    },
    RouteDoc {
        path: "/init/list",
        method: "get",
        tag: "Initiative",
        summary: "Get the entire current initiative order",
        path_param: None,
        body: None,
        status: "200",
        response: "The current initiative order",
        schema: Some("InitiativeListEntitiesResponse"),
    },
    RouteDoc {
        path: "/init/clear",
        method: "delete",
        tag: "Initiative",
        summary: "Clear the current initiative order",
        path_param: None,
        body: None,
        status: "202",
        response: "Success",
        schema: Some("InitiativeClearResponse"),
    },
    RouteDoc {
        path: "/roll",
        method: "get",
        tag: "Roll",
        summary: "Prints help text",
        path_param: None,
        body: None,
        status: "200",
        response: "Help text",
        schema: None,
    },
    RouteDoc {
        path: "/roll",
        method: "post",
        tag: "Roll",
        summary: "Make the roll(s) contained in the request's body",
        path_param: None,
        body: Some(("RollBatchRequest", "Roll(s) to make")),
        status: "202",
        response: "Roll results",
        schema: Some("RollBatchResponse"),
    },
    RouteDoc {
        path: "/roll/{roll}",
        method: "get",
        tag: "Roll",
        summary: "Make a single roll contained in the request's URI",
        path_param: Some(("roll", "Dice expression, e.g. 2d6+3")),
        body: None,
        status: "200",
        response: "Roll results",
        schema: Some("RollResult"),
    },
    RouteDoc {
        path: "/roll/savedroll",
        method: "get",
        tag: "Roll",
        summary: "List saved rolls",
        path_param: None,
        body: None,
        status: "200",
        response: "Saved rolls sorted by name",
        schema: Some("SavedRollListResponse"),
    },
    RouteDoc {
        path: "/roll/savedroll/{rollname}",
        method: "get",
        tag: "Roll",
        summary: "Make a saved roll",
        path_param: Some(("rollname", "Name of the saved roll")),
        body: None,
        status: "200",
        response: "Roll results",
        schema: Some("RollResult"),
    },
    RouteDoc {
        path: "/roll/savedroll/{rollname}",
        method: "put",
        tag: "Roll",
        summary: "Save a named roll, replacing any previous one",
        path_param: Some(("rollname", "Name of the saved roll")),
        body: Some(("SaveRollRequest", "Expression to save")),
        status: "202",
        response: "The saved roll",
        schema: Some("SavedRoll"),
    },
];

fn operation(route: &RouteDoc) -> Value {
    let mut parameters = Vec::new();
    if let Some((name, description)) = route.path_param {
        parameters.push(json!({
            "name": name,
            "in": "path",
            "description": description,
            "required": true,
            "type": "string",
        }));
    }
    if let Some((definition, description)) = route.body {
        parameters.push(json!({
            "name": "body",
            "in": "body",
            "description": description,
            "required": true,
            "schema": { "$ref": format!("#/definitions/{}", definition) },
        }));
    }

    let mut response = json!({ "description": route.response });
    if let Some(schema) = route.schema {
        response["schema"] = json!({ "$ref": format!("#/definitions/{}", schema) });
    }

    let mut op = json!({
        "summary": route.summary,
        "tags": [route.tag],
        "responses": { route.status: response },
    });
    if !parameters.is_empty() {
        op["parameters"] = Value::Array(parameters);
    }
    op
}

fn definitions() -> Value {
    json!({
        "InitiativeAddEntityRequest": {
            "type": "object",
            "required": ["entityName", "initiativeValue"],
            "properties": {
                "entityName": { "type": "string" },
                "initiativeValue": { "type": "integer" },
            },
        },
        "InitiativeEntry": {
            "type": "object",
            "properties": {
                "entityName": { "type": "string" },
                "initiativeValue": { "type": "integer" },
                "insertionSequence": { "type": "integer" },
            },
        },
        "InitiativeListEntitiesResponse": {
            "type": "object",
            "properties": {
                "entities": {
                    "type": "array",
                    "items": { "$ref": "#/definitions/InitiativeEntry" },
                },
            },
        },
        "InitiativeClearResponse": {
            "type": "object",
            "properties": { "removed": { "type": "integer" } },
        },
        "RollRequest": {
            "description": "A dice expression string, {\"expression\": ...} or {\"saved_roll\": ...}",
            "type": "object",
            "properties": {
                "expression": { "type": "string" },
                "saved_roll": { "type": "string" },
            },
        },
        "RollBatchRequest": {
            "type": "object",
            "required": ["rolls"],
            "properties": {
                "rolls": {
                    "type": "array",
                    "items": { "$ref": "#/definitions/RollRequest" },
                },
            },
        },
        "TermBreakdown": {
            "type": "object",
            "properties": {
                "type": { "type": "string", "enum": ["dice", "constant"] },
                "sign": { "type": "string", "enum": ["+", "-"] },
                "count": { "type": "integer" },
                "sides": { "type": "integer" },
                "faces": { "type": "array", "items": { "type": "integer" } },
                "value": { "type": "integer" },
            },
        },
        "RollResult": {
            "type": "object",
            "properties": {
                "expression": { "type": "string" },
                "total": { "type": "integer" },
                "breakdown": {
                    "type": "array",
                    "items": { "$ref": "#/definitions/TermBreakdown" },
                },
            },
        },
        "Error": {
            "type": "object",
            "properties": {
                "error": { "type": "string" },
                "message": { "type": "string" },
                "position": { "type": "integer" },
                "fragment": { "type": "string" },
            },
        },
        "RollBatchResponse": {
            "type": "object",
            "properties": {
                "results": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "request": { "$ref": "#/definitions/RollRequest" },
                            "result": { "$ref": "#/definitions/RollResult" },
                            "error": { "$ref": "#/definitions/Error" },
                        },
                    },
                },
            },
        },
        "SaveRollRequest": {
            "type": "object",
            "required": ["expression"],
            "properties": { "expression": { "type": "string" } },
        },
        "SavedRoll": {
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "expression": { "type": "string" },
                "canonical": { "type": "string" },
                "min": { "type": "integer" },
                "max": { "type": "integer" },
                "average": { "type": "integer" },
            },
        },
        "SavedRollListResponse": {
            "type": "object",
            "properties": {
                "saved_rolls": {
                    "type": "array",
                    "items": { "$ref": "#/definitions/SavedRoll" },
                },
            },
        },
    })
}

/// Build the Swagger document advertising `host`
pub fn swagger_document(host: &str) -> Value {
    let mut paths: Map<String, Value> = Map::new();
    for route in ROUTES {
        let entry = paths
            .entry(route.path)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = entry {
            methods.insert(route.method.to_string(), operation(route));
        }
    }

    json!({
        "swagger": "2.0",
        "host": host,
        "schemes": ["http"],
        "info": {
            "title": "DungeonBot",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "tags": [
            { "name": "Initiative", "description": "Methods related to the initiative tracker" },
            { "name": "Roll", "description": "Methods related to rolling dice" },
        ],
        "paths": paths,
        "definitions": definitions(),
    })
}

/// Build docs router
pub fn router() -> Router<AppState> {
    Router::new().route("/swagger.json", get(swagger_json))
}

/// GET /swagger.json
async fn swagger_json(State(state): State<AppState>) -> Json<Value> {
    Json(swagger_document(&state.docs_host))
}
