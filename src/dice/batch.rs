//! Roll orchestration
//!
//! Resolves and evaluates ad hoc or saved roll requests, either one at a
//! time or as a batch whose items fail independently.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::eval::{evaluate, RandomSource, RollResult};
use super::parser::{parse, ParseError, RollExpression};
use super::saved::{SavedRollError, SavedRollRegistry};

/// Largest number of requests accepted in one batch
pub const MAX_BATCH_SIZE: usize = 50;

/// One roll to make
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RollRequest {
    /// A dice expression given inline
    Adhoc { expression: String },
    /// A reference to a saved roll
    Named { saved_roll: String },
    /// JSON that matches no request form; echoed back as received
    Invalid(Value),
}

/// Accepted JSON forms of a roll request
#[derive(Deserialize)]
#[serde(untagged)]
enum RollRequestBody {
    Text(String),
    Adhoc { expression: String },
    Named { saved_roll: String },
    Invalid(Value),
}

impl From<RollRequestBody> for RollRequest {
    fn from(body: RollRequestBody) -> Self {
        match body {
            RollRequestBody::Text(expression) | RollRequestBody::Adhoc { expression } => {
                RollRequest::Adhoc { expression }
            }
            RollRequestBody::Named { saved_roll } => RollRequest::Named { saved_roll },
            RollRequestBody::Invalid(value) => RollRequest::Invalid(value),
        }
    }
}

impl<'de> Deserialize<'de> for RollRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RollRequestBody::deserialize(deserializer).map(Into::into)
    }
}

impl RollRequest {
    /// Ad hoc request for an inline expression
    pub fn adhoc(expression: impl Into<String>) -> Self {
        RollRequest::Adhoc {
            expression: expression.into(),
        }
    }

    /// Request for a saved roll
    pub fn named(name: impl Into<String>) -> Self {
        RollRequest::Named {
            saved_roll: name.into(),
        }
    }
}

/// Why a single roll request failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    SavedRoll(#[from] SavedRollError),

    #[error("invalid roll request: {0}")]
    InvalidRequest(String),
}

/// A batch entry: the request and what came of it
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub request: RollRequest,
    pub outcome: Result<RollResult, RollError>,
}

/// Parse and roll one inline expression
pub fn roll_expression<S: RandomSource + ?Sized>(
    text: &str,
    rng: &mut S,
) -> Result<RollResult, ParseError> {
    let expr = parse(text)?;
    Ok(evaluate(&expr, rng))
}

/// Resolve and roll one saved roll
pub fn roll_saved<S: RandomSource + ?Sized>(
    name: &str,
    registry: &SavedRollRegistry,
    rng: &mut S,
) -> Result<RollResult, SavedRollError> {
    let expr = registry.resolve(name)?;
    Ok(evaluate(&expr, rng))
}

fn resolve(
    request: &RollRequest,
    registry: &SavedRollRegistry,
) -> Result<RollExpression, RollError> {
    match request {
        RollRequest::Adhoc { expression } => Ok(parse(expression)?),
        RollRequest::Named { saved_roll } => Ok(registry.resolve(saved_roll)?),
        RollRequest::Invalid(value) => Err(RollError::InvalidRequest(value.to_string())),
    }
}

/// Roll every request in order
///
/// The output is positionally aligned with the input; a failing request
/// yields an error entry and does not affect its siblings. Callers are
/// expected to keep batches within [`MAX_BATCH_SIZE`].
pub fn roll_batch<S: RandomSource + ?Sized>(
    requests: Vec<RollRequest>,
    registry: &SavedRollRegistry,
    rng: &mut S,
) -> Vec<BatchItem> {
    let items: Vec<BatchItem> = requests
        .into_iter()
        .map(|request| {
            let outcome = resolve(&request, registry).map(|expr| evaluate(&expr, rng));
            BatchItem { request, outcome }
        })
        .collect();

    let failed = items.iter().filter(|i| i.outcome.is_err()).count();
    debug!("Rolled batch of {} ({} failed)", items.len(), failed);
    items
}
