//! Saved roll registry
//!
//! Named, reusable dice expressions. Names are matched exactly and
//! case-sensitively; saving an existing name replaces it.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::parser::{parse, ParseError, RollExpression};

static ROLL_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap());

/// Saved roll errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SavedRollError {
    #[error("invalid saved roll name: '{0}'")]
    InvalidName(String),

    #[error("invalid expression for saved roll '{name}': {source}")]
    InvalidExpression {
        name: String,
        #[source]
        source: ParseError,
    },

    #[error("saved roll not found: {0}")]
    NotFound(String),
}

/// A named roll as stored in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRoll {
    pub name: String,
    pub expression: RollExpression,
}

/// Check that a saved roll name is usable as a key and URL segment
pub fn validate_roll_name(name: &str) -> Result<(), SavedRollError> {
    if ROLL_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(SavedRollError::InvalidName(name.to_string()))
    }
}

/// Registry of saved rolls for the process lifetime
#[derive(Debug, Default)]
pub struct SavedRollRegistry {
    rolls: RwLock<HashMap<String, RollExpression>>,
}

impl SavedRollRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Validate and store an expression under `name`, replacing any previous one
    pub fn save(&self, name: &str, expression: &str) -> Result<SavedRoll, SavedRollError> {
        validate_roll_name(name)?;
        let parsed = parse(expression).map_err(|source| SavedRollError::InvalidExpression {
            name: name.to_string(),
            source,
        })?;

        let previous = self
            .rolls
            .write()
            .insert(name.to_string(), parsed.clone());
        match previous {
            Some(old) => debug!("Saved roll {} replaced: {} -> {}", name, old, parsed),
            None => debug!("Saved roll {} created: {}", name, parsed),
        }

        Ok(SavedRoll {
            name: name.to_string(),
            expression: parsed,
        })
    }

    /// Look up the expression saved under `name`
    pub fn resolve(&self, name: &str) -> Result<RollExpression, SavedRollError> {
        self.rolls
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SavedRollError::NotFound(name.to_string()))
    }

    /// All saved rolls, sorted by name
    pub fn list(&self) -> Vec<SavedRoll> {
        let mut rolls: Vec<SavedRoll> = self
            .rolls
            .read()
            .iter()
            .map(|(name, expression)| SavedRoll {
                name: name.clone(),
                expression: expression.clone(),
            })
            .collect();
        rolls.sort_by(|a, b| a.name.cmp(&b.name));
        rolls
    }

    /// Number of saved rolls
    pub fn len(&self) -> usize {
        self.rolls.read().len()
    }

    /// Whether no rolls are saved
    pub fn is_empty(&self) -> bool {
        self.rolls.read().is_empty()
    }
}
