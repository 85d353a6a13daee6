//! Initiative tracking
//!
//! Keeps the turn order for an encounter:
//! - Entities are unique by name and carry an integer initiative value
//! - Higher values act first; ties go to whoever was added first
//! - The order is computed when listed, never stored sorted
//!
//! Every operation takes the tracker lock for its whole duration, so a
//! failed call never leaves partial changes behind.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Initiative tracker errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitiativeError {
    #[error("entity name must not be empty")]
    EmptyName,

    #[error("entity already in initiative order: {0}")]
    DuplicateName(String),

    #[error("entity not found: {0}")]
    NotFound(String),
}

/// An entity's place in the initiative order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativeEntry {
    pub entity_name: String,
    pub initiative_value: i64,
    /// Assigned at add time; breaks ties between equal values
    pub insertion_sequence: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    entries: HashMap<String, InitiativeEntry>,
    next_sequence: u64,
}

/// Shared initiative order
#[derive(Debug, Default)]
pub struct InitiativeTracker {
    state: Mutex<TrackerState>,
}

impl InitiativeTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add an entity to the order
    ///
    /// Names are trimmed. Re-adding an existing name is rejected; remove the
    /// entity first to change its value.
    pub fn add(&self, name: &str, value: i64) -> Result<InitiativeEntry, InitiativeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InitiativeError::EmptyName);
        }

        let mut state = self.state.lock();
        if state.entries.contains_key(name) {
            return Err(InitiativeError::DuplicateName(name.to_string()));
        }

        let entry = InitiativeEntry {
            entity_name: name.to_string(),
            initiative_value: value,
            insertion_sequence: state.next_sequence,
        };
        state.next_sequence += 1;
        state.entries.insert(entry.entity_name.clone(), entry.clone());

        debug!(
            "Initiative add: {} at {} (seq {})",
            entry.entity_name, entry.initiative_value, entry.insertion_sequence
        );
        Ok(entry)
    }

    /// Describe one entity
    pub fn get(&self, name: &str) -> Result<InitiativeEntry, InitiativeError> {
        let name = name.trim();
        self.state
            .lock()
            .entries
            .get(name)
            .cloned()
            .ok_or_else(|| InitiativeError::NotFound(name.to_string()))
    }

    /// Remove an entity; other entries keep their sequence numbers
    pub fn remove(&self, name: &str) -> Result<InitiativeEntry, InitiativeError> {
        let name = name.trim();
        let entry = self
            .state
            .lock()
            .entries
            .remove(name)
            .ok_or_else(|| InitiativeError::NotFound(name.to_string()))?;

        debug!("Initiative remove: {}", entry.entity_name);
        Ok(entry)
    }

    /// The current turn order
    ///
    /// Sorted by initiative value descending, then by insertion sequence
    /// ascending.
    pub fn list(&self) -> Vec<InitiativeEntry> {
        let mut entries: Vec<InitiativeEntry> =
            self.state.lock().entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            b.initiative_value
                .cmp(&a.initiative_value)
                .then(a.insertion_sequence.cmp(&b.insertion_sequence))
        });
        entries
    }

    /// Empty the order and reset the sequence counter
    ///
    /// Returns how many entries were removed.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let removed = state.entries.len();
        *state = TrackerState::default();

        info!("Initiative cleared ({} entries)", removed);
        removed
    }

    /// Number of tracked entities
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the order is empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}
