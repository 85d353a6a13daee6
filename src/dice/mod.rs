//! Dice rolling system
//!
//! - Parsing dice notation (e.g., "2d6+3", "1d20 - 1d4")
//! - Evaluation against an injected random source
//! - Saved, named rolls
//! - Single and batch roll orchestration

mod batch;
mod eval;
mod parser;
mod saved;

pub use batch::{
    roll_batch, roll_expression, roll_saved, BatchItem, RollError, RollRequest, MAX_BATCH_SIZE,
};
pub use eval::{evaluate, RandomSource, RollResult, ScriptedSource, TermBreakdown};
pub use parser::{
    parse, ParseError, ParseErrorKind, RollExpression, Sign, SignedTerm, Term,
    MAX_DICE_PER_EXPRESSION, MAX_DICE_PER_TERM,
};
pub use saved::{validate_roll_name, SavedRoll, SavedRollError, SavedRollRegistry};
