//! Dice evaluation
//!
//! Rolls a parsed [`RollExpression`] against an injected [`RandomSource`].
//! Evaluation never fails: every error case is caught by the parser.

use std::collections::VecDeque;

use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;
use serde::Serialize;

use super::parser::{RollExpression, Sign, Term};

/// Source of die faces
pub trait RandomSource {
    /// Draw a uniform value in `1..=sides`
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl RandomSource for StdRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.random_range(1..=sides)
    }
}

impl RandomSource for ThreadRng {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.random_range(1..=sides)
    }
}

/// Replays a queue of predetermined faces, then defers to a fallback RNG
///
/// Each queued face must lie in `1..=sides` for the die it lands on. Debug
/// builds panic on a face outside that range; release builds clamp it.
#[derive(Debug)]
pub struct ScriptedSource<R = StdRng> {
    queue: VecDeque<u32>,
    fallback: R,
}

impl ScriptedSource<StdRng> {
    /// Script the given faces, falling back to a fixed-seed RNG
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        use rand::SeedableRng;
        Self::with_fallback(faces, StdRng::seed_from_u64(0))
    }
}

impl<R: RandomSource> ScriptedSource<R> {
    /// Script the given faces with an explicit fallback source
    pub fn with_fallback(faces: impl IntoIterator<Item = u32>, fallback: R) -> Self {
        Self {
            queue: faces.into_iter().collect(),
            fallback,
        }
    }

    /// Faces still waiting to be replayed
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl<R: RandomSource> RandomSource for ScriptedSource<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        match self.queue.pop_front() {
            Some(face) => {
                debug_assert!(
                    (1..=sides).contains(&face),
                    "scripted face {} out of range for d{}",
                    face,
                    sides
                );
                face.clamp(1, sides)
            }
            None => self.fallback.roll_die(sides),
        }
    }
}

/// Outcome of one term of a roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TermBreakdown {
    /// Individual faces rolled for a die group
    Dice {
        sign: Sign,
        count: u32,
        sides: u32,
        faces: Vec<u32>,
    },
    /// A flat value
    Constant { sign: Sign, value: u32 },
}

impl TermBreakdown {
    /// Raw values for this term, before the sign is applied
    pub fn values(&self) -> Vec<u32> {
        match self {
            TermBreakdown::Dice { faces, .. } => faces.clone(),
            TermBreakdown::Constant { value, .. } => vec![*value],
        }
    }

    /// This term's signed share of the total
    pub fn contribution(&self) -> i64 {
        match self {
            TermBreakdown::Dice { sign, faces, .. } => {
                sign.apply(faces.iter().map(|&f| i64::from(f)).sum())
            }
            TermBreakdown::Constant { sign, value } => sign.apply(i64::from(*value)),
        }
    }
}

/// Result of evaluating a [`RollExpression`]
///
/// `total` is always the sum of every term's signed contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollResult {
    /// Canonical form of the rolled expression
    pub expression: String,
    pub total: i64,
    pub breakdown: Vec<TermBreakdown>,
}

impl std::fmt::Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .breakdown
            .iter()
            .map(|b| {
                let values: Vec<String> = b.values().iter().map(|v| v.to_string()).collect();
                format!("[{}]", values.join(", "))
            })
            .collect();
        write!(f, "{} = {} {}", self.expression, self.total, parts.join(" "))
    }
}

/// Roll every term of `expr` using `rng`
pub fn evaluate<S: RandomSource + ?Sized>(expr: &RollExpression, rng: &mut S) -> RollResult {
    let breakdown: Vec<TermBreakdown> = expr
        .terms()
        .iter()
        .map(|t| match t.term {
            Term::DieGroup { count, sides } => TermBreakdown::Dice {
                sign: t.sign,
                count,
                sides,
                faces: (0..count).map(|_| rng.roll_die(sides)).collect(),
            },
            Term::Constant(value) => TermBreakdown::Constant {
                sign: t.sign,
                value,
            },
        })
        .collect();

    let total = breakdown.iter().map(TermBreakdown::contribution).sum();

    RollResult {
        expression: expr.to_string(),
        total,
        breakdown,
    }
}

impl RollExpression {
    /// Roll this expression; shorthand for [`evaluate`]
    pub fn roll<S: RandomSource + ?Sized>(&self, rng: &mut S) -> RollResult {
        evaluate(self, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::parse;
    use rand::SeedableRng;

    #[test]
    fn test_scripted_roll() {
        let expr = parse("2d6+3").unwrap();
        let mut rng = ScriptedSource::new([4, 5]);
        let result = evaluate(&expr, &mut rng);

        assert_eq!(result.total, 12);
        let values: Vec<Vec<u32>> = result.breakdown.iter().map(|b| b.values()).collect();
        assert_eq!(values, vec![vec![4, 5], vec![3]]);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_negative_terms() {
        let expr = parse("1d20-1d4-2").unwrap();
        let mut rng = ScriptedSource::new([15, 3]);
        let result = expr.roll(&mut rng);

        assert_eq!(result.total, 10);
        assert_eq!(result.breakdown[1].contribution(), -3);
        assert_eq!(result.breakdown[2].contribution(), -2);
    }

    #[test]
    fn test_total_can_go_negative() {
        let expr = parse("1d4-10").unwrap();
        let mut rng = ScriptedSource::new([1]);
        assert_eq!(evaluate(&expr, &mut rng).total, -9);
    }

    #[test]
    fn test_roll_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for (count, sides) in [(1, 2), (2, 6), (3, 20), (10, 100)] {
            let expr = parse(&format!("{}d{}", count, sides)).unwrap();
            for _ in 0..100 {
                let result = evaluate(&expr, &mut rng);
                let faces = result.breakdown[0].values();
                assert_eq!(faces.len(), count as usize);
                assert!(faces.iter().all(|&f| f >= 1 && f <= sides));
                let sum: u32 = faces.iter().sum();
                assert_eq!(result.total, i64::from(sum));
            }
        }
    }

    #[test]
    fn test_seeded_rolls_repeat() {
        let expr = parse("4d6+1d8").unwrap();
        let a = evaluate(&expr, &mut StdRng::seed_from_u64(7));
        let b = evaluate(&expr, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_thread_rng_source() {
        let expr = parse("3d6").unwrap();
        let result = evaluate(&expr, &mut rand::rng());
        assert!((3..=18).contains(&result.total));
    }

    #[test]
    fn test_scripted_falls_back() {
        let mut rng = ScriptedSource::new([6, 1]);
        assert_eq!(rng.roll_die(6), 6);
        assert_eq!(rng.roll_die(6), 1);
        assert_eq!(rng.remaining(), 0);
        let face = rng.roll_die(6);
        assert!((1..=6).contains(&face));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range for d6")]
    fn test_scripted_face_out_of_range() {
        let mut rng = ScriptedSource::new([9]);
        rng.roll_die(6);
    }

    #[test]
    fn test_display() {
        let expr = parse("2d6 + 3").unwrap();
        let result = evaluate(&expr, &mut ScriptedSource::new([4, 5]));
        assert_eq!(result.to_string(), "2d6+3 = 12 [4, 5] [3]");
    }

    #[test]
    fn test_serialized_shape() {
        let expr = parse("1d6-2").unwrap();
        let result = evaluate(&expr, &mut ScriptedSource::new([5]));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["total"], 3);
        assert_eq!(json["expression"], "1d6-2");
        assert_eq!(json["breakdown"][0]["type"], "dice");
        assert_eq!(json["breakdown"][0]["faces"], serde_json::json!([5]));
        assert_eq!(json["breakdown"][1]["type"], "constant");
        assert_eq!(json["breakdown"][1]["sign"], "-");
    }
}
