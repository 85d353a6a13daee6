//! Dice notation parser
//!
//! Parses roll formulas like "2d6+3", "1d20", "4d6 - 2 + 1d4" into a
//! [`RollExpression`]:
//!
//! ```text
//! expr := term (('+' | '-') term)*
//! term := INTEGER 'd' INTEGER | INTEGER
//! ```
//!
//! Whitespace around operators is ignored and the `d` is case-insensitive.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Largest number of dice a single term may roll
pub const MAX_DICE_PER_TERM: u32 = 1000;

/// Largest number of dice a whole expression may roll
pub const MAX_DICE_PER_EXPRESSION: u32 = 2000;

/// Sign applied to a term's contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Sign {
    /// Apply this sign to a value
    pub fn apply(self, value: i64) -> i64 {
        match self {
            Sign::Plus => value,
            Sign::Minus => -value,
        }
    }

    fn symbol(self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }
}

/// A single unsigned term of a roll formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    /// `count` dice with `sides` faces each
    DieGroup { count: u32, sides: u32 },
    /// A flat value
    Constant(u32),
}

impl Term {
    fn min(&self) -> i64 {
        match *self {
            Term::DieGroup { count, .. } => i64::from(count),
            Term::Constant(value) => i64::from(value),
        }
    }

    fn max(&self) -> i64 {
        match *self {
            Term::DieGroup { count, sides } => i64::from(count) * i64::from(sides),
            Term::Constant(value) => i64::from(value),
        }
    }

    fn mean(&self) -> f64 {
        match *self {
            Term::DieGroup { count, sides } => f64::from(count) * (1.0 + f64::from(sides)) / 2.0,
            Term::Constant(value) => f64::from(value),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::DieGroup { count, sides } => write!(f, "{}d{}", count, sides),
            Term::Constant(value) => write!(f, "{}", value),
        }
    }
}

/// A term together with the operator that precedes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedTerm {
    pub sign: Sign,
    pub term: Term,
}

/// A parsed dice formula
///
/// Always holds at least one term. The original text is kept for display
/// alongside the structured terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollExpression {
    source: String,
    terms: Vec<SignedTerm>,
}

impl RollExpression {
    /// The text this expression was parsed from (trimmed)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The terms in formula order; the first is always positive
    pub fn terms(&self) -> &[SignedTerm] {
        &self.terms
    }

    /// Lowest possible total
    pub fn min(&self) -> i64 {
        self.terms
            .iter()
            .map(|t| match t.sign {
                Sign::Plus => t.term.min(),
                Sign::Minus => -t.term.max(),
            })
            .sum()
    }

    /// Highest possible total
    pub fn max(&self) -> i64 {
        self.terms
            .iter()
            .map(|t| match t.sign {
                Sign::Plus => t.term.max(),
                Sign::Minus => -t.term.min(),
            })
            .sum()
    }

    /// Expected average total (rounded down)
    pub fn average(&self) -> i64 {
        let mean: f64 = self
            .terms
            .iter()
            .map(|t| match t.sign {
                Sign::Plus => t.term.mean(),
                Sign::Minus => -t.term.mean(),
            })
            .sum();
        mean.floor() as i64
    }
}

impl FromStr for RollExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Canonical form: lowercase `d`, no whitespace
impl fmt::Display for RollExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", t.sign.symbol())?;
            }
            write!(f, "{}", t.term)?;
        }
        Ok(())
    }
}

/// What went wrong while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    EmptyInput,
    MalformedTerm,
    NonPositiveCount,
    InvalidSides,
    TrailingGarbage,
    TooManyDice,
}

impl ParseErrorKind {
    /// Stable identifier used in API error bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::EmptyInput => "empty_input",
            ParseErrorKind::MalformedTerm => "malformed_term",
            ParseErrorKind::NonPositiveCount => "non_positive_count",
            ParseErrorKind::InvalidSides => "invalid_sides",
            ParseErrorKind::TrailingGarbage => "trailing_garbage",
            ParseErrorKind::TooManyDice => "too_many_dice",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseErrorKind::EmptyInput => "empty dice expression",
            ParseErrorKind::MalformedTerm => "malformed term",
            ParseErrorKind::NonPositiveCount => "dice count must be at least 1",
            ParseErrorKind::InvalidSides => "dice must have at least 2 sides",
            ParseErrorKind::TrailingGarbage => "unexpected input",
            ParseErrorKind::TooManyDice => "too many dice",
        };
        f.write_str(msg)
    }
}

/// A dice notation error, pointing at the offending input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at position {position}: '{fragment}'")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset into the original input
    pub position: usize,
    /// The offending substring
    pub fragment: String,
}

impl ParseError {
    fn new(kind: ParseErrorKind, position: usize, fragment: &str) -> Self {
        Self {
            kind,
            position,
            fragment: fragment.to_string(),
        }
    }
}

/// Parse a dice notation string like "2d6+3"
pub fn parse(text: &str) -> Result<RollExpression, ParseError> {
    let mut cursor = Cursor::new(text);
    cursor.skip_whitespace();
    if cursor.at_end() {
        return Err(ParseError::new(ParseErrorKind::EmptyInput, 0, ""));
    }

    let mut terms = vec![SignedTerm {
        sign: Sign::Plus,
        term: cursor.term()?,
    }];

    loop {
        cursor.skip_whitespace();
        let sign = match cursor.peek() {
            None => break,
            Some('+') => Sign::Plus,
            Some('-') => Sign::Minus,
            Some(_) => {
                return Err(ParseError::new(
                    ParseErrorKind::TrailingGarbage,
                    cursor.pos,
                    cursor.rest().trim_end(),
                ))
            }
        };
        cursor.bump();
        cursor.skip_whitespace();
        terms.push(SignedTerm {
            sign,
            term: cursor.term()?,
        });
    }

    Ok(RollExpression {
        source: text.trim().to_string(),
        terms,
    })
}

/// Byte-offset scanner over the input
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    /// Dice accepted so far across all terms
    dice: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            dice: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn digits(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Consume up to the next operator or whitespace
    fn word(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && c != '+' && c != '-')
        {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn term(&mut self) -> Result<Term, ParseError> {
        let start = self.pos;
        let count_digits = self.digits();

        if !matches!(self.peek(), Some('d' | 'D')) {
            if count_digits.is_empty() {
                let word = self.word();
                return Err(ParseError::new(ParseErrorKind::MalformedTerm, start, word));
            }
            let value = count_digits.parse().map_err(|_| {
                ParseError::new(ParseErrorKind::MalformedTerm, start, count_digits)
            })?;
            return Ok(Term::Constant(value));
        }

        self.bump();
        let sides_start = self.pos;
        let sides_digits = self.digits();
        let text = &self.src[start..self.pos];

        if count_digits.is_empty() || sides_digits.is_empty() {
            return Err(ParseError::new(ParseErrorKind::MalformedTerm, start, text));
        }

        let count: u32 = count_digits
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::MalformedTerm, start, text))?;
        if count == 0 {
            return Err(ParseError::new(
                ParseErrorKind::NonPositiveCount,
                start,
                count_digits,
            ));
        }
        if count > MAX_DICE_PER_TERM {
            return Err(ParseError::new(ParseErrorKind::TooManyDice, start, count_digits));
        }
        if self.dice + count > MAX_DICE_PER_EXPRESSION {
            return Err(ParseError::new(ParseErrorKind::TooManyDice, start, text));
        }

        let sides: u32 = sides_digits
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::MalformedTerm, start, text))?;
        if sides < 2 {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSides,
                sides_start,
                sides_digits,
            ));
        }

        self.dice += count;
        Ok(Term::DieGroup { count, sides })
    }
}
