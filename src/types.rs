//! This module defines the core data structures and types used throughout the Turing Machine
//! engine, including symbols, head directions, transition rules, step and run outcomes, and
//! the error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single tape cell value.
pub type Symbol = char;

/// The conventional blank symbol used by every machine in the catalog.
pub const BLANK_SYMBOL: Symbol = '_';
/// The step bound front ends pass to [`crate::TuringMachine::run`] when the user gives none.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Represents the possible directions a Turing Machine head can move.
///
/// Serialized with the single-letter codes of the JSON definition format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    #[serde(rename = "L")]
    Left,
    /// Move the head one position to the right.
    #[serde(rename = "R")]
    Right,
    /// Keep the head in the same position.
    #[serde(rename = "N")]
    Stay,
}

impl Direction {
    /// Parses a direction code (`"L"`, `"R"` or `"N"`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Direction::Left),
            "R" => Some(Direction::Right),
            "N" => Some(Direction::Stay),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Stay => 'N',
        }
    }

    /// Arrow glyph used by the interactive front ends.
    pub fn arrow(self) -> char {
        match self {
            Direction::Left => '←',
            Direction::Right => '→',
            Direction::Stay => '•',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validated transition rule, the right-hand side of δ(state, symbol).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// The symbol written over the cell under the head.
    pub write: Symbol,
    /// Where the head moves after writing.
    pub direction: Direction,
    /// The state the machine enters.
    pub next_state: String,
}

/// Why a run ended in rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// The machine entered a state from the reject set.
    RejectState { state: String },
    /// δ(state, symbol) is undefined, so the machine got stuck outside the accept set.
    NoRule { state: String, symbol: Symbol },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::RejectState { state } => write!(f, "entered reject state {state}"),
            RejectReason::NoRule { state, symbol } => {
                write!(f, "no rule for state {state} reading '{symbol}'")
            }
        }
    }
}

/// The terminal verdict of a halted machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Accept { state: String },
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept { .. })
    }

    /// The short label shown to users, `ACCEPT` or `REJECT`.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Accept { .. } => "ACCEPT",
            Verdict::Reject(_) => "REJECT",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accept { state } => write!(f, "ACCEPT (reached {state})"),
            Verdict::Reject(reason) => write!(f, "REJECT ({reason})"),
        }
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A transition was applied and the machine is still running.
    Continue,
    /// This step halted the machine.
    Halt(Verdict),
    /// The machine had already halted; nothing was changed.
    AlreadyHalted,
}

/// The terminal status of a bounded run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Accept { state: String },
    Reject(RejectReason),
    /// The machine was still running after `max_steps` transitions.
    StepLimitExceeded { max_steps: usize },
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Accept { .. } => "ACCEPT",
            RunStatus::Reject(_) => "REJECT",
            RunStatus::StepLimitExceeded { .. } => "STEP_LIMIT_EXCEEDED",
        }
    }
}

impl From<Verdict> for RunStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept { state } => RunStatus::Accept { state },
            Verdict::Reject(reason) => RunStatus::Reject(reason),
        }
    }
}

/// A single broken invariant found while constructing a machine definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("machine declares no states")]
    NoStates,
    #[error("state '{0}' is declared more than once")]
    DuplicateState(String),
    #[error("start state '{0}' is not a declared state")]
    UnknownStartState(String),
    #[error("accept state '{0}' is not a declared state")]
    UnknownAcceptState(String),
    #[error("reject state '{0}' is not a declared state")]
    UnknownRejectState(String),
    #[error("state '{0}' is both an accept and a reject state")]
    AcceptRejectOverlap(String),
    #[error("blank symbol '{0}' must be exactly one character")]
    InvalidBlank(String),
    #[error("transitions are given for undeclared state '{0}'")]
    UnknownSourceState(String),
    #[error("rule ({state}, '{symbol}'): read symbol must be exactly one character")]
    InvalidReadSymbol { state: String, symbol: String },
    #[error("rule ({state}, '{symbol}'): write symbol '{write}' must be exactly one character")]
    InvalidWriteSymbol {
        state: String,
        symbol: String,
        write: String,
    },
    #[error("rule ({state}, '{symbol}'): direction '{direction}' is not one of L, R, N")]
    InvalidDirection {
        state: String,
        symbol: String,
        direction: String,
    },
    #[error("rule ({state}, '{symbol}'): target state '{target}' is not a declared state")]
    UnknownTargetState {
        state: String,
        symbol: String,
        target: String,
    },
    #[error("alphabet symbol '{0}' must be exactly one character")]
    InvalidAlphabetSymbol(String),
    #[error("blank symbol '{0}' cannot be part of the input alphabet")]
    BlankInAlphabet(Symbol),
}

/// A machine definition could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// The raw form could not be decoded at all.
    #[error("Malformed machine definition: {0}")]
    Malformed(String),
    /// The raw form decoded but broke one or more invariants. Every violation is listed.
    #[error("Invalid machine definition: {}", join_violations(.0))]
    Invalid(Vec<Violation>),
}

impl DefinitionError {
    /// Returns every violated invariant (empty for a malformed document).
    pub fn violations(&self) -> &[Violation] {
        match self {
            DefinitionError::Invalid(violations) => violations,
            DefinitionError::Malformed(_) => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The input string contains symbols outside the machine's input alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Input contains symbols outside the alphabet {{{}}}: {}",
    join_symbols(.permitted, ", "),
    quote_symbols(.invalid)
)]
pub struct AlphabetError {
    /// Offending characters, in order of first appearance.
    pub invalid: Vec<Symbol>,
    /// The permitted input alphabet, sorted.
    pub permitted: Vec<Symbol>,
}

fn join_symbols(symbols: &[Symbol], separator: &str) -> String {
    symbols
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn quote_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Malformed catalog: {0}")]
    Malformed(String),
    #[error("Catalog machine '{key}': {source}")]
    Definition {
        key: String,
        #[source]
        source: DefinitionError,
    },
    #[error("Catalog machine '{key}': example \"{example}\": {source}")]
    InvalidExample {
        key: String,
        example: String,
        #[source]
        source: AlphabetError,
    },
    #[error("Machine '{0}' not found in catalog")]
    UnknownMachine(String),
}

/// Errors raised while loading definitions or catalogs from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File error: {}: {message}", .path.display())]
    File { path: PathBuf, message: String },
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
