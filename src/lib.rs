//! This crate provides the core logic for a single-tape deterministic Turing machine simulator
//! used to teach formal-language theory.
//! It includes modules for validating machine definitions, stepping or running a machine on an
//! input, analyzing definitions for likely mistakes, and managing a catalog of predefined machines.

pub mod analyzer;
pub mod catalog;
pub mod definition;
pub mod loader;
pub mod machine;
pub mod trace;
pub mod types;

/// Re-exports the `analyze` function and `Warning` enum from the analyzer module.
pub use analyzer::{analyze, Warning};
/// Re-exports the catalog types from the catalog module.
pub use catalog::{Catalog, CatalogEntry, Explanation, MachineInfo};
/// Re-exports the definition types from the definition module.
pub use definition::{MachineDefinition, RawMachine};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the engine types from the machine module.
pub use machine::{Configuration, RunOutcome, TuringMachine};
/// Re-exports the execution log types from the trace module.
pub use trace::{explain, Action, TraceEntry};
/// Re-exports the shared types and errors from the types module.
pub use types::{
    AlphabetError, CatalogError, DefinitionError, Direction, LoadError, RejectReason, RunStatus,
    Step, Symbol, Transition, Verdict, Violation, BLANK_SYMBOL, DEFAULT_MAX_STEPS,
};
