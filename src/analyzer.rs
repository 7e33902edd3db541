//! This module provides non-fatal checks on a validated machine definition. Unlike the
//! invariants enforced at construction, these findings describe machines that are legal but
//! probably not what their author meant: unreachable states, states that can only reject by
//! getting stuck, and input symbols the start state cannot read.

use crate::definition::MachineDefinition;
use crate::types::Symbol;
use std::collections::HashSet;
use std::fmt;

/// A suspicious but legal property of a machine definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Warning {
    /// States that cannot be reached from the start state through any sequence of rules.
    UnreachableStates(Vec<String>),
    /// Non-terminal states with no rules at all; every visit ends in a no-rule rejection.
    DeadEndStates(Vec<String>),
    /// Symbols (input symbols or the blank) the start state has no rule for.
    UnhandledStartSymbols(Vec<Symbol>),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnreachableStates(states) => {
                write!(f, "Unreachable states: {}", states.join(", "))
            }
            Warning::DeadEndStates(states) => write!(
                f,
                "Non-terminal states without rules (always reject): {}",
                states.join(", ")
            ),
            Warning::UnhandledStartSymbols(symbols) => write!(
                f,
                "Start state has no rule for: {}",
                symbols
                    .iter()
                    .map(|s| format!("'{s}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Runs every check against `definition`.
///
/// # Returns
///
/// * An empty vector if nothing looks suspicious.
/// * Otherwise one [`Warning`] per failed check, in a fixed order.
pub fn analyze(definition: &MachineDefinition) -> Vec<Warning> {
    [
        check_unreachable_states,
        check_dead_end_states,
        check_start_symbols,
    ]
    .iter()
    .filter_map(|check| check(definition))
    .collect()
}

/// Depth-first traversal over rule targets, starting from the start state.
fn reachable_states(definition: &MachineDefinition) -> HashSet<&str> {
    let mut visited = HashSet::new();
    let mut stack = vec![definition.start()];

    while let Some(state) = stack.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Some(rules) = definition.rules_for(state) {
            for transition in rules.values() {
                if !visited.contains(transition.next_state.as_str()) {
                    stack.push(transition.next_state.as_str());
                }
            }
        }
    }

    visited
}

fn check_unreachable_states(definition: &MachineDefinition) -> Option<Warning> {
    let reachable = reachable_states(definition);
    let unreachable: Vec<String> = definition
        .states()
        .iter()
        .filter(|state| !reachable.contains(state.as_str()))
        .cloned()
        .collect();

    (!unreachable.is_empty()).then_some(Warning::UnreachableStates(unreachable))
}

fn check_dead_end_states(definition: &MachineDefinition) -> Option<Warning> {
    let dead_ends: Vec<String> = definition
        .states()
        .iter()
        .filter(|state| !definition.is_terminal(state))
        .filter(|state| definition.rules_for(state).is_none_or(|rules| rules.is_empty()))
        .cloned()
        .collect();

    (!dead_ends.is_empty()).then_some(Warning::DeadEndStates(dead_ends))
}

fn check_start_symbols(definition: &MachineDefinition) -> Option<Warning> {
    if definition.is_terminal(definition.start()) {
        return None;
    }

    let unhandled: Vec<Symbol> = std::iter::once(definition.blank())
        .chain(definition.input_alphabet().iter().copied())
        .filter(|&symbol| definition.lookup(definition.start(), symbol).is_none())
        .collect();

    (!unhandled.is_empty()).then_some(Warning::UnhandledStartSymbols(unhandled))
}
