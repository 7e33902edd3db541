//! Execution log entries and verdict explanations for the front ends.

use crate::types::{Direction, RejectReason, RunStatus, Symbol};
use serde::Serialize;
use std::fmt;

/// What the most recent step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// No step has been taken yet.
    Initial,
    /// A rule was applied.
    Applied {
        read: Symbol,
        write: Symbol,
        direction: Direction,
        next_state: String,
    },
    /// The machine found no rule and halted.
    NoRule { state: String, read: Symbol },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Initial => write!(f, "initial configuration"),
            Action::Applied {
                read,
                write,
                direction,
                next_state,
            } => write!(
                f,
                "read '{read}' -> write '{write}' -> move {} -> {next_state}",
                direction.arrow()
            ),
            Action::NoRule { state, read } => {
                write!(f, "read '{read}' -> no rule for {state}, halting")
            }
        }
    }
}

/// One line of the execution log: the configuration right after a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub step: usize,
    pub state: String,
    pub head: usize,
    pub tape: Vec<Symbol>,
    pub action: Action,
}

impl TraceEntry {
    /// Renders the tape with the head cell bracketed, e.g. `_ [a] b _ _`.
    pub fn tape_display(&self) -> String {
        render_tape(&self.tape, self.head)
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Step {}: state {} | {} | {}",
            self.step,
            self.state,
            self.action,
            self.tape_display()
        )
    }
}

/// Renders `tape` as space-separated cells with the cell at `head` in brackets.
pub fn render_tape(tape: &[Symbol], head: usize) -> String {
    tape.iter()
        .enumerate()
        .map(|(i, symbol)| {
            if i == head {
                format!("[{symbol}]")
            } else {
                symbol.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A short explanation of a run's outcome for `input`.
pub fn explain(status: &RunStatus, input: &str, steps: usize) -> String {
    let shown = if input.is_empty() { "ε (empty)" } else { input };
    match status {
        RunStatus::Accept { state } => format!(
            "The string \"{shown}\" was ACCEPTED: the machine reached accept state {state} after {steps} steps."
        ),
        RunStatus::Reject(RejectReason::RejectState { state }) => format!(
            "The string \"{shown}\" was REJECTED: the machine entered reject state {state} after {steps} steps."
        ),
        RunStatus::Reject(RejectReason::NoRule { state, symbol }) => format!(
            "The string \"{shown}\" was REJECTED: in state {state} there is no rule for '{symbol}', so the machine stopped after {steps} steps outside an accept state."
        ),
        RunStatus::StepLimitExceeded { max_steps } => format!(
            "No verdict for \"{shown}\": the machine was still running after {max_steps} steps."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tape_marks_head() {
        assert_eq!(render_tape(&['_', 'a', 'b', '_'], 1), "_ [a] b _");
        assert_eq!(render_tape(&['_', '_'], 0), "[_] _");
    }

    #[test]
    fn test_action_display() {
        let action = Action::Applied {
            read: 'a',
            write: 'X',
            direction: Direction::Right,
            next_state: "q1".to_string(),
        };
        assert_eq!(action.to_string(), "read 'a' -> write 'X' -> move → -> q1");

        let action = Action::NoRule {
            state: "q2".to_string(),
            read: '_',
        };
        assert!(action.to_string().contains("no rule for q2"));
    }

    #[test]
    fn test_explain() {
        let text = explain(
            &RunStatus::Accept {
                state: "q_accept".to_string(),
            },
            "aabb",
            13,
        );
        assert!(text.contains("\"aabb\" was ACCEPTED"));
        assert!(text.contains("13 steps"));

        let text = explain(
            &RunStatus::Reject(RejectReason::NoRule {
                state: "q2".to_string(),
                symbol: 'b',
            }),
            "",
            4,
        );
        assert!(text.contains("ε (empty)"));
        assert!(text.contains("no rule for 'b'"));

        let text = explain(&RunStatus::StepLimitExceeded { max_steps: 50 }, "1", 50);
        assert!(text.contains("still running after 50 steps"));
    }
}
