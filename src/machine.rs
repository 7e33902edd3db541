//! This module defines the runtime [`Configuration`] of a run and the [`TuringMachine`] engine
//! that drives it. The engine applies one transition per [`TuringMachine::step`], grows the
//! tape by one blank cell whenever the head leaves it, and checks accept/reject membership on
//! the state entered by each step.

use crate::definition::MachineDefinition;
use crate::trace::{render_tape, Action, TraceEntry};
use crate::types::{
    AlphabetError, Direction, RejectReason, RunStatus, Step, Symbol, Transition, Verdict,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

/// The complete runtime snapshot of one run.
///
/// The tape is a finite window onto a two-way infinite tape; cells outside it are blank.
/// `head` always indexes into `tape`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    tape: Vec<Symbol>,
    head: usize,
    state: String,
    halted: bool,
    step_count: usize,
    outcome: Option<Verdict>,
}

impl Configuration {
    /// Builds the starting configuration for `input`.
    ///
    /// The input is checked against the definition's input alphabet first; no configuration
    /// exists if that fails.
    pub fn initialize(
        definition: &MachineDefinition,
        input: &str,
    ) -> Result<Self, AlphabetError> {
        let symbols = definition.validate_input(input)?;
        Ok(Self::load(definition, &symbols))
    }

    /// Lays out `[blank, input.., blank, blank]`, or `[blank, blank]` for empty input.
    fn load(definition: &MachineDefinition, symbols: &[Symbol]) -> Self {
        let blank = definition.blank();
        let (tape, head) = if symbols.is_empty() {
            (vec![blank, blank], 0)
        } else {
            let mut tape = Vec::with_capacity(symbols.len() + 3);
            tape.push(blank);
            tape.extend_from_slice(symbols);
            tape.push(blank);
            tape.push(blank);
            (tape, 1)
        };

        Self {
            tape,
            head,
            state: definition.start().to_string(),
            halted: false,
            step_count: 0,
            outcome: None,
        }
    }

    pub fn tape(&self) -> &[Symbol] {
        &self.tape
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of transitions applied so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// The verdict, once the machine has halted.
    pub fn outcome(&self) -> Option<&Verdict> {
        self.outcome.as_ref()
    }

    /// The symbol under the head.
    pub fn symbol(&self) -> Symbol {
        self.tape[self.head]
    }

    /// The tape contents as a string, guard blanks included.
    pub fn tape_string(&self) -> String {
        self.tape.iter().collect()
    }

    /// The tape with the head cell bracketed.
    pub fn tape_display(&self) -> String {
        render_tape(&self.tape, self.head)
    }

    /// Writes, moves and changes state in one go.
    ///
    /// Moving left off cell 0 prepends a blank and leaves the head on it; moving right off the
    /// last cell appends one. The tape never grows by more than one cell per step.
    fn apply(&mut self, transition: &Transition, blank: Symbol) {
        self.tape[self.head] = transition.write;

        match transition.direction {
            Direction::Left => {
                if self.head == 0 {
                    self.tape.insert(0, blank);
                } else {
                    self.head -= 1;
                }
            }
            Direction::Right => {
                self.head += 1;
                if self.head >= self.tape.len() {
                    self.tape.push(blank);
                }
            }
            Direction::Stay => {}
        }

        self.state.clone_from(&transition.next_state);
        self.step_count += 1;
    }

    fn halt(&mut self, verdict: Verdict) {
        self.halted = true;
        self.outcome = Some(verdict);
    }
}

/// The result of [`TuringMachine::run`]: the terminal status and the final configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub configuration: Configuration,
}

/// Executes a [`MachineDefinition`] on one input.
///
/// The engine exclusively owns its [`Configuration`]; the definition is shared and never
/// mutated, so any number of engines may run the same definition side by side.
pub struct TuringMachine {
    definition: Arc<MachineDefinition>,
    input: Vec<Symbol>,
    config: Configuration,
    last_action: Action,
}

impl TuringMachine {
    /// Creates an engine for `input`, failing before any configuration exists if `input`
    /// contains symbols outside the machine's input alphabet.
    pub fn new(definition: Arc<MachineDefinition>, input: &str) -> Result<Self, AlphabetError> {
        let symbols = definition.validate_input(input)?;
        let config = Configuration::load(&definition, &symbols);

        Ok(Self {
            definition,
            input: symbols,
            config,
            last_action: Action::Initial,
        })
    }

    /// Executes a single transition.
    ///
    /// # Returns
    ///
    /// * `Step::AlreadyHalted` without touching anything if the machine had already halted.
    /// * `Step::Halt(Verdict::Reject(NoRule))` if δ is undefined for the current state and symbol.
    /// * `Step::Halt(_)` if the state entered by this step is an accept or reject state.
    /// * `Step::Continue` otherwise.
    pub fn step(&mut self) -> Step {
        if self.config.halted {
            return Step::AlreadyHalted;
        }

        let read = self.config.symbol();
        let Some(transition) = self.definition.lookup(&self.config.state, read) else {
            let state = self.config.state.clone();
            debug!(state = %state, symbol = %read, "no rule, rejecting");

            self.last_action = Action::NoRule {
                state: state.clone(),
                read,
            };
            let verdict = Verdict::Reject(RejectReason::NoRule {
                state,
                symbol: read,
            });
            self.config.halt(verdict.clone());
            return Step::Halt(verdict);
        };

        self.config.apply(transition, self.definition.blank());
        self.last_action = Action::Applied {
            read,
            write: transition.write,
            direction: transition.direction,
            next_state: transition.next_state.clone(),
        };
        trace!(
            step = self.config.step_count,
            state = %self.config.state,
            head = self.config.head,
            "applied {}",
            self.last_action
        );

        let state = &self.config.state;
        let verdict = if self.definition.is_accepting(state) {
            Verdict::Accept {
                state: state.clone(),
            }
        } else if self.definition.is_rejecting(state) {
            Verdict::Reject(RejectReason::RejectState {
                state: state.clone(),
            })
        } else {
            return Step::Continue;
        };

        debug!(steps = self.config.step_count, "halted: {}", verdict);
        self.config.halt(verdict.clone());
        Step::Halt(verdict)
    }

    /// Steps until the machine halts or `max_steps` transitions have been applied in total.
    pub fn run(&mut self, max_steps: usize) -> RunOutcome {
        self.run_with(max_steps, |_| {})
    }

    /// Like [`TuringMachine::run`], calling `observe` after every step.
    pub fn run_with<F>(&mut self, max_steps: usize, mut observe: F) -> RunOutcome
    where
        F: FnMut(&TuringMachine),
    {
        while !self.config.halted && self.config.step_count < max_steps {
            self.step();
            observe(self);
        }

        let status = match &self.config.outcome {
            Some(verdict) => RunStatus::from(verdict.clone()),
            None => RunStatus::StepLimitExceeded { max_steps },
        };

        RunOutcome {
            status,
            configuration: self.config.clone(),
        }
    }

    /// Discards the live configuration and starts over on the same input.
    pub fn reset(&mut self) {
        self.config = Configuration::load(&self.definition, &self.input);
        self.last_action = Action::Initial;
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn definition(&self) -> &MachineDefinition {
        &self.definition
    }

    /// The input this run was started with.
    pub fn input(&self) -> String {
        self.input.iter().collect()
    }

    pub fn state(&self) -> &str {
        self.config.state()
    }

    pub fn step_count(&self) -> usize {
        self.config.step_count()
    }

    pub fn is_halted(&self) -> bool {
        self.config.is_halted()
    }

    pub fn last_action(&self) -> &Action {
        &self.last_action
    }

    /// The current configuration as an execution log entry.
    pub fn trace_entry(&self) -> TraceEntry {
        TraceEntry {
            step: self.config.step_count,
            state: self.config.state.clone(),
            head: self.config.head,
            tape: self.config.tape.clone(),
            action: self.last_action.clone(),
        }
    }
}
