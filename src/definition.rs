//! This module turns the user-editable JSON form of a machine into an immutable, validated
//! [`MachineDefinition`]. Construction either succeeds completely or fails with a
//! [`DefinitionError`] that lists every broken invariant, so a definition that exists is always
//! consistent: the start, accept, reject and target states are declared, accept and reject are
//! disjoint, and every symbol is a single character.

use crate::types::{AlphabetError, DefinitionError, Direction, Symbol, Transition, Violation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A rule in its raw form: `[writeSymbol, direction, nextState]`.
pub type RawRule = (String, String, String);

/// The JSON shape of a machine definition, exactly as users and the catalog write it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMachine {
    pub states: Vec<String>,
    pub start: String,
    #[serde(default)]
    pub accept: Vec<String>,
    #[serde(default)]
    pub reject: Vec<String>,
    pub blank: String,
    /// State name -> read symbol -> rule.
    #[serde(default)]
    pub transitions: IndexMap<String, IndexMap<String, RawRule>>,
    /// Declared input alphabet. When absent, every non-blank symbol read by a rule is allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alphabet: Option<Vec<String>>,
}

impl RawMachine {
    /// Returns this raw machine with `alphabet` as its declared input alphabet, unless it
    /// already declares one.
    pub fn with_default_alphabet(mut self, alphabet: &[String]) -> Self {
        if self.alphabet.is_none() && !alphabet.is_empty() {
            self.alphabet = Some(alphabet.to_vec());
        }
        self
    }
}

/// A validated, immutable Turing machine description.
///
/// Definitions hold no runtime state and can be shared by any number of runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineDefinition {
    states: Vec<String>,
    start: String,
    accept: BTreeSet<String>,
    reject: BTreeSet<String>,
    blank: Symbol,
    input_alphabet: BTreeSet<Symbol>,
    rules: HashMap<String, HashMap<Symbol, Transition>>,
    raw: RawMachine,
}

impl MachineDefinition {
    /// Decodes a JSON document and constructs a definition from it.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        let raw: RawMachine =
            serde_json::from_str(json).map_err(|e| DefinitionError::Malformed(e.to_string()))?;
        Self::construct(raw)
    }

    /// Validates `raw` and builds a definition from it.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineDefinition)` if every invariant holds.
    /// * `Err(DefinitionError::Invalid)` listing every violated invariant, not just the first.
    pub fn construct(raw: RawMachine) -> Result<Self, DefinitionError> {
        let mut violations: Vec<Violation> = [
            check_states,
            check_start_state,
            check_terminal_states,
            check_blank,
            check_alphabet,
        ]
        .iter()
        .flat_map(|check| check(&raw))
        .collect();

        let declared: HashSet<&str> = raw.states.iter().map(String::as_str).collect();
        let (rules, rule_violations) = compile_rules(&raw, &declared);
        violations.extend(rule_violations);

        if !violations.is_empty() {
            return Err(DefinitionError::Invalid(violations));
        }

        let blank = single_char(&raw.blank).ok_or_else(|| {
            DefinitionError::Invalid(vec![Violation::InvalidBlank(raw.blank.clone())])
        })?;

        let input_alphabet = match &raw.alphabet {
            Some(alphabet) => alphabet.iter().filter_map(|s| single_char(s)).collect(),
            None => rules
                .values()
                .flat_map(|by_symbol| by_symbol.keys().copied())
                .filter(|&symbol| symbol != blank)
                .collect(),
        };

        let mut states = Vec::with_capacity(raw.states.len());
        for state in &raw.states {
            if !states.contains(state) {
                states.push(state.clone());
            }
        }

        Ok(Self {
            states,
            start: raw.start.clone(),
            accept: raw.accept.iter().cloned().collect(),
            reject: raw.reject.iter().cloned().collect(),
            blank,
            input_alphabet,
            rules,
            raw,
        })
    }

    /// Looks up δ(state, symbol). `None` means the machine has no rule for this pair.
    pub fn lookup(&self, state: &str, symbol: Symbol) -> Option<&Transition> {
        self.rules.get(state)?.get(&symbol)
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn accept_states(&self) -> &BTreeSet<String> {
        &self.accept
    }

    pub fn reject_states(&self) -> &BTreeSet<String> {
        &self.reject
    }

    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept.contains(state)
    }

    pub fn is_rejecting(&self, state: &str) -> bool {
        self.reject.contains(state)
    }

    /// Whether `state` is in either terminal set.
    pub fn is_terminal(&self, state: &str) -> bool {
        self.is_accepting(state) || self.is_rejecting(state)
    }

    pub fn blank(&self) -> Symbol {
        self.blank
    }

    /// The input alphabet Σ. Never contains the blank symbol.
    pub fn input_alphabet(&self) -> &BTreeSet<Symbol> {
        &self.input_alphabet
    }

    /// The tape alphabet Γ: the blank, Σ, and every symbol read or written by a rule.
    pub fn tape_alphabet(&self) -> BTreeSet<Symbol> {
        let mut symbols: BTreeSet<Symbol> = self.input_alphabet.clone();
        symbols.insert(self.blank);
        for by_symbol in self.rules.values() {
            for (&read, transition) in by_symbol {
                symbols.insert(read);
                symbols.insert(transition.write);
            }
        }
        symbols
    }

    /// Returns the rules defined for `state`, keyed by read symbol.
    pub fn rules_for(&self, state: &str) -> Option<&HashMap<Symbol, Transition>> {
        self.rules.get(state)
    }

    pub fn transition_count(&self) -> usize {
        self.rules.values().map(HashMap::len).sum()
    }

    /// The raw form this definition was built from.
    pub fn raw(&self) -> &RawMachine {
        &self.raw
    }

    /// Checks `input` against Σ and returns its symbols.
    pub fn validate_input(&self, input: &str) -> Result<Vec<Symbol>, AlphabetError> {
        let mut invalid = Vec::new();
        for c in input.chars() {
            if !self.input_alphabet.contains(&c) && !invalid.contains(&c) {
                invalid.push(c);
            }
        }

        if !invalid.is_empty() {
            return Err(AlphabetError {
                invalid,
                permitted: self.input_alphabet.iter().copied().collect(),
            });
        }

        Ok(input.chars().collect())
    }
}

/// Returns the only character of `s`, or `None` if `s` is empty or longer.
fn single_char(s: &str) -> Option<Symbol> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn check_states(raw: &RawMachine) -> Vec<Violation> {
    if raw.states.is_empty() {
        return vec![Violation::NoStates];
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    raw.states
        .iter()
        .filter(|state| !seen.insert(state.as_str()) && reported.insert(state.as_str()))
        .map(|state| Violation::DuplicateState(state.clone()))
        .collect()
}

fn check_start_state(raw: &RawMachine) -> Vec<Violation> {
    if raw.states.is_empty() || raw.states.contains(&raw.start) {
        return Vec::new();
    }

    vec![Violation::UnknownStartState(raw.start.clone())]
}

fn check_terminal_states(raw: &RawMachine) -> Vec<Violation> {
    let mut violations: Vec<Violation> = raw
        .accept
        .iter()
        .filter(|state| !raw.states.contains(state))
        .map(|state| Violation::UnknownAcceptState(state.clone()))
        .collect();

    violations.extend(
        raw.reject
            .iter()
            .filter(|state| !raw.states.contains(state))
            .map(|state| Violation::UnknownRejectState(state.clone())),
    );

    // Sorted so the report does not depend on declaration order.
    let overlap: BTreeSet<&String> = raw
        .accept
        .iter()
        .filter(|state| raw.reject.contains(state))
        .collect();
    violations.extend(
        overlap
            .into_iter()
            .map(|state| Violation::AcceptRejectOverlap(state.clone())),
    );

    violations
}

fn check_blank(raw: &RawMachine) -> Vec<Violation> {
    match single_char(&raw.blank) {
        Some(_) => Vec::new(),
        None => vec![Violation::InvalidBlank(raw.blank.clone())],
    }
}

fn check_alphabet(raw: &RawMachine) -> Vec<Violation> {
    let Some(alphabet) = &raw.alphabet else {
        return Vec::new();
    };

    let blank = single_char(&raw.blank);
    let mut violations = Vec::new();
    for symbol in alphabet {
        match single_char(symbol) {
            None => violations.push(Violation::InvalidAlphabetSymbol(symbol.clone())),
            Some(c) if Some(c) == blank => violations.push(Violation::BlankInAlphabet(c)),
            Some(_) => {}
        }
    }
    violations
}

/// Converts the raw transition table, collecting a violation for every malformed rule.
fn compile_rules(
    raw: &RawMachine,
    declared: &HashSet<&str>,
) -> (HashMap<String, HashMap<Symbol, Transition>>, Vec<Violation>) {
    let mut rules = HashMap::new();
    let mut violations = Vec::new();

    for (state, by_symbol) in &raw.transitions {
        if !declared.contains(state.as_str()) {
            violations.push(Violation::UnknownSourceState(state.clone()));
        }

        let mut compiled = HashMap::with_capacity(by_symbol.len());
        for (symbol, (write, direction, target)) in by_symbol {
            let read = single_char(symbol);
            if read.is_none() {
                violations.push(Violation::InvalidReadSymbol {
                    state: state.clone(),
                    symbol: symbol.clone(),
                });
            }

            let write_symbol = single_char(write);
            if write_symbol.is_none() {
                violations.push(Violation::InvalidWriteSymbol {
                    state: state.clone(),
                    symbol: symbol.clone(),
                    write: write.clone(),
                });
            }

            let parsed_direction = Direction::from_code(direction);
            if parsed_direction.is_none() {
                violations.push(Violation::InvalidDirection {
                    state: state.clone(),
                    symbol: symbol.clone(),
                    direction: direction.clone(),
                });
            }

            if !declared.contains(target.as_str()) {
                violations.push(Violation::UnknownTargetState {
                    state: state.clone(),
                    symbol: symbol.clone(),
                    target: target.clone(),
                });
            }

            if let (Some(read), Some(write), Some(direction)) =
                (read, write_symbol, parsed_direction)
            {
                compiled.insert(
                    read,
                    Transition {
                        write,
                        direction,
                        next_state: target.clone(),
                    },
                );
            }
        }

        rules.insert(state.clone(), compiled);
    }

    (rules, violations)
}
