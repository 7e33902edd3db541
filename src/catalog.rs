//! The catalog of named machines served to the front ends.
//!
//! A [`Catalog`] is built once (usually from the embedded `machines/catalog.json`), validates
//! every machine while it is built, and is read-only afterwards. Hosts hold it explicitly and
//! pass it by reference to whatever serves it.

use crate::definition::{MachineDefinition, RawMachine};
use crate::trace::explain;
use crate::types::{CatalogError, RunStatus};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("../machines/catalog.json");

/// A catalog entry: display metadata plus the machine's raw definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    /// Input alphabet shown to users and applied to the machine if it declares none.
    #[serde(default)]
    pub alphabet: Vec<String>,
    /// Machine-specific wording for the verdict panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    pub machine: RawMachine,
}

/// What an ACCEPT or REJECT means for one particular language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub accept: String,
    pub reject: String,
}

impl CatalogEntry {
    /// [`explain`], followed by this machine's own account of the verdict when it has one.
    pub fn explain(&self, status: &RunStatus, input: &str, steps: usize) -> String {
        let general = explain(status, input, steps);
        let specific = match (&self.explanation, status) {
            (Some(explanation), RunStatus::Accept { .. }) => &explanation.accept,
            (Some(explanation), RunStatus::Reject(_)) => &explanation.reject,
            _ => return general,
        };
        format!("{general} {specific}")
    }
}

/// Summary counts for listing a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineInfo {
    pub index: usize,
    pub key: String,
    pub name: String,
    pub state_count: usize,
    pub transition_count: usize,
}

/// An immutable registry of validated machines, in declaration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: IndexMap<String, CatalogEntry>,
    definitions: IndexMap<String, Arc<MachineDefinition>>,
}

impl Catalog {
    /// Builds the catalog of predefined machines.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Decodes a catalog document keyed by machine identifier.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: IndexMap<String, CatalogEntry> =
            serde_json::from_str(json).map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Self::from_entries(entries)
    }

    /// Validates every entry's machine and examples. Fails on the first machine that does not
    /// construct, or whose examples use symbols outside its input alphabet.
    pub fn from_entries(entries: IndexMap<String, CatalogEntry>) -> Result<Self, CatalogError> {
        let mut definitions = IndexMap::with_capacity(entries.len());

        for (key, entry) in &entries {
            let raw = entry.machine.clone().with_default_alphabet(&entry.alphabet);
            let definition =
                MachineDefinition::construct(raw).map_err(|source| CatalogError::Definition {
                    key: key.clone(),
                    source,
                })?;

            for example in &entry.examples {
                definition.validate_input(example).map_err(|source| {
                    CatalogError::InvalidExample {
                        key: key.clone(),
                        example: example.clone(),
                        source,
                    }
                })?;
            }
            definitions.insert(key.clone(), Arc::new(definition));
        }

        debug!(machines = definitions.len(), "catalog loaded");
        Ok(Self {
            entries,
            definitions,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    /// Returns the entry at `index` together with its key.
    pub fn get_index(&self, index: usize) -> Option<(&str, &CatalogEntry)> {
        self.entries
            .get_index(index)
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// The validated definition for `key`, shareable across runs.
    pub fn definition(&self, key: &str) -> Result<Arc<MachineDefinition>, CatalogError> {
        self.definitions
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownMachine(key.to_string()))
    }

    /// The raw catalog, keyed by machine identifier, as served over HTTP.
    pub fn entries(&self) -> &IndexMap<String, CatalogEntry> {
        &self.entries
    }

    pub fn info(&self, key: &str) -> Result<MachineInfo, CatalogError> {
        let index = self
            .entries
            .get_index_of(key)
            .ok_or_else(|| CatalogError::UnknownMachine(key.to_string()))?;
        let definition = self.definition(key)?;

        Ok(MachineInfo {
            index,
            key: key.to_string(),
            name: self.entries[index].name.clone(),
            state_count: definition.states().len(),
            transition_count: definition.transition_count(),
        })
    }

    /// Keys of machines whose key or name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|(key, entry)| {
                key.to_lowercase().contains(&query) || entry.name.to_lowercase().contains(&query)
            })
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Serializes the catalog in the shape accepted by [`Catalog::from_json`].
    pub fn to_json(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CatalogError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::TuringMachine;
    use crate::types::{RejectReason, RunStatus, Violation, DEFAULT_MAX_STEPS};

    fn verdict(catalog: &Catalog, key: &str, input: &str) -> RunStatus {
        let definition = catalog.definition(key).unwrap();
        let mut machine = TuringMachine::new(definition, input).unwrap();
        machine.run(DEFAULT_MAX_STEPS).status
    }

    fn accepts(catalog: &Catalog, key: &str, input: &str) -> bool {
        match verdict(catalog, key, input) {
            RunStatus::Accept { .. } => true,
            RunStatus::Reject(_) => false,
            RunStatus::StepLimitExceeded { .. } => panic!("{key} did not halt on {input:?}"),
        }
    }

    #[test]
    fn test_builtin_catalog_loads_in_order() {
        let catalog = Catalog::builtin().unwrap();

        let keys: Vec<&str> = catalog.keys().collect();
        assert_eq!(
            keys,
            vec!["anbn", "palindrome", "zerononen", "even_ones", "odd_ones", "ww", "anbncn"]
        );
        assert_eq!(catalog.len(), 7);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_catalog_alphabet_becomes_input_alphabet() {
        let catalog = Catalog::builtin().unwrap();
        let definition = catalog.definition("anbn").unwrap();

        let alphabet: Vec<char> = definition.input_alphabet().iter().copied().collect();
        assert_eq!(alphabet, vec!['a', 'b']);
        assert!(definition.tape_alphabet().contains(&'X'));
    }

    #[test]
    fn test_every_machine_rejects_foreign_symbols() {
        let catalog = Catalog::builtin().unwrap();

        for key in catalog.keys() {
            let definition = catalog.definition(key).unwrap();
            let error = TuringMachine::new(definition, "abc01z").err();
            assert!(error.is_some(), "{key} accepted a foreign symbol");
            assert!(error.unwrap().invalid.contains(&'z'));
        }
    }

    #[test]
    fn test_every_example_halts() {
        let catalog = Catalog::builtin().unwrap();

        for (key, entry) in catalog.entries() {
            for example in &entry.examples {
                let status = verdict(&catalog, key, example);
                assert!(
                    !matches!(status, RunStatus::StepLimitExceeded { .. }),
                    "{key} did not halt on {example:?}"
                );
            }
        }
    }

    #[test]
    fn test_anbn() {
        let catalog = Catalog::builtin().unwrap();

        assert!(accepts(&catalog, "anbn", "aabb"));
        assert!(accepts(&catalog, "anbn", "aaabbb"));
        assert!(accepts(&catalog, "anbn", ""));
        assert!(!accepts(&catalog, "anbn", "aab"));
        assert!(!accepts(&catalog, "anbn", "abb"));
        assert!(!accepts(&catalog, "anbn", "ba"));
        assert!(!accepts(&catalog, "anbn", "abab"));
    }

    #[test]
    fn test_zerononen() {
        let catalog = Catalog::builtin().unwrap();

        assert!(accepts(&catalog, "zerononen", "0011"));
        assert!(accepts(&catalog, "zerononen", ""));
        assert!(!accepts(&catalog, "zerononen", "001"));
        assert!(!accepts(&catalog, "zerononen", "10"));
    }

    #[test]
    fn test_even_and_odd_ones() {
        let catalog = Catalog::builtin().unwrap();

        assert!(accepts(&catalog, "even_ones", "0110"));
        assert!(accepts(&catalog, "even_ones", ""));
        assert!(!accepts(&catalog, "even_ones", "111"));
        assert_eq!(
            verdict(&catalog, "even_ones", "111"),
            RunStatus::Reject(RejectReason::RejectState {
                state: "q_reject".to_string()
            })
        );

        assert!(accepts(&catalog, "odd_ones", "111"));
        assert!(accepts(&catalog, "odd_ones", "01011"));
        assert!(!accepts(&catalog, "odd_ones", "01010"));
        assert!(!accepts(&catalog, "odd_ones", ""));
    }

    #[test]
    fn test_palindrome() {
        let catalog = Catalog::builtin().unwrap();

        for input in ["", "a", "aa", "aba", "abba", "babab", "bb"] {
            assert!(accepts(&catalog, "palindrome", input), "{input:?}");
        }
        for input in ["ab", "ba", "abb", "aab", "abab"] {
            assert!(!accepts(&catalog, "palindrome", input), "{input:?}");
        }
    }

    #[test]
    fn test_ww() {
        let catalog = Catalog::builtin().unwrap();

        for input in ["", "00", "11", "0101", "1111", "011011", "100100"] {
            assert!(accepts(&catalog, "ww", input), "{input:?}");
        }
        for input in ["0", "01", "0110", "010", "001", "0011"] {
            assert!(!accepts(&catalog, "ww", input), "{input:?}");
        }
    }

    #[test]
    fn test_anbncn() {
        let catalog = Catalog::builtin().unwrap();

        for input in ["abc", "aabbcc", "aaabbbccc"] {
            assert!(accepts(&catalog, "anbncn", input), "{input:?}");
        }
        for input in ["", "ab", "abcc", "aabc", "acb", "abcabc"] {
            assert!(!accepts(&catalog, "anbncn", input), "{input:?}");
        }
    }

    #[test]
    fn test_definition_unknown_key() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            catalog.definition("busy_beaver").unwrap_err(),
            CatalogError::UnknownMachine("busy_beaver".to_string())
        );
        assert!(catalog.get("busy_beaver").is_none());
    }

    #[test]
    fn test_info_and_search() {
        let catalog = Catalog::builtin().unwrap();

        let info = catalog.info("even_ones").unwrap();
        assert_eq!(info.index, 3);
        assert_eq!(info.state_count, 4);
        assert_eq!(info.transition_count, 6);

        assert_eq!(catalog.search("ONES"), vec!["even_ones", "odd_ones"]);
        assert_eq!(catalog.search("palíndromo"), Vec::<&str>::new());
        assert_eq!(catalog.get_index(5).map(|(key, _)| key), Some("ww"));
    }

    #[test]
    fn test_invalid_machine_names_its_key() {
        let json = r#"{
            "broken": {
                "name": "Broken",
                "description": "",
                "machine": {"states": ["q0"], "start": "q1", "blank": "_"}
            }
        }"#;

        match Catalog::from_json(json).unwrap_err() {
            CatalogError::Definition { key, source } => {
                assert_eq!(key, "broken");
                assert_eq!(
                    source.violations(),
                    &[Violation::UnknownStartState("q1".to_string())]
                );
            }
            other => panic!("unexpected error {other:?}"),
        }

        assert!(matches!(
            Catalog::from_json("[]").unwrap_err(),
            CatalogError::Malformed(_)
        ));
    }

    #[test]
    fn test_example_outside_alphabet_names_its_key() {
        let json = r#"{
            "only_a": {
                "name": "Only a",
                "description": "",
                "examples": ["aa", "ab"],
                "alphabet": ["a"],
                "machine": {
                    "states": ["q0", "yes"],
                    "start": "q0",
                    "accept": ["yes"],
                    "blank": "_",
                    "transitions": {"q0": {"a": ["a", "R", "q0"], "_": ["_", "N", "yes"]}}
                }
            }
        }"#;

        match Catalog::from_json(json).unwrap_err() {
            CatalogError::InvalidExample {
                key,
                example,
                source,
            } => {
                assert_eq!(key, "only_a");
                assert_eq!(example, "ab");
                assert_eq!(source.invalid, vec!['b']);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_entry_explanation() {
        let catalog = Catalog::builtin().unwrap();
        let entry = catalog.get("anbn").unwrap();

        let accepted = entry.explain(
            &RunStatus::Accept {
                state: "q_accept".to_string(),
            },
            "ab",
            7,
        );
        assert!(accepted.starts_with("The string \"ab\" was ACCEPTED"));
        assert!(accepted.ends_with(&entry.explanation.as_ref().unwrap().accept));

        let rejected = entry.explain(
            &RunStatus::Reject(RejectReason::RejectState {
                state: "q_reject".to_string(),
            }),
            "ba",
            1,
        );
        assert!(rejected.ends_with(&entry.explanation.as_ref().unwrap().reject));

        let limit = RunStatus::StepLimitExceeded { max_steps: 3 };
        assert_eq!(entry.explain(&limit, "ab", 3), explain(&limit, "ab", 3));

        for (key, entry) in catalog.entries() {
            assert!(entry.explanation.is_some(), "{key} has no explanation");
        }
    }

    #[test]
    fn test_json_export_round_trips() {
        let catalog = Catalog::builtin().unwrap();
        let json = catalog.to_json().unwrap();
        let reloaded = Catalog::from_json(&json).unwrap();

        assert_eq!(reloaded.entries(), catalog.entries());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["anbn"]["machine"]["transitions"]["q1"]["b"][1], "L");
        assert_eq!(value["anbn"]["alphabet"][0], "a");
    }
}
