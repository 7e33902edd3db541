use tmsim::{
    Catalog, MachineDefinition, RejectReason, RunStatus, TuringMachine, DEFAULT_MAX_STEPS,
};

fn run(key: &str, input: &str) -> RunStatus {
    let catalog = Catalog::builtin().unwrap();
    let mut machine = TuringMachine::new(catalog.definition(key).unwrap(), input).unwrap();
    machine.run(DEFAULT_MAX_STEPS).status
}

fn accepts(key: &str, input: &str) -> bool {
    matches!(run(key, input), RunStatus::Accept { .. })
}

#[test]
fn catalog_lists_seven_machines_in_order() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(
        catalog.keys().collect::<Vec<_>>(),
        vec!["anbn", "palindrome", "zerononen", "even_ones", "odd_ones", "ww", "anbncn"]
    );
}

#[test]
fn every_catalog_example_is_in_its_language() {
    let catalog = Catalog::builtin().unwrap();
    for (key, entry) in catalog.entries() {
        for example in &entry.examples {
            assert!(accepts(key, example), "{key} should accept {example:?}");
        }
    }
}

#[test]
fn anbn_scenarios() {
    assert!(accepts("anbn", "aabb"));
    assert!(accepts("anbn", ""));
    assert!(!accepts("anbn", "aab"));
    assert!(!accepts("anbn", "abab"));
    assert!(!accepts("anbn", "ba"));
}

#[test]
fn palindrome_scenarios() {
    for input in ["", "a", "b", "aba", "abba", "babbab"] {
        assert!(accepts("palindrome", input), "{input:?}");
    }
    for input in ["ab", "abb", "aab", "abab"] {
        assert!(!accepts("palindrome", input), "{input:?}");
    }
}

#[test]
fn parity_scenarios() {
    assert!(accepts("even_ones", "0110"));
    assert!(accepts("even_ones", ""));
    assert!(!accepts("even_ones", "0111"));

    assert!(accepts("odd_ones", "1"));
    assert!(accepts("odd_ones", "01011"));
    assert!(!accepts("odd_ones", ""));
    assert!(!accepts("odd_ones", "0110"));
}

#[test]
fn ww_and_anbncn_scenarios() {
    for input in ["", "00", "0101", "011011"] {
        assert!(accepts("ww", input), "{input:?}");
    }
    for input in ["0", "01", "001", "0110"] {
        assert!(!accepts("ww", input), "{input:?}");
    }

    assert!(accepts("anbncn", "aabbcc"));
    assert!(accepts("anbncn", "abc"));
    assert!(!accepts("anbncn", "abcabc"));
    assert!(!accepts("anbncn", "aabbc"));
}

#[test]
fn zerononen_rejects_interleaving() {
    assert!(accepts("zerononen", "0011"));
    assert!(!accepts("zerononen", "0101"));
}

#[test]
fn input_outside_alphabet_is_refused() {
    let catalog = Catalog::builtin().unwrap();
    let error = TuringMachine::new(catalog.definition("anbn").unwrap(), "abc")
        .err()
        .unwrap();
    assert_eq!(error.invalid, vec!['c']);
    assert_eq!(error.permitted, vec!['a', 'b']);
}

#[test]
fn missing_rule_rejects_without_reject_state() {
    let definition = MachineDefinition::from_json(
        r#"{
            "states": ["q0", "yes"],
            "start": "q0",
            "accept": ["yes"],
            "blank": "_",
            "alphabet": ["a", "b"],
            "transitions": {"q0": {"a": ["a", "R", "q0"], "_": ["_", "N", "yes"]}}
        }"#,
    )
    .unwrap();

    let mut machine = TuringMachine::new(definition.into(), "aab").unwrap();
    let outcome = machine.run(DEFAULT_MAX_STEPS);

    assert_eq!(
        outcome.status,
        RunStatus::Reject(RejectReason::NoRule {
            state: "q0".to_string(),
            symbol: 'b',
        })
    );
    assert_eq!(outcome.configuration.step_count(), 2);
    assert_eq!(outcome.configuration.head(), 3);
}

#[test]
fn step_limit_is_reported() {
    let definition = MachineDefinition::from_json(
        r#"{
            "states": ["loop", "yes"],
            "start": "loop",
            "accept": ["yes"],
            "blank": "_",
            "transitions": {"loop": {"_": ["_", "R", "loop"]}}
        }"#,
    )
    .unwrap();

    let mut machine = TuringMachine::new(definition.into(), "").unwrap();
    let outcome = machine.run(50);

    assert_eq!(outcome.status, RunStatus::StepLimitExceeded { max_steps: 50 });
    assert_eq!(outcome.configuration.step_count(), 50);
    assert!(!outcome.configuration.is_halted());
    assert_eq!(outcome.configuration.tape().len(), 51);
}
