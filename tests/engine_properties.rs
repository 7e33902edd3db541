use proptest::prelude::*;
use std::sync::Arc;
use tmsim::{Catalog, MachineDefinition, RunStatus, Step, TuringMachine};

/// (state, head, tape) after each step.
type Observation = (String, usize, Vec<char>);

fn observe(machine: &TuringMachine) -> Observation {
    let config = machine.configuration();
    (config.state().to_string(), config.head(), config.tape().to_vec())
}

fn catalog_input() -> impl Strategy<Value = (String, String)> {
    let catalog = Catalog::builtin().unwrap();
    let machines: Vec<(String, Vec<char>)> = catalog
        .keys()
        .map(|key| {
            let definition = catalog.definition(key).unwrap();
            let alphabet = definition.input_alphabet().iter().copied().collect();
            (key.to_string(), alphabet)
        })
        .collect();

    (0..machines.len()).prop_flat_map(move |i| {
        let (key, alphabet) = machines[i].clone();
        prop::collection::vec(prop::sample::select(alphabet), 0..10)
            .prop_map(move |symbols| (key.clone(), symbols.into_iter().collect()))
    })
}

fn definition(key: &str) -> Arc<MachineDefinition> {
    Catalog::builtin().unwrap().definition(key).unwrap()
}

proptest! {
    #[test]
    fn run_matches_manual_stepping((key, input) in catalog_input(), max_steps in 0usize..200) {
        let shared = definition(&key);

        let mut driven = TuringMachine::new(Arc::clone(&shared), &input).unwrap();
        let mut from_run = Vec::new();
        let outcome = driven.run_with(max_steps, |m| from_run.push(observe(m)));

        let mut manual = TuringMachine::new(shared, &input).unwrap();
        let mut from_steps = Vec::new();
        for _ in 0..max_steps {
            if manual.is_halted() {
                break;
            }
            manual.step();
            from_steps.push(observe(&manual));
        }

        prop_assert_eq!(from_run, from_steps);
        prop_assert_eq!(&outcome.configuration, manual.configuration());
        if !manual.is_halted() {
            prop_assert_eq!(outcome.status, RunStatus::StepLimitExceeded { max_steps });
        }
    }

    #[test]
    fn tape_grows_at_most_one_cell_per_step((key, input) in catalog_input()) {
        let mut machine = TuringMachine::new(definition(&key), &input).unwrap();
        let initial = machine.configuration().tape().len();
        let mut previous = initial;

        for _ in 0..500 {
            if machine.is_halted() {
                break;
            }
            machine.step();

            let config = machine.configuration();
            prop_assert!(config.head() < config.tape().len());
            prop_assert!(config.tape().len() <= previous + 1);
            prop_assert!(config.tape().len() <= initial + config.step_count());
            previous = config.tape().len();
        }
    }

    #[test]
    fn halted_machine_ignores_steps((key, input) in catalog_input()) {
        let mut machine = TuringMachine::new(definition(&key), &input).unwrap();
        let outcome = machine.run(tmsim::DEFAULT_MAX_STEPS);
        prop_assert!(machine.is_halted());

        for _ in 0..3 {
            prop_assert_eq!(machine.step(), Step::AlreadyHalted);
            prop_assert_eq!(machine.configuration(), &outcome.configuration);
        }
    }
}
