use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tmsim::{
    analyze, explain, Catalog, CatalogEntry, MachineDefinition, MachineLoader, RunStatus, TraceEntry,
    TuringMachine, DEFAULT_MAX_STEPS,
};
use tracing::{debug, Level};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  tmsim-cli list
  tmsim-cli run anbn --input aabb --trace
  tmsim-cli run --file my-machine.json --input 0110 --json
  cat my-machine.json | tmsim-cli run --input 0110
  tmsim-cli check my-machine.json")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in machines
    List {
        /// Only show machines whose key or name contains this text
        query: Option<String>,

        /// Print the whole catalog as JSON
        #[clap(long)]
        json: bool,
    },
    /// Run a machine on an input string
    ///
    /// Exits with 0 on ACCEPT, 1 on REJECT and 2 when the step limit is reached.
    Run {
        /// Key of a built-in machine (see `list`)
        #[clap(conflicts_with = "file")]
        machine: Option<String>,

        /// Machine definition file (.json). Can also be piped via stdin.
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// The input string
        #[clap(short, long, default_value = "")]
        input: String,

        /// Give up after this many steps
        #[clap(short, long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,

        /// Print every configuration along the way
        #[clap(short = 'd', long)]
        trace: bool,

        /// Print the outcome as JSON
        #[clap(long)]
        json: bool,
    },
    /// Validate a machine definition file and report suspicious rules
    Check {
        /// Machine definition file (.json)
        path: PathBuf,
    },
}

/// Exit status for failures that are not a verdict.
const EXIT_ERROR: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match execute(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn execute(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::List { query, json } => list(query.as_deref(), json),
        Command::Run {
            machine,
            file,
            input,
            max_steps,
            trace,
            json,
        } => {
            let (name, definition, entry) = resolve_machine(machine, file)?;
            run(&name, definition, entry.as_ref(), &input, max_steps, trace, json)
        }
        Command::Check { path } => check(&path),
    }
}

fn list(query: Option<&str>, json: bool) -> anyhow::Result<ExitCode> {
    let catalog = Catalog::builtin()?;

    if json {
        println!("{}", catalog.to_json()?);
        return Ok(ExitCode::SUCCESS);
    }

    let keys: Vec<&str> = match query {
        Some(query) => catalog.search(query),
        None => catalog.keys().collect(),
    };

    for key in keys {
        let info = catalog.info(key)?;
        println!(
            "{:>2}. {:<12} {} ({} states, {} rules)",
            info.index + 1,
            info.key,
            info.name,
            info.state_count,
            info.transition_count
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Picks the machine from a catalog key, a file, or stdin, in that order.
/// Only catalog machines come with an entry.
fn resolve_machine(
    key: Option<String>,
    file: Option<PathBuf>,
) -> anyhow::Result<(String, Arc<MachineDefinition>, Option<CatalogEntry>)> {
    if let Some(key) = key {
        let catalog = Catalog::builtin()?;
        let definition = catalog.definition(&key).map_err(|e| {
            anyhow!(
                "{e} (available machines: {})",
                catalog.keys().collect::<Vec<_>>().join(", ")
            )
        })?;
        let entry = catalog.get(&key).cloned();
        return Ok((key, definition, entry));
    }

    if let Some(path) = file {
        let definition = MachineLoader::load_definition(&path)?;
        return Ok((path.display().to_string(), Arc::new(definition), None));
    }

    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        let definition = MachineLoader::load_definition_from_string(&buffer)?;
        return Ok(("stdin".to_string(), Arc::new(definition), None));
    }

    bail!("Specify a machine key, --file <PATH>, or pipe a definition via stdin")
}

fn run(
    name: &str,
    definition: Arc<MachineDefinition>,
    entry: Option<&CatalogEntry>,
    input: &str,
    max_steps: usize,
    trace: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let mut machine = TuringMachine::new(definition, input)?;
    debug!(machine = name, input, max_steps, "starting run");

    let mut entries: Vec<TraceEntry> = Vec::new();
    let outcome = if trace {
        entries.push(machine.trace_entry());
        machine.run_with(max_steps, |m| entries.push(m.trace_entry()))
    } else {
        machine.run(max_steps)
    };

    let steps = outcome.configuration.step_count();
    let explanation = match entry {
        Some(entry) => entry.explain(&outcome.status, input, steps),
        None => explain(&outcome.status, input, steps),
    };

    if json {
        let mut report = json!({
            "machine": name,
            "input": input,
            "status": &outcome.status,
            "configuration": &outcome.configuration,
            "explanation": explanation,
        });
        if trace {
            report["trace"] = serde_json::to_value(&entries)?;
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for entry in &entries {
            println!("{entry}");
        }
        if trace {
            println!();
        }
        println!("Result: {}", outcome.status.label());
        println!("Final tape: {}", outcome.configuration.tape_display());
        println!("{explanation}");
    }

    Ok(match outcome.status {
        RunStatus::Accept { .. } => ExitCode::SUCCESS,
        RunStatus::Reject(_) => ExitCode::from(1),
        RunStatus::StepLimitExceeded { .. } => ExitCode::from(2),
    })
}

fn check(path: &Path) -> anyhow::Result<ExitCode> {
    let definition = MachineLoader::load_definition(path)?;
    println!(
        "{}: valid ({} states, {} rules, Σ = {{{}}})",
        path.display(),
        definition.states().len(),
        definition.transition_count(),
        definition
            .input_alphabet()
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let warnings = analyze(&definition);
    for warning in &warnings {
        println!("warning: {warning}");
    }
    if warnings.is_empty() {
        println!("No warnings.");
    }

    Ok(ExitCode::SUCCESS)
}
