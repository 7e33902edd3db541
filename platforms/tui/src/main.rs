mod app;

use action::Action;
use anyhow::Context;
use app::App;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tmsim::{Catalog, MachineLoader, DEFAULT_MAX_STEPS};

/// A Turing machine simulator with a Terminal User Interface.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tmsim-tui
  tmsim-tui my-machine.json --input aabb
  cat my-machine.json | tmsim-tui")]
struct Cli {
    /// Path to a machine definition file (.json).
    /// If not provided, the built-in catalog is loaded.
    /// Can also pipe the definition via stdin.
    machine_file: Option<PathBuf>,

    /// Initial input string, instead of the machine's first example.
    #[clap(short, long)]
    input: Option<String>,

    /// Stop a run that has not halted after this many steps.
    #[clap(short, long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Write debug logs to this file. The terminal is reserved for the interface.
    #[clap(long)]
    log_file: Option<PathBuf>,
}

/// Represents the state of the application loop.
#[derive(PartialEq)]
enum AppState {
    Running,
    ShouldQuit,
}

/// A wrapper around the terminal to ensure it's restored on drop.
struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Errors here cannot be reported anywhere useful.
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file '{}'", path.display()))?;
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }

    // Load before entering the alternate screen so errors reach stderr intact.
    let mut app = load_app(&cli).map_err(anyhow::Error::msg)?;
    app.set_max_steps(cli.max_steps);
    if let Some(input) = &cli.input {
        app.set_input(input);
    }

    let mut tui = Tui::new()?;
    run_app(&mut tui.terminal, app)?;

    Ok(())
}

/// Builds the app from a definition file, then stdin, falling back to the built-in catalog.
fn load_app(cli: &Cli) -> Result<App, String> {
    if let Some(path) = &cli.machine_file {
        let definition = MachineLoader::load_definition(path).map_err(|e| e.to_string())?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Custom".to_string());
        App::from_definition(name, definition)
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        let definition =
            MachineLoader::load_definition_from_string(&buffer).map_err(|e| e.to_string())?;
        App::from_definition("stdin".to_string(), definition)
    } else {
        let catalog = Catalog::builtin().map_err(|e| e.to_string())?;
        App::from_catalog(&catalog)
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    let mut last_step = Instant::now();

    loop {
        terminal.draw(|f| app.render(f))?;

        let timeout = if app.is_auto_playing() {
            app.delay().saturating_sub(last_step.elapsed())
        } else {
            Duration::from_millis(100)
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if handle_key_event(&mut app, key) == AppState::ShouldQuit {
                    return Ok(());
                }
            }
        }

        if app.is_auto_playing() && last_step.elapsed() >= app.delay() {
            app.step_machine();
            last_step = Instant::now();
        }
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> AppState {
    if app.is_editing() {
        match key.code {
            KeyCode::Enter => app.commit_input(),
            KeyCode::Esc => app.cancel_editing(),
            KeyCode::Backspace => app.pop_input(),
            KeyCode::Char(c) => app.push_input(c),
            _ => {}
        }
        return AppState::Running;
    }

    if let Some(action) = app.keymap.get(&key) {
        match action {
            Action::Quit => return AppState::ShouldQuit,
            Action::Reset => app.reset_machine(),
            Action::Step => app.step_machine(),
            Action::ToggleAutoPlay => app.toggle_auto_play(),
            Action::ToggleHelp => app.toggle_help(),
            Action::PreviousMachine => app.previous_machine(),
            Action::NextMachine => app.next_machine(),
            Action::PreviousExample => app.previous_example(),
            Action::NextExample => app.next_example(),
            Action::EditInput => app.start_editing(),
            Action::Faster => app.faster(),
            Action::Slower => app.slower(),
        }
    }
    AppState::Running
}
