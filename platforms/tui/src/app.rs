use action::Action;
use keymap::{Config, KeyMapConfig};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
    Frame,
};
use std::sync::Arc;
use std::time::Duration;
use tmsim::{
    analyze, Catalog, CatalogEntry, MachineDefinition, RunStatus, TraceEntry, TuringMachine,
    Verdict, DEFAULT_MAX_STEPS,
};

const BLOCK_PADDING: Padding = Padding::new(1, 1, 0, 0);

pub const MIN_DELAY: Duration = Duration::from_millis(100);
pub const MAX_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_DELAY: Duration = Duration::from_millis(600);
const DELAY_STEP: Duration = Duration::from_millis(100);

/// Older log lines are dropped; the panel only ever shows the tail.
const LOG_CAPACITY: usize = 500;

/// A machine the user can switch to, with its display metadata.
struct Entry {
    info: CatalogEntry,
    definition: Arc<MachineDefinition>,
}

pub struct App {
    entries: Vec<Entry>,
    current_machine_index: usize,
    current_example_index: usize,
    machine: TuringMachine,
    log: Vec<TraceEntry>,
    max_steps: usize,
    auto_play: bool,
    delay: Duration,
    editing: Option<String>,
    message: String,
    show_help: bool,
    pub(crate) keymap: Config<Action>,
}

impl App {
    /// Starts on the first catalog machine with its first example.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, String> {
        let entries = catalog
            .entries()
            .iter()
            .map(|(key, entry)| {
                let definition = catalog.definition(key).map_err(|e| e.to_string())?;
                Ok(Entry {
                    info: entry.clone(),
                    definition,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Self::new(entries, "Press 'h' for help.")
    }

    /// Wraps a single user-supplied definition; switching machines cycles over just this one.
    pub fn from_definition(name: String, definition: MachineDefinition) -> Result<Self, String> {
        let warnings = analyze(&definition);
        let message = if warnings.is_empty() {
            "Machine loaded from source. Press 'h' for help.".to_string()
        } else {
            format!("Warning: {}", warnings[0])
        };

        let entry = Entry {
            info: CatalogEntry {
                name,
                description: "Custom machine".to_string(),
                examples: Vec::new(),
                alphabet: Vec::new(),
                explanation: None,
                machine: definition.raw().clone(),
            },
            definition: Arc::new(definition),
        };
        Self::new(vec![entry], &message)
    }

    fn new(entries: Vec<Entry>, message: &str) -> Result<Self, String> {
        let first = entries.first().ok_or("No machines to load")?;
        let input = first.info.examples.first().cloned().unwrap_or_default();
        let machine =
            TuringMachine::new(Arc::clone(&first.definition), &input).map_err(|e| e.to_string())?;

        Ok(Self {
            log: vec![machine.trace_entry()],
            machine,
            max_steps: DEFAULT_MAX_STEPS,
            entries,
            current_machine_index: 0,
            current_example_index: 0,
            auto_play: false,
            delay: DEFAULT_DELAY,
            editing: None,
            message: message.to_string(),
            show_help: false,
            keymap: Action::keymap_config(),
        })
    }

    /// Sets the step bound after which auto-play and stepping give up on the run.
    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps;
    }

    /// Whether the run has used up its steps without halting.
    fn limit_reached(&self) -> bool {
        !self.machine.is_halted() && self.machine.step_count() >= self.max_steps
    }

    /// The run's terminal status, if it has one yet.
    fn run_status(&self) -> Option<RunStatus> {
        match self.machine.configuration().outcome() {
            Some(verdict) => Some(RunStatus::from(verdict.clone())),
            None if self.limit_reached() => Some(RunStatus::StepLimitExceeded {
                max_steps: self.max_steps,
            }),
            None => None,
        }
    }

    /// Replaces the starting input. Leaves the current run untouched if it is outside the alphabet.
    pub fn set_input(&mut self, input: &str) -> bool {
        let definition = Arc::clone(&self.entries[self.current_machine_index].definition);
        match TuringMachine::new(definition, input) {
            Ok(machine) => {
                self.machine = machine;
                self.restart_log();
                self.message = format!("Input set to \"{input}\"");
                true
            }
            Err(e) => {
                self.auto_play = false;
                self.message = e.to_string();
                false
            }
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        let inner_area = f.area().inner(Margin::new(1, 0));

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(inner_area);

        self.render_machine_info(f, main_chunks[0]);

        let middle_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(50),
                Constraint::Length(1),
                Constraint::Percentage(50),
            ])
            .split(main_chunks[1]);

        self.render_log(f, middle_chunks[0]);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(5),
                Constraint::Min(0),
            ])
            .split(middle_chunks[2]);

        self.render_machine_state(f, right_chunks[0]);
        self.render_tape(f, right_chunks[1]);

        if self.show_help {
            self.render_help(f, right_chunks[2]);
        } else {
            self.render_verdict(f, right_chunks[2]);
        }

        self.render_status(f, main_chunks[2]);
    }

    fn render_machine_info(&self, f: &mut Frame, area: Rect) {
        let entry = &self.entries[self.current_machine_index];
        let definition = self.machine.definition();

        let input_line = match &self.editing {
            Some(buffer) => Line::from(vec![
                Span::styled("Input: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{buffer}█"),
                    Style::default().fg(Color::Black).bg(Color::Yellow),
                ),
                Span::raw("  (Enter to run, Esc to cancel)"),
            ]),
            None => Line::from(vec![
                Span::styled("Input: ", Style::default().fg(Color::Yellow)),
                Span::raw(format!("\"{}\"", self.machine.input())),
                Span::styled(" | Σ = ", Style::default().fg(Color::Yellow)),
                Span::raw(symbol_set(definition.input_alphabet().iter().copied())),
            ]),
        };

        let text = vec![
            Line::from(vec![
                Span::styled("Machine: ", Style::default().fg(Color::Yellow)),
                Span::raw(format!(
                    "{} ({}/{})",
                    entry.info.name,
                    self.current_machine_index + 1,
                    self.entries.len()
                )),
                Span::styled(" | States: ", Style::default().fg(Color::Yellow)),
                Span::raw(definition.states().len().to_string()),
                Span::styled(" | Rules: ", Style::default().fg(Color::Yellow)),
                Span::raw(definition.transition_count().to_string()),
            ]),
            Line::from(Span::styled(
                entry.info.description.as_str(),
                Style::default().fg(Color::Gray),
            )),
            input_line,
        ];

        let paragraph = Paragraph::new(text).block(
            block("tmsim - Turing Machine Simulator (TUI)").title_alignment(Alignment::Center),
        );
        f.render_widget(paragraph, area);
    }

    fn render_log(&self, f: &mut Frame, area: Rect) {
        // Borders take two rows.
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.log.len().saturating_sub(visible);

        let lines: Vec<Line> = self
            .log
            .iter()
            .skip(skip)
            .map(|entry| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>4} ", entry.step),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        format!("{:<8} ", entry.state),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(entry.action.to_string()),
                ])
            })
            .collect();

        f.render_widget(section("Execution Log", lines), area);
    }

    fn render_machine_state(&self, f: &mut Frame, area: Rect) {
        let config = self.machine.configuration();

        let (status_text, status_color) = match config.outcome() {
            Some(Verdict::Accept { .. }) => ("ACCEPTED", Color::Green),
            Some(Verdict::Reject(_)) => ("REJECTED", Color::Red),
            None if self.limit_reached() => ("STEP LIMIT", Color::Magenta),
            None if config.step_count() == 0 => ("READY", Color::Blue),
            None if self.auto_play => ("RUNNING", Color::Green),
            None => ("PAUSED", Color::Yellow),
        };

        let text = vec![
            Line::from(vec![
                Span::styled("Current State: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    config.state(),
                    Style::default()
                        .fg(status_color)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" | Steps: ", Style::default().fg(Color::Yellow)),
                Span::raw(config.step_count().to_string()),
                Span::styled(" | Status: ", Style::default().fg(Color::Yellow)),
                Span::styled(status_text, Style::default().fg(status_color)),
            ]),
            Line::from(vec![
                Span::styled("Head: ", Style::default().fg(Color::Cyan)),
                Span::raw(config.head().to_string()),
                Span::styled(" | Symbol: ", Style::default().fg(Color::Cyan)),
                Span::raw(format!("'{}'", config.symbol())),
            ]),
        ];

        f.render_widget(section("Machine State", text), area);
    }

    fn render_tape(&self, f: &mut Frame, area: Rect) {
        let config = self.machine.configuration();

        let cells: Vec<Span> = config
            .tape()
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                if i == config.head() {
                    Span::styled(
                        format!(" {symbol} "),
                        Style::default()
                            .bg(Color::Yellow)
                            .fg(Color::Black)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw(format!(" {symbol} "))
                }
            })
            .collect();

        let text = vec![
            Line::from(cells),
            Line::from(Span::styled(
                format!("Head at position: {}", config.head()),
                Style::default().fg(Color::Cyan),
            )),
        ];

        f.render_widget(section("Tape", text).wrap(Wrap { trim: false }), area);
    }

    /// The explanation shown once the run has a terminal status.
    fn verdict_text(&self) -> Option<String> {
        let status = self.run_status()?;
        let entry = &self.entries[self.current_machine_index];
        Some(
            entry
                .info
                .explain(&status, &self.machine.input(), self.machine.step_count()),
        )
    }

    fn render_verdict(&self, f: &mut Frame, area: Rect) {
        let color = match self.run_status() {
            Some(RunStatus::Accept { .. }) => Color::Green,
            Some(RunStatus::Reject(_)) => Color::Red,
            Some(RunStatus::StepLimitExceeded { .. }) => Color::Magenta,
            None => Color::Gray,
        };
        let text = self.verdict_text().unwrap_or_else(|| {
            "The machine has not halted yet. Step with Space or press 'p' to play.".to_string()
        });

        let paragraph = section("Verdict", vec![Line::from(Span::styled(text, color))])
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = vec![
            Line::from("Controls:"),
            Line::from("  Space - Step forward"),
            Line::from("  p - Play / pause"),
            Line::from("  f / s - Faster / slower auto-play"),
            Line::from("  r - Reset machine"),
            Line::from("  ← → - Switch machines"),
            Line::from("  ↑ ↓ - Cycle example inputs"),
            Line::from("  e - Type a new input"),
            Line::from("  h - Toggle this help"),
            Line::from("  q - Quit"),
            Line::from(""),
            Line::from("The head cell is highlighted; '_' is the blank symbol."),
        ];

        f.render_widget(section("Help", help_text), area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let repo = "@rezigned/tmsim";
        let outer = block("Status");
        let inner = outer.inner(area);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(repo.len() as u16)])
            .split(inner);

        let auto_play_status = if self.auto_play { "ON" } else { "OFF" };
        let status = Line::from(vec![
            Span::raw("Auto-play: "),
            Span::styled(auto_play_status, Style::default().fg(Color::Yellow)),
            Span::raw(format!(" ({} ms)", self.delay.as_millis())),
            Span::raw(format!(" | {}", self.message)),
        ]);

        let social = Text::from(
            Line::from(Span::styled(repo, Style::default().fg(Color::Yellow))).right_aligned(),
        );

        f.render_widget(outer, area);
        f.render_widget(status, chunks[0]);
        f.render_widget(social, chunks[1]);
    }

    pub fn step_machine(&mut self) {
        if self.machine.is_halted() {
            self.auto_play = false;
            self.message = "Machine is halted. Press 'r' to reset.".to_string();
            return;
        }

        if self.limit_reached() {
            self.auto_play = false;
            self.message = format!(
                "Step limit of {} reached. Press 'r' to reset.",
                self.max_steps
            );
            return;
        }

        self.machine.step();
        self.log.push(self.machine.trace_entry());
        if self.log.len() > LOG_CAPACITY {
            self.log.drain(..self.log.len() - LOG_CAPACITY);
        }

        match self.machine.configuration().outcome() {
            Some(verdict) => {
                self.auto_play = false;
                self.message = format!("{verdict}. Press 'r' to reset.");
            }
            None if self.limit_reached() => {
                self.auto_play = false;
                self.message = format!(
                    "STEP_LIMIT_EXCEEDED after {} steps. Press 'r' to reset.",
                    self.max_steps
                );
            }
            None => {
                self.message = format!("Step {} completed", self.machine.step_count());
            }
        }
    }

    pub fn reset_machine(&mut self) {
        self.machine.reset();
        self.restart_log();
        self.message = "Machine reset".to_string();
    }

    pub fn toggle_auto_play(&mut self) {
        if self.machine.is_halted() || self.limit_reached() {
            self.message = "Machine is halted. Press 'r' to reset.".to_string();
            return;
        }

        self.auto_play = !self.auto_play;
        self.message = format!(
            "Auto-play {}",
            if self.auto_play { "enabled" } else { "disabled" }
        );
    }

    pub fn is_auto_playing(&self) -> bool {
        self.auto_play && !self.machine.is_halted() && !self.limit_reached()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn faster(&mut self) {
        self.delay = self.delay.saturating_sub(DELAY_STEP).max(MIN_DELAY);
        self.message = format!("Delay {} ms", self.delay.as_millis());
    }

    pub fn slower(&mut self) {
        self.delay = (self.delay + DELAY_STEP).min(MAX_DELAY);
        self.message = format!("Delay {} ms", self.delay.as_millis());
    }

    pub fn next_machine(&mut self) {
        self.switch_machine((self.current_machine_index + 1) % self.entries.len());
    }

    pub fn previous_machine(&mut self) {
        let count = self.entries.len();
        self.switch_machine((self.current_machine_index + count - 1) % count);
    }

    pub fn next_example(&mut self) {
        self.cycle_example(1);
    }

    pub fn previous_example(&mut self) {
        let count = self.entries[self.current_machine_index].info.examples.len();
        self.cycle_example(count.saturating_sub(1));
    }

    fn cycle_example(&mut self, offset: usize) {
        let examples = &self.entries[self.current_machine_index].info.examples;
        if examples.is_empty() {
            self.message = "This machine has no examples. Press 'e' to type an input.".to_string();
            return;
        }

        self.current_example_index = (self.current_example_index + offset) % examples.len();
        let input = examples[self.current_example_index].clone();
        self.set_input(&input);
    }

    /// Moves to the machine at `index` on its first example. The selection only changes once
    /// the new run has been built.
    fn switch_machine(&mut self, index: usize) {
        let entry = &self.entries[index];
        let input = entry.info.examples.first().cloned().unwrap_or_default();

        match TuringMachine::new(Arc::clone(&entry.definition), &input) {
            Ok(machine) => {
                self.message = format!("Loaded {}", entry.info.name);
                self.current_machine_index = index;
                self.current_example_index = 0;
                self.machine = machine;
                self.restart_log();
            }
            Err(e) => {
                self.auto_play = false;
                self.message = format!("Cannot load {}: {e}", entry.info.name);
            }
        }
    }

    fn restart_log(&mut self) {
        self.auto_play = false;
        self.log = vec![self.machine.trace_entry()];
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn start_editing(&mut self) {
        self.auto_play = false;
        self.editing = Some(self.machine.input());
        self.message = "Editing input".to_string();
    }

    pub fn push_input(&mut self, c: char) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.push(c);
        }
    }

    pub fn pop_input(&mut self) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.pop();
        }
    }

    /// Starts a run on the edited input. On an alphabet error the editor stays open.
    pub fn commit_input(&mut self) {
        if let Some(buffer) = self.editing.take() {
            if !self.set_input(&buffer) {
                self.editing = Some(buffer);
            }
        }
    }

    pub fn cancel_editing(&mut self) {
        self.editing = None;
        self.message = "Edit cancelled".to_string();
    }
}

fn symbol_set(symbols: impl Iterator<Item = char>) -> String {
    let symbols: Vec<String> = symbols.map(String::from).collect();
    format!("{{{}}}", symbols.join(", "))
}

fn section<'a>(title: &'a str, content: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(content).block(block(title))
}

fn block(title: &str) -> Block {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {title} "))
        .padding(BLOCK_PADDING)
}
