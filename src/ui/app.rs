//! Main TUI application state and logic

use crate::interpreter::{Execution, RuntimeError, StepKind};
use crate::ui::panes::{self, SourceScrollState, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Delay between two steps in play mode
const PLAY_INTERVAL: Duration = Duration::from_millis(250);

/// Steps taken by one "run" key press before handing control back
const RUN_STEP_LIMIT: u64 = 5_000_000;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Stack,
    Heap,
    Terminal,
}

impl FocusedPane {
    /// Clockwise: source -> terminal -> stack -> heap
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Terminal,
            FocusedPane::Terminal => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Source,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Heap,
            FocusedPane::Terminal => FocusedPane::Source,
            FocusedPane::Stack => FocusedPane::Terminal,
            FocusedPane::Heap => FocusedPane::Stack,
        }
    }
}

/// The main application state
pub struct App<'p> {
    pub execution: Execution<'p>,
    pub source_code: String,
    pub focused_pane: FocusedPane,

    pub source_scroll: SourceScrollState,
    pub stack_scroll: usize,
    pub heap_scroll: usize,
    pub terminal_scroll: usize,

    pub should_quit: bool,
    pub status_message: String,
    pub is_playing: bool,
    pub last_play_time: Instant,
    /// Space is debounced so a held key does not toggle repeatedly
    pub last_space_press: Instant,
}

impl<'p> App<'p> {
    pub fn new(execution: Execution<'p>, source_code: String) -> Self {
        let now = Instant::now();
        App {
            execution,
            source_code,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::new(),
            stack_scroll: 0,
            heap_scroll: 0,
            terminal_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready"),
            is_playing: false,
            last_play_time: now,
            last_space_press: now.checked_sub(Duration::from_secs(1)).unwrap_or(now),
        }
    }

    /// Run the TUI event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= PLAY_INTERVAL {
                self.step_forward();
                if !self.execution.is_running() {
                    self.is_playing = false;
                }
                self.last_play_time = Instant::now();
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let error = self.execution.error();
        let current_line = error
            .map(RuntimeError::location)
            .unwrap_or_else(|| self.execution.location())
            .line;

        panes::render_source_pane(
            frame,
            left_rows[0],
            &self.source_code,
            current_line,
            error.is_some(),
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_terminal_pane(
            frame,
            left_rows[1],
            self.execution.stdout().as_str(),
            self.execution.stderr().as_str(),
            self.focused_pane == FocusedPane::Terminal,
            &mut self.terminal_scroll,
        );

        panes::render_stack_pane(
            frame,
            right_rows[0],
            self.execution.memory(),
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        panes::render_heap_pane(
            frame,
            right_rows[1],
            self.execution.memory(),
            self.focused_pane == FocusedPane::Heap,
            &mut self.heap_scroll,
        );

        panes::render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                steps: self.execution.steps(),
                elementary_operations: self.execution.elementary_operations(),
                is_running: self.execution.is_running(),
                is_error: error.is_some(),
                is_playing: self.is_playing,
            },
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let count = c.to_digit(10).unwrap_or(1);
                for _ in 0..count {
                    if !self.step_forward() {
                        break;
                    }
                }
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.is_playing = false;
                self.step_forward();
            }
            KeyCode::Char('s') => {
                self.is_playing = false;
                self.step_elementary();
            }
            KeyCode::Up => self.scroll(-1),
            KeyCode::Down => self.scroll(1),
            KeyCode::Char(' ') => {
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing && self.execution.is_running();
                    self.status_message = if self.is_playing {
                        "Playing...".to_string()
                    } else {
                        "Paused".to_string()
                    };
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.run_to_end();
            }
            _ => {}
        }
    }

    fn scroll(&mut self, delta: isize) {
        let offset = match self.focused_pane {
            FocusedPane::Source => {
                // moving the view down moves the pinned line up
                if let Some(row) = self.source_scroll.target_line_row {
                    self.source_scroll.target_line_row = Some(row.saturating_add_signed(-delta));
                }
                return;
            }
            FocusedPane::Stack => &mut self.stack_scroll,
            FocusedPane::Heap => &mut self.heap_scroll,
            FocusedPane::Terminal => &mut self.terminal_scroll,
        };
        *offset = offset.saturating_add_signed(delta);
    }

    /// Take one step; returns whether the program can go on
    fn step_forward(&mut self) -> bool {
        let result = self.execution.advance();
        self.terminal_scroll = usize::MAX;
        match result {
            Ok(Some(step)) => {
                self.status_message = match step.kind {
                    StepKind::Elementary => format!("Elementary step at {}", step.location),
                    StepKind::Structural => format!("Step at {}", step.location),
                    StepKind::AwaitingInput => "Waiting for input".to_string(),
                };
                step.kind != StepKind::AwaitingInput
            }
            Ok(None) => {
                self.report_end();
                false
            }
            Err(err) => {
                self.status_message = err.to_string();
                false
            }
        }
    }

    /// Step until the next elementary operation
    fn step_elementary(&mut self) {
        let start = self.execution.elementary_operations();
        while self.execution.elementary_operations() == start {
            if !self.step_forward() {
                return;
            }
        }
    }

    fn run_to_end(&mut self) {
        let start = self.execution.steps();
        while self.execution.steps() - start < RUN_STEP_LIMIT {
            if !self.step_forward() {
                return;
            }
        }
        self.status_message = format!("Paused after {RUN_STEP_LIMIT} steps");
    }

    fn report_end(&mut self) {
        if let Some(exit) = self.execution.exit_value() {
            self.status_message = format!(
                "Program finished with exit value {}",
                crate::memory::value::word_to_int(exit)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::ExecutionConfig;
    use crate::program::Program;

    fn app(program: &Program) -> App<'_> {
        App::new(
            Execution::new(program, ExecutionConfig { seed: Some(3) }),
            String::new(),
        )
    }

    #[test]
    fn test_focus_cycles() {
        let mut pane = FocusedPane::Source;
        for _ in 0..4 {
            pane = pane.next();
        }
        assert_eq!(pane, FocusedPane::Source);
        assert_eq!(FocusedPane::Heap.next().prev(), FocusedPane::Heap);
    }

    #[test]
    fn test_run_key_reports_exit() {
        let program = Program::load("FUNCTION main() RETURN 2 + 5 END").expect("valid program");
        let mut app = app(&program);
        app.handle_key_event(KeyEvent::from(KeyCode::Enter));
        assert_eq!(app.status_message, "Program finished with exit value 7");
    }

    #[test]
    fn test_next_op_key_stops_after_one_operation() {
        let program = Program::load("FUNCTION main() x = 1 y = 2 END").expect("valid program");
        let mut app = app(&program);
        app.handle_key_event(KeyEvent::from(KeyCode::Char('s')));
        assert_eq!(app.execution.elementary_operations(), 1);
        assert!(app.execution.is_running());
    }

    #[test]
    fn test_error_is_shown() {
        let program = Program::load("FUNCTION main() x = 1 / 0 END").expect("valid program");
        let mut app = app(&program);
        app.handle_key_event(KeyEvent::from(KeyCode::Enter));
        assert!(app.execution.error().is_some());
        assert!(app.status_message.contains("undefined"));
    }
}
