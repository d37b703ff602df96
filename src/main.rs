//! synctty: run, check or step through SYN-C agent programs

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use synctty::interpreter::io::WriterSink;
use synctty::interpreter::{Execution, ExecutionConfig, RuntimeError, StepKind};
use synctty::memory::value::word_to_int;
use synctty::program::Program;
use synctty::ui::App;

#[derive(Parser)]
#[command(name = "synctty", version, about = "Stepped runtime for SYN-C agent programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate a program without running it
    Check { file: PathBuf },

    /// Run a program, reading READ input from stdin one line at a time.
    /// The exit status is the low byte of `main`'s return value.
    Run {
        file: PathBuf,

        /// Seed for RAND; drawn from the OS when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Stop with an error after this many elementary operations
        #[arg(long)]
        max_operations: Option<u64>,
    },

    /// Step through a program in the terminal viewer
    Debug {
        file: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        /// Characters available to READ; the input is closed after them
        #[arg(long, default_value = "")]
        input: String,
    },
}

fn main() -> ExitCode {
    install_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check { file } => check(&file),
        Command::Run {
            file,
            seed,
            max_operations,
        } => run(&file, seed, max_operations),
        Command::Debug { file, seed, input } => debug_program(&file, seed, &input),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level
fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // a subscriber installed earlier (e.g. by a test harness) stays in place
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

fn load(file: &Path) -> io::Result<Option<(String, Program)>> {
    let source = fs::read_to_string(file)?;
    match Program::load(&source) {
        Ok(program) => {
            debug!(file = %file.display(), globals = program.globals().len(), "program loaded");
            Ok(Some((source, program)))
        }
        Err(err) => {
            eprintln!("{}: {err}", file.display());
            Ok(None)
        }
    }
}

fn check(file: &Path) -> io::Result<ExitCode> {
    Ok(match load(file)? {
        Some(_) => {
            println!("{}: OK", file.display());
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    })
}

fn run(file: &Path, seed: Option<u64>, max_operations: Option<u64>) -> io::Result<ExitCode> {
    let Some((_, program)) = load(file)? else {
        return Ok(ExitCode::FAILURE);
    };

    let stdout: Box<dyn Write> = Box::new(io::stdout());
    let stderr: Box<dyn Write> = Box::new(io::stderr());
    let mut execution = Execution::with_sinks(
        &program,
        ExecutionConfig { seed },
        WriterSink::new(stdout),
        WriterSink::new(stderr),
    );
    let mut stdin = io::stdin().lock();

    loop {
        match execution.advance() {
            Ok(Some(step)) => {
                if step.kind == StepKind::AwaitingInput {
                    let mut line = String::new();
                    if stdin.read_line(&mut line)? == 0 {
                        execution.input_mut().set_exhausted(true);
                    } else {
                        execution
                            .input_mut()
                            .push_str(line.trim_end_matches(['\r', '\n']));
                    }
                }
                if let Some(limit) = max_operations {
                    if execution.elementary_operations() >= limit {
                        execution.fail(RuntimeError::OperationBudgetExceeded {
                            limit,
                            location: step.location,
                        });
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                io::stdout().flush()?;
                eprintln!("{err}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    io::stdout().flush()?;
    let exit = execution.exit_value().map(word_to_int).unwrap_or(0);
    info!(
        exit,
        elementary_operations = execution.elementary_operations(),
        "program finished"
    );
    Ok(ExitCode::from(exit_status(exit)))
}

/// Process status for a finished run: the low byte of `main`'s return
/// value, as a C `exit` would report it. Runtime errors exit with 1.
fn exit_status(exit: i32) -> u8 {
    (exit & 0xff) as u8
}

fn debug_program(file: &Path, seed: Option<u64>, input: &str) -> io::Result<ExitCode> {
    let Some((source, program)) = load(file)? else {
        return Ok(ExitCode::FAILURE);
    };

    let mut execution = Execution::new(&program, ExecutionConfig { seed });
    execution.input_mut().push_str(input);
    execution.input_mut().set_exhausted(true);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(execution, source);
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map(|()| ExitCode::SUCCESS)
}
