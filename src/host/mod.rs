//! Budgeted agent driver
//!
//! An [`Agent`] is the match-side view of one running program. Each turn the
//! referee hands it some input lines and expects one line of output back
//! within an elementary-operation budget. Anything else (a runtime error, a
//! `READ` with no input left, the budget running out, or `main` returning
//! before printing) loses the match, and a lost agent never plays again.

use crate::interpreter::constants::{
    DEBUG_OUTPUT_LIMIT, FIRST_TURN_OPERATION_BUDGET, TURN_OPERATION_BUDGET,
};
use crate::interpreter::engine::{Execution, ExecutionConfig};
use crate::interpreter::errors::RuntimeError;
use crate::parser::ast::SourceLocation;
use crate::program::Program;
use tracing::{debug, warn};

/// Sent when the program reads past the input of the turn
pub const NO_INPUT_MESSAGE: &str = "No character available in standard input. ";

/// Sent when no line came out within the budget
pub const TIMEOUT_MESSAGE: &str =
    "Program ended or too many elementary operations before sending an input";

/// Prefix of the message rejecting a program with structural errors
pub const INVALID_PROGRAM_MESSAGE: &str = "Your program contains the following error: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig {
    pub execution: ExecutionConfig,
    /// Elementary operations allowed before the first line
    pub first_turn_budget: u64,
    /// Elementary operations allowed before each later line
    pub turn_budget: u64,
    /// Characters of `PRINTERR` output kept per turn
    pub stderr_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            execution: ExecutionConfig::default(),
            first_turn_budget: FIRST_TURN_OPERATION_BUDGET,
            turn_budget: TURN_OPERATION_BUDGET,
            stderr_limit: DEBUG_OUTPUT_LIMIT,
        }
    }
}

/// Result of one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Output { line: String, debug: Vec<String> },
    Failed { reason: String, debug: Vec<String> },
}

/// Load a submitted program, formatting structural errors for the player
pub fn load_program(source: &str) -> Result<Program, String> {
    Program::load(source).map_err(|err| format!("{}{}.", INVALID_PROGRAM_MESSAGE, err))
}

enum Stop {
    Output,
    Budget,
    Ended,
    NoInput,
    Error(RuntimeError),
}

pub struct Agent<'p> {
    execution: Execution<'p>,
    config: AgentConfig,
    turns: u32,
    failure: Option<String>,
}

impl<'p> Agent<'p> {
    pub fn new(program: &'p Program, config: AgentConfig) -> Self {
        Self {
            execution: Execution::new(program, config.execution),
            config,
            turns: 0,
            failure: None,
        }
    }

    /// Feed this turn's input and run until the program prints something
    pub fn play_turn<I, L>(&mut self, input_lines: I) -> Turn
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        if let Some(reason) = &self.failure {
            return Turn::Failed {
                reason: reason.clone(),
                debug: Vec::new(),
            };
        }

        let budget = if self.turns == 0 {
            self.config.first_turn_budget
        } else {
            self.config.turn_budget
        };
        self.turns += 1;

        let input = self.execution.input_mut();
        for line in input_lines {
            input.push_str(line.as_ref());
        }
        input.set_exhausted(true);

        let stop = self.run_turn(budget);
        let line = self.execution.take_stdout().trim().to_string();
        let debug = self.debug_lines();

        let reason = match stop {
            Stop::Output => {
                debug!(turn = self.turns, %line, "agent output");
                return Turn::Output { line, debug };
            }
            Stop::Budget => {
                let location = self.execution.location();
                self.execution.fail(RuntimeError::OperationBudgetExceeded {
                    limit: budget,
                    location,
                });
                format!("{}{}", TIMEOUT_MESSAGE, last_position(Some(location)))
            }
            Stop::Ended => format!("{}{}", TIMEOUT_MESSAGE, last_position(None)),
            Stop::NoInput => format!(
                "{}{}",
                NO_INPUT_MESSAGE,
                last_position(Some(self.execution.location()))
            ),
            Stop::Error(err) => err.to_string(),
        };

        warn!(turn = self.turns, %reason, "agent lost");
        self.failure = Some(reason.clone());
        Turn::Failed { reason, debug }
    }

    fn run_turn(&mut self, budget: u64) -> Stop {
        let start = self.execution.elementary_operations();
        loop {
            if !self.execution.stdout().is_empty() {
                return Stop::Output;
            }
            if self.execution.elementary_operations() - start >= budget {
                return Stop::Budget;
            }
            match self.execution.advance() {
                Ok(Some(_)) => {}
                Ok(None) => return Stop::Ended,
                Err(RuntimeError::NoInputAvailable { .. }) => return Stop::NoInput,
                Err(err) => return Stop::Error(err),
            }
        }
    }

    /// This turn's `PRINTERR` output, cut to the configured length
    fn debug_lines(&mut self) -> Vec<String> {
        let text = self.execution.take_stderr();
        let kept: String = text.trim().chars().take(self.config.stderr_limit).collect();
        if kept.is_empty() {
            return Vec::new();
        }
        kept.split('\n').map(str::to_string).collect()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Why the agent lost, if it did
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn turns_played(&self) -> u32 {
        self.turns
    }

    pub fn execution(&self) -> &Execution<'p> {
        &self.execution
    }
}

fn last_position(location: Option<SourceLocation>) -> String {
    match location {
        Some(location) => format!(
            " Last Line : {} ; Last char in line : {}",
            location.line, location.column
        ),
        None => " Last Line : End of the program ; Last char in line : N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AgentConfig {
        AgentConfig {
            execution: ExecutionConfig { seed: Some(3) },
            ..AgentConfig::default()
        }
    }

    fn no_input() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn test_turns_return_lines() {
        let program = load_program(
            r#"FUNCTION main()
                FOR(i; 0; 3) PRINT(INT, i, "\n") PRINTERR("turn ", INT, i) ENDFOR
            END"#,
        )
        .expect("valid program");
        let mut agent = Agent::new(&program, config());

        for expected in ["0", "1", "2"] {
            match agent.play_turn(no_input()) {
                Turn::Output { line, debug } => {
                    assert_eq!(line, expected);
                    assert!(debug.is_empty() || debug[0].starts_with("turn"));
                }
                other => panic!("unexpected turn {:?}", other),
            }
        }
        assert_eq!(agent.turns_played(), 3);
    }

    #[test]
    fn test_program_ending_without_output_loses() {
        let program = load_program("FUNCTION main() x = 1 END").expect("valid program");
        let mut agent = Agent::new(&program, config());
        match agent.play_turn(no_input()) {
            Turn::Failed { reason, .. } => {
                assert!(reason.starts_with(TIMEOUT_MESSAGE));
                assert!(reason.contains("End of the program"));
            }
            other => panic!("unexpected turn {:?}", other),
        }
        assert!(agent.is_failed());
    }

    #[test]
    fn test_budget_is_enforced() {
        let program =
            load_program("FUNCTION main() WHILE(TRUE) ENDWHILE END").expect("valid program");
        let mut agent = Agent::new(
            &program,
            AgentConfig {
                first_turn_budget: 100,
                ..config()
            },
        );
        assert!(matches!(agent.play_turn(no_input()), Turn::Failed { .. }));
        assert_eq!(agent.execution().elementary_operations(), 100);
        assert!(matches!(
            agent.execution().error(),
            Some(RuntimeError::OperationBudgetExceeded { limit: 100, .. })
        ));
    }

    #[test]
    fn test_later_turns_use_turn_budget() {
        let program = load_program(
            r#"FUNCTION main()
                PRINT("ready")
                FOR(i; 0; 1000) ENDFOR
                PRINT("done")
            END"#,
        )
        .expect("valid program");
        let mut agent = Agent::new(
            &program,
            AgentConfig {
                turn_budget: 50,
                ..config()
            },
        );
        assert!(matches!(agent.play_turn(no_input()), Turn::Output { .. }));
        assert!(matches!(agent.play_turn(no_input()), Turn::Failed { .. }));
    }

    #[test]
    fn test_read_uses_turn_input() {
        let program = load_program(
            "FUNCTION main() WHILE(TRUE) n = READ() PRINT(INT, n * 2, \"\\n\") ENDWHILE END",
        )
        .expect("valid program");
        let mut agent = Agent::new(&program, config());

        let turn = agent.play_turn(["00000000000000000000000000010101"]);
        assert_eq!(
            turn,
            Turn::Output {
                line: "42".to_string(),
                debug: Vec::new()
            }
        );

        match agent.play_turn(no_input()) {
            Turn::Failed { reason, .. } => assert!(reason.starts_with(NO_INPUT_MESSAGE)),
            other => panic!("unexpected turn {:?}", other),
        }
    }

    #[test]
    fn test_failure_is_sticky() {
        let program = load_program("FUNCTION main() x = 1 / 0 END").expect("valid program");
        let mut agent = Agent::new(&program, config());
        let first = agent.play_turn(no_input());
        match &first {
            Turn::Failed { reason, .. } => assert!(reason.contains("undefined")),
            other => panic!("unexpected turn {:?}", other),
        }
        assert!(matches!(agent.play_turn(no_input()), Turn::Failed { .. }));
        assert!(agent
            .failure()
            .is_some_and(|reason| reason.contains("undefined")));
    }

    #[test]
    fn test_debug_output_is_truncated() {
        let program = load_program(
            r#"FUNCTION main() FOR(i; 0; 100) PRINTERR("0123456789") ENDFOR PRINT("x") END"#,
        )
        .expect("valid program");
        let mut agent = Agent::new(
            &program,
            AgentConfig {
                stderr_limit: 25,
                ..config()
            },
        );
        match agent.play_turn(no_input()) {
            Turn::Output { debug, .. } => assert_eq!(debug.concat().len(), 25),
            other => panic!("unexpected turn {:?}", other),
        }
    }

    #[test]
    fn test_invalid_program_message() {
        let err = load_program("FUNCTION start() END").expect_err("no main");
        assert!(err.starts_with(INVALID_PROGRAM_MESSAGE));
        assert!(err.ends_with('.'));
    }
}
