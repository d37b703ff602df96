//! Stepped execution engine
//!
//! [`Execution`] runs one loaded [`Program`] as an explicit state machine.
//! Instead of recursing through the AST, it keeps a stack of [`Frame`]s,
//! one per node still in progress, and an operand stack of words produced
//! by finished expressions. Each call to [`Execution::advance`] resumes
//! frames until one of them reports a [`Step`], so the driver regains
//! control between any two steps with the whole state consistent.
//!
//! # Control signals
//!
//! `BREAK`, `CONTINUE` and `RETURN` set a pending [`Flow`]. While a signal
//! is pending, frames are popped without being resumed until one intercepts
//! it: loops take `Break` and `Continue`, the function body boundary takes
//! `Return`. `IF` frames never intercept anything.

use crate::interpreter::builtins::CallFrame;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::io::{InputChannel, OutputBuffer, OutputSink};
use crate::interpreter::loops::{ForFrame, WhileFrame};
use crate::interpreter::statements::IfFrame;
use crate::memory::value::{word_to_int, Word};
use crate::memory::Memory;
use crate::parser::ast::{Expr, SourceLocation, Stmt};
use crate::program::Program;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace, warn};

/// Per-run settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Seed of the `RAND` generator; `None` draws one from the OS
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Counted against the operation budget
    Elementary,
    /// Bookkeeping with no cost
    Structural,
    /// `READ` is waiting for characters that have not been pushed yet
    AwaitingInput,
}

/// What one call to [`Execution::advance`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub location: SourceLocation,
}

impl Step {
    pub fn elementary(location: SourceLocation) -> Self {
        Self {
            kind: StepKind::Elementary,
            location,
        }
    }

    pub fn structural(location: SourceLocation) -> Self {
        Self {
            kind: StepKind::Structural,
            location,
        }
    }

    pub fn awaiting_input(location: SourceLocation) -> Self {
        Self {
            kind: StepKind::AwaitingInput,
            location,
        }
    }

    pub fn is_elementary(&self) -> bool {
        self.kind == StepKind::Elementary
    }
}

/// Outcome of executing a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Normal(Option<Word>),
    Break,
    Continue,
    Return(Word),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Running,
    /// `main` returned this word
    Finished(Word),
    Failed(RuntimeError),
}

/// A node whose execution is in progress
pub(crate) enum Frame<'p> {
    /// `stage` counts the resumptions so far
    Expr { expr: &'p Expr, stage: u8 },
    /// `address` holds the target of a plain assignment once declared
    Stmt {
        stmt: &'p Stmt,
        stage: u8,
        address: u32,
    },
    /// Statements of a block, `next` being the one to start on resumption
    Block { body: &'p [Stmt], next: usize },
    If(IfFrame<'p>),
    For(ForFrame<'p>),
    While(WhileFrame<'p>),
    Call(CallFrame<'p>),
    /// Function body boundary: pops the memory frame and yields the result
    Body,
    EnterMain,
}

/// One running program
pub struct Execution<'p, S: OutputSink = OutputBuffer> {
    pub(crate) program: &'p Program,
    pub(crate) memory: Memory,
    pub(crate) frames: Vec<Frame<'p>>,
    pub(crate) values: Vec<Word>,
    pending: Option<Flow>,
    pub(crate) rng: StdRng,
    pub(crate) stdout: S,
    pub(crate) stderr: S,
    pub(crate) input: InputChannel,
    elementary_operations: u64,
    steps: u64,
    location: SourceLocation,
    state: RunState,
}

impl<'p> Execution<'p, OutputBuffer> {
    /// Start `main` with in-memory output buffers
    pub fn new(program: &'p Program, config: ExecutionConfig) -> Self {
        Self::with_sinks(program, config, OutputBuffer::new(), OutputBuffer::new())
    }

    /// Standard output written since the last take
    pub fn take_stdout(&mut self) -> String {
        self.stdout.take()
    }

    pub fn take_stderr(&mut self) -> String {
        self.stderr.take()
    }
}

impl<'p, S: OutputSink> Execution<'p, S> {
    pub fn with_sinks(program: &'p Program, config: ExecutionConfig, stdout: S, stderr: S) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let location = program
            .main()
            .map(|main| main.location)
            .unwrap_or_default();

        Self {
            program,
            memory: Memory::new(program.image(), program.stack_limit(), program.globals()),
            frames: vec![Frame::EnterMain],
            values: Vec::new(),
            pending: None,
            rng,
            stdout,
            stderr,
            input: InputChannel::new(),
            elementary_operations: 0,
            steps: 0,
            location,
            state: RunState::Running,
        }
    }

    /// Run until the next step.
    ///
    /// Returns `Ok(None)` once `main` has returned. A runtime error ends the
    /// run; it is returned by this call and by every later one.
    pub fn advance(&mut self) -> Result<Option<Step>, RuntimeError> {
        match &self.state {
            RunState::Finished(_) => return Ok(None),
            RunState::Failed(err) => return Err(err.clone()),
            RunState::Running => {}
        }

        match self.next_step() {
            Ok(Some(step)) => {
                self.steps += 1;
                if step.is_elementary() {
                    self.elementary_operations += 1;
                }
                self.location = step.location;
                Ok(Some(step))
            }
            Ok(None) => {
                let exit = self.values.pop().unwrap_or(0);
                debug!(
                    exit = word_to_int(exit),
                    elementary_operations = self.elementary_operations,
                    "program finished"
                );
                self.state = RunState::Finished(exit);
                Ok(None)
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "runtime error");
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Run to completion with no further input: a `READ` that finds the
    /// queue empty fails with `NoInputAvailable`
    pub fn run_to_end(&mut self) -> Result<Word, RuntimeError> {
        self.input.set_exhausted(true);
        while self.advance()?.is_some() {}
        Ok(self.exit_value().unwrap_or(0))
    }

    /// Mark the run failed from outside, e.g. when a host budget runs out
    pub fn fail(&mut self, err: RuntimeError) {
        self.frames.clear();
        self.values.clear();
        self.pending = None;
        self.state = RunState::Failed(err);
    }

    fn next_step(&mut self) -> Result<Option<Step>, RuntimeError> {
        while let Some(frame) = self.frames.pop() {
            if let Some(flow) = self.pending.take() {
                self.unwind(frame, flow);
                continue;
            }
            if let Some(step) = self.resume(frame)? {
                return Ok(Some(step));
            }
        }
        Ok(None)
    }

    fn resume(&mut self, frame: Frame<'p>) -> Result<Option<Step>, RuntimeError> {
        match frame {
            Frame::Expr { expr, stage } => self.resume_expr(expr, stage),
            Frame::Stmt {
                stmt,
                stage,
                address,
            } => self.resume_stmt(stmt, stage, address),
            Frame::Block { body, next } => {
                if let Some(stmt) = body.get(next) {
                    if next + 1 < body.len() {
                        self.frames.push(Frame::Block {
                            body,
                            next: next + 1,
                        });
                    }
                    self.start_stmt(stmt);
                }
                Ok(None)
            }
            Frame::If(state) => self.resume_if(state),
            Frame::For(state) => self.resume_for(state),
            Frame::While(state) => self.resume_while(state),
            Frame::Call(call) => self.resume_call(call),
            Frame::Body => {
                // fell off the end without RETURN
                self.memory.pop_frame();
                self.values.push(0);
                Ok(None)
            }
            Frame::EnterMain => {
                let program = self.program;
                let main = program
                    .main()
                    .ok_or_else(|| RuntimeError::UndeclaredFunction {
                        name: "main".to_string(),
                        location: SourceLocation::default(),
                    })?;
                self.memory.push_frame(&main.name, &[], &[], main.location)?;
                trace!(function = "main", "enter");
                self.frames.push(Frame::Body);
                self.push_block(&main.body);
                Ok(None)
            }
        }
    }

    /// Hand a pending signal to `frame`, which either consumes it or is
    /// discarded while the signal keeps propagating
    fn unwind(&mut self, frame: Frame<'p>, flow: Flow) {
        match (frame, flow) {
            // loops wait at their increment/condition stage while the body runs
            (frame @ (Frame::For(_) | Frame::While(_)), Flow::Continue) => self.frames.push(frame),
            (Frame::For(_) | Frame::While(_), Flow::Break) => {}
            (Frame::Body, Flow::Return(word)) => {
                self.memory.pop_frame();
                self.values.push(word);
            }
            (_, flow) => self.pending = Some(flow),
        }
    }

    pub(crate) fn signal(&mut self, flow: Flow) {
        if !matches!(flow, Flow::Normal(_)) {
            self.pending = Some(flow);
        }
    }

    pub(crate) fn eval(&mut self, expr: &'p Expr) {
        self.frames.push(Frame::Expr { expr, stage: 0 });
    }

    pub(crate) fn start_stmt(&mut self, stmt: &'p Stmt) {
        self.frames.push(Frame::Stmt {
            stmt,
            stage: 0,
            address: 0,
        });
    }

    pub(crate) fn push_block(&mut self, body: &'p [Stmt]) {
        if !body.is_empty() {
            self.frames.push(Frame::Block { body, next: 0 });
        }
    }

    /// Result of the most recently finished expression
    pub(crate) fn pop_value(&mut self) -> Word {
        self.values.pop().unwrap_or(0)
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn exit_value(&self) -> Option<Word> {
        match self.state {
            RunState::Finished(word) => Some(word),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RuntimeError> {
        match &self.state {
            RunState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Elementary operations performed so far
    pub fn elementary_operations(&self) -> u64 {
        self.elementary_operations
    }

    /// All steps performed so far, elementary or not
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Location of the last step
    pub fn location(&self) -> SourceLocation {
        self.location
    }

    pub fn stdout(&self) -> &S {
        &self.stdout
    }

    pub fn stdout_mut(&mut self) -> &mut S {
        &mut self.stdout
    }

    pub fn stderr(&self) -> &S {
        &self.stderr
    }

    pub fn stderr_mut(&mut self) -> &mut S {
        &mut self.stderr
    }

    pub fn input(&self) -> &InputChannel {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputChannel {
        &mut self.input
    }
}

/// Steps until the run ends; the first error is yielded once, then the
/// iterator stops
impl<'p, S: OutputSink> Iterator for Execution<'p, S> {
    type Item = Result<Step, RuntimeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, RunState::Failed(_)) {
            return None;
        }
        self.advance().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::int_to_word;

    fn load(source: &str) -> Program {
        Program::load(source).expect("valid program")
    }

    fn seeded() -> ExecutionConfig {
        ExecutionConfig { seed: Some(7) }
    }

    #[test]
    fn test_empty_main_finishes_without_steps() {
        let program = load("FUNCTION main() END");
        let mut execution = Execution::new(&program, seeded());
        assert_eq!(execution.advance(), Ok(None));
        assert_eq!(execution.exit_value(), Some(0));
        assert_eq!(execution.steps(), 0);
    }

    #[test]
    fn test_assignment_steps() {
        let program = load("FUNCTION main() x = 1 + 2 END");
        let execution = Execution::new(&program, seeded());
        let kinds: Vec<StepKind> = execution
            .map(|step| step.expect("no error").kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Structural,
                StepKind::Structural,
                StepKind::Elementary,
                StepKind::Elementary,
            ]
        );
    }

    #[test]
    fn test_main_return_is_exit_value() {
        let program = load("FUNCTION main() RETURN 3 * 4 x = 1 END");
        let mut execution = Execution::new(&program, seeded());
        assert_eq!(execution.run_to_end(), Ok(int_to_word(12)));
        // RETURN skipped the last assignment
        assert_eq!(execution.elementary_operations(), 1);
        assert_eq!(execution.memory().stack().depth(), 0);
    }

    #[test]
    fn test_error_is_sticky() {
        let program = load("FUNCTION main() x = y END");
        let mut execution = Execution::new(&program, seeded());
        let first = execution.run_to_end();
        assert!(matches!(first, Err(RuntimeError::UndeclaredVariable { .. })));
        assert_eq!(execution.advance(), first.map(|_| None));
        assert!(execution.error().is_some());
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let program = load("FUNCTION main() x = 1 / 0 END");
        let execution = Execution::new(&program, seeded());
        let results: Vec<_> = execution.collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results.last(),
            Some(Err(RuntimeError::MathDomain { .. }))
        ));
    }

    #[test]
    fn test_read_suspends_until_input_arrives() {
        let program = load("FUNCTION main() RETURN READ() END");
        let mut execution = Execution::new(&program, seeded());
        let step = execution.advance().expect("no error").expect("a step");
        assert_eq!(step.kind, StepKind::AwaitingInput);

        execution.input_mut().push_str("0000000000000000");
        let step = execution.advance().expect("no error").expect("a step");
        assert_eq!(step.kind, StepKind::AwaitingInput);

        execution.input_mut().push_str("00000000 00000101\n");
        assert_eq!(execution.run_to_end(), Ok(5));
    }

    #[test]
    fn test_external_failure_stops_run() {
        let program = load("FUNCTION main() WHILE(TRUE) ENDWHILE END");
        let mut execution = Execution::new(&program, seeded());
        for _ in 0..10 {
            execution.advance().expect("loop runs");
        }
        let err = RuntimeError::OperationBudgetExceeded {
            limit: 5,
            location: execution.location(),
        };
        execution.fail(err.clone());
        assert_eq!(execution.advance(), Err(err));
        assert!(!execution.is_running());
    }
}
