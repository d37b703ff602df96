//! Loop statement execution (`FOR`, `WHILE`).
//!
//! Adds `impl Execution` methods resuming [`Frame::For`] and
//! [`Frame::While`] frames. While the body runs, the loop frame waits below
//! it already set to its next stage (the increment for `FOR`, the condition
//! for `WHILE`), so `CONTINUE` only has to drop the body frames and `BREAK`
//! drops the loop frame as well.

use crate::interpreter::engine::{Execution, Frame, Step};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::io::OutputSink;
use crate::memory::value::{word_to_bool, word_to_int, wrap_int, Address};
use crate::parser::ast::{Expr, SourceLocation, Stmt};

/// State of a `FOR(variable; start; end)` loop
pub(crate) struct ForFrame<'p> {
    variable: &'p str,
    start: &'p Expr,
    end: &'p Expr,
    body: &'p [Stmt],
    location: SourceLocation,
    address: Address,
    limit: i32,
    stage: ForStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForStage {
    Declare,
    Initialise,
    Guard,
    Test,
    Increment,
    IncrementDone,
}

impl<'p> ForFrame<'p> {
    pub(crate) fn new(
        variable: &'p str,
        start: &'p Expr,
        end: &'p Expr,
        body: &'p [Stmt],
        location: SourceLocation,
    ) -> Self {
        Self {
            variable,
            start,
            end,
            body,
            location,
            address: 0,
            limit: 0,
            stage: ForStage::Declare,
        }
    }
}

/// State of a `WHILE(condition)` loop
pub(crate) struct WhileFrame<'p> {
    condition: &'p Expr,
    body: &'p [Stmt],
    location: SourceLocation,
    stage: WhileStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhileStage {
    Condition,
    Evaluated,
    Decide(bool),
}

impl<'p> WhileFrame<'p> {
    pub(crate) fn new(condition: &'p Expr, body: &'p [Stmt], location: SourceLocation) -> Self {
        Self {
            condition,
            body,
            location,
            stage: WhileStage::Condition,
        }
    }
}

impl<'p, S: OutputSink> Execution<'p, S> {
    /// One elementary step to initialise the variable, one per guard test,
    /// two per increment. The bounds are evaluated once; the variable is
    /// re-read at every test, so the body may move it.
    pub(crate) fn resume_for(&mut self, mut state: ForFrame<'p>) -> Result<Option<Step>, RuntimeError> {
        let location = state.location;
        match state.stage {
            ForStage::Declare => {
                state.address = self.memory.declare_variable(state.variable, location)?;
                state.stage = ForStage::Initialise;
                let (start, end) = (state.start, state.end);
                self.frames.push(Frame::For(state));
                self.eval(end);
                self.eval(start);
                Ok(None)
            }
            ForStage::Initialise => {
                state.limit = word_to_int(self.pop_value());
                let start = self.pop_value();
                self.memory.write(i64::from(state.address), start, location)?;
                state.stage = ForStage::Guard;
                self.frames.push(Frame::For(state));
                Ok(Some(Step::elementary(location)))
            }
            ForStage::Guard => {
                state.stage = ForStage::Test;
                self.frames.push(Frame::For(state));
                Ok(Some(Step::elementary(location)))
            }
            ForStage::Test => {
                let current = word_to_int(self.memory.read(i64::from(state.address), location)?);
                if current < state.limit {
                    let body = state.body;
                    state.stage = ForStage::Increment;
                    self.frames.push(Frame::For(state));
                    self.push_block(body);
                }
                Ok(None)
            }
            ForStage::Increment => {
                let address = i64::from(state.address);
                let current = word_to_int(self.memory.read(address, location)?);
                self.memory
                    .write(address, wrap_int(i64::from(current) + 1), location)?;
                state.stage = ForStage::IncrementDone;
                self.frames.push(Frame::For(state));
                Ok(Some(Step::elementary(location)))
            }
            ForStage::IncrementDone => {
                state.stage = ForStage::Guard;
                self.frames.push(Frame::For(state));
                Ok(Some(Step::elementary(location)))
            }
        }
    }

    /// The condition is decoded, then one elementary step marks it
    /// evaluated, then the body runs if it held
    pub(crate) fn resume_while(
        &mut self,
        mut state: WhileFrame<'p>,
    ) -> Result<Option<Step>, RuntimeError> {
        let location = state.location;
        match state.stage {
            WhileStage::Condition => {
                let condition = state.condition;
                state.stage = WhileStage::Evaluated;
                self.frames.push(Frame::While(state));
                self.eval(condition);
                Ok(None)
            }
            WhileStage::Evaluated => {
                let holds = word_to_bool(self.pop_value(), location)?;
                state.stage = WhileStage::Decide(holds);
                self.frames.push(Frame::While(state));
                Ok(Some(Step::elementary(location)))
            }
            WhileStage::Decide(holds) => {
                if holds {
                    let body = state.body;
                    state.stage = WhileStage::Condition;
                    self.frames.push(Frame::While(state));
                    self.push_block(body);
                }
                Ok(None)
            }
        }
    }
}
