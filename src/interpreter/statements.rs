//! Statement execution.
//!
//! Adds `impl Execution` methods resuming [`Frame::Stmt`] and [`Frame::If`]
//! frames. Loops live in [`crate::interpreter::loops`].
//!
//! Every assignment ends with one elementary step for the memory write.
//! A plain `x = e` declares `x` in the current frame before `e` runs, unless
//! `x` is a global or already local.

use crate::interpreter::engine::{Execution, Flow, Frame, Step};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::io::OutputSink;
use crate::interpreter::loops::{ForFrame, WhileFrame};
use crate::memory::value::{word_to_bool, word_to_int, word_to_pointer, Address, Word};
use crate::parser::ast::{CondBranch, SourceLocation, Stmt};

/// Progress through an `IF`/`ELIF`/`ELSE` chain
pub(crate) struct IfFrame<'p> {
    branches: &'p [CondBranch],
    else_body: Option<&'p [Stmt]>,
    location: SourceLocation,
    branch: usize,
    stage: IfStage,
}

enum IfStage {
    Condition,
    Evaluated,
    Decide(Word),
}

impl<'p, S: OutputSink> Execution<'p, S> {
    fn push_stmt_stage(&mut self, stmt: &'p Stmt, stage: u8, address: Address) {
        self.frames.push(Frame::Stmt {
            stmt,
            stage,
            address,
        });
    }

    pub(crate) fn resume_stmt(
        &mut self,
        stmt: &'p Stmt,
        stage: u8,
        address: Address,
    ) -> Result<Option<Step>, RuntimeError> {
        match stmt {
            Stmt::Assign {
                target,
                value,
                location,
            } => {
                if stage == 0 {
                    let address = self.memory.declare_variable(target, *location)?;
                    self.push_stmt_stage(stmt, 1, address);
                    self.eval(value);
                    return Ok(None);
                }
                let word = self.pop_value();
                self.memory.write(i64::from(address), word, *location)?;
                Ok(Some(Step::elementary(*location)))
            }
            Stmt::IndexAssign {
                array,
                index,
                value,
                location,
            } => {
                if stage == 0 {
                    self.push_stmt_stage(stmt, 1, 0);
                    self.eval(value);
                    self.eval(index);
                    self.eval(array);
                    return Ok(None);
                }
                let word = self.pop_value();
                let index = word_to_int(self.pop_value());
                let base = word_to_pointer(self.pop_value(), *location)?;
                self.memory
                    .write(i64::from(base) + i64::from(index), word, *location)?;
                Ok(Some(Step::elementary(*location)))
            }
            Stmt::FieldAssign {
                object,
                field,
                value,
                location,
            } => {
                if stage == 0 {
                    self.push_stmt_stage(stmt, 1, 0);
                    self.eval(value);
                    self.eval(object);
                    return Ok(None);
                }
                let word = self.pop_value();
                let base = word_to_pointer(self.pop_value(), *location)?;
                let offset = self.field_offset(field, *location)?;
                self.memory.write(i64::from(base) + offset, word, *location)?;
                Ok(Some(Step::elementary(*location)))
            }
            Stmt::DerefAssign {
                pointer,
                value,
                location,
            } => {
                if stage == 0 {
                    self.push_stmt_stage(stmt, 1, 0);
                    self.eval(value);
                    self.eval(pointer);
                    return Ok(None);
                }
                let word = self.pop_value();
                let address = word_to_pointer(self.pop_value(), *location)?;
                self.memory.write(i64::from(address), word, *location)?;
                Ok(Some(Step::elementary(*location)))
            }
            Stmt::If {
                branches,
                else_body,
                location,
            } => self.resume_if(IfFrame {
                branches,
                else_body: else_body.as_deref(),
                location: *location,
                branch: 0,
                stage: IfStage::Condition,
            }),
            Stmt::For {
                variable,
                start,
                end,
                body,
                location,
            } => self.resume_for(ForFrame::new(variable, start, end, body, *location)),
            Stmt::While {
                condition,
                body,
                location,
            } => self.resume_while(WhileFrame::new(condition, body, *location)),
            Stmt::Return { value, location } => {
                if stage == 0 {
                    self.push_stmt_stage(stmt, 1, 0);
                    self.eval(value);
                    return Ok(None);
                }
                let word = self.pop_value();
                self.signal(Flow::Return(word));
                Ok(Some(Step::structural(*location)))
            }
            Stmt::Break { location } => {
                self.signal(Flow::Break);
                Ok(Some(Step::structural(*location)))
            }
            Stmt::Continue { location } => {
                self.signal(Flow::Continue);
                Ok(Some(Step::structural(*location)))
            }
            Stmt::Call { call, .. } => {
                if stage == 0 {
                    self.push_stmt_stage(stmt, 1, 0);
                    self.eval(call);
                    return Ok(None);
                }
                let word = self.pop_value();
                self.signal(Flow::Normal(Some(word)));
                Ok(None)
            }
        }
    }

    /// Test each condition in turn; the elementary "condition evaluated"
    /// step comes before the word is decoded as a boolean
    pub(crate) fn resume_if(&mut self, mut state: IfFrame<'p>) -> Result<Option<Step>, RuntimeError> {
        match std::mem::replace(&mut state.stage, IfStage::Condition) {
            IfStage::Condition => {
                let branches = state.branches;
                match branches.get(state.branch) {
                    Some(branch) => {
                        state.stage = IfStage::Evaluated;
                        self.frames.push(Frame::If(state));
                        self.eval(&branch.condition);
                    }
                    None => {
                        if let Some(body) = state.else_body {
                            self.push_block(body);
                        }
                    }
                }
                Ok(None)
            }
            IfStage::Evaluated => {
                let location = state.location;
                state.stage = IfStage::Decide(self.pop_value());
                self.frames.push(Frame::If(state));
                Ok(Some(Step::elementary(location)))
            }
            IfStage::Decide(word) => {
                if word_to_bool(word, state.location)? {
                    let branches = state.branches;
                    if let Some(branch) = branches.get(state.branch) {
                        self.push_block(&branch.body);
                    }
                } else {
                    state.branch += 1;
                    self.frames.push(Frame::If(state));
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::{Execution, ExecutionConfig};
    use crate::interpreter::errors::RuntimeError;
    use crate::memory::value::word_to_int;
    use crate::program::Program;

    fn run(source: &str) -> (Result<i32, RuntimeError>, String, u64) {
        let program = Program::load(source).expect("valid program");
        let mut execution = Execution::new(&program, ExecutionConfig { seed: Some(1) });
        let result = execution.run_to_end().map(word_to_int);
        (result, execution.take_stdout(), execution.elementary_operations())
    }

    #[test]
    fn test_if_chain_picks_first_true_branch() {
        let (_, out, ops) = run(
            r#"FUNCTION main()
                x = 2
                IF (x == 1) PRINT("one")
                ELIF (x == 2) PRINT("two")
                ELIF (TRUE) PRINT("late")
                ELSE PRINT("none")
                ENDIF
            END"#,
        );
        assert_eq!(out, "two");
        // x=2, two comparisons, two condition steps, PRINT
        assert_eq!(ops, 6);
    }

    #[test]
    fn test_else_runs_when_nothing_matches() {
        let (_, out, _) = run(r#"FUNCTION main() IF (FALSE) PRINT("a") ELSE PRINT("b") ENDIF END"#);
        assert_eq!(out, "b");
    }

    #[test]
    fn test_if_condition_must_be_boolean() {
        let (result, _, ops) = run("FUNCTION main() IF (2) x = 1 ENDIF END");
        assert!(matches!(
            result,
            Err(RuntimeError::InvalidBooleanEncoding { .. })
        ));
        // the condition step is counted before decoding fails
        assert_eq!(ops, 1);
    }

    #[test]
    fn test_assignment_targets() {
        let (result, _, _) = run(
            "STRUCT point px py ENDSTRUCT
            FUNCTION main()
                p = MALLOC_STRUCT(point)
                p->py = 7
                a = MALLOC(3)
                a[2] = p->py + 1
                $a = a[2] * 2
                RETURN $a + a[2]
            END",
        );
        assert_eq!(result, Ok(24));
    }

    #[test]
    fn test_index_may_be_negative() {
        let (result, _, _) = run(
            "FUNCTION main() a = MALLOC(4) b = a + 2 b[-1] = 5 RETURN a[1] END",
        );
        assert_eq!(result, Ok(5));
    }

    #[test]
    fn test_undeclared_field() {
        let (result, _, _) = run("FUNCTION main() p = MALLOC(1) p->nope = 1 END");
        assert!(matches!(result, Err(RuntimeError::UndeclaredField { .. })));
    }

    #[test]
    fn test_write_to_string_is_read_only() {
        let (result, _, _) = run(r#"FUNCTION main() s = "abc" s[0] = 'x' END"#);
        assert!(matches!(result, Err(RuntimeError::ReadOnlyWrite { .. })));
    }

    #[test]
    fn test_self_reference_declares_first() {
        let (result, _, _) = run("FUNCTION main() x = x + 1 RETURN x END");
        assert_eq!(result, Ok(1));
    }
}
