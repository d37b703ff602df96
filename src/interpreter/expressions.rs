//! Expression evaluation and the call protocol.
//!
//! Adds `impl Execution` methods resuming [`Frame::Expr`] and
//! [`Frame::Call`] frames. Operands are scheduled by pushing their frames in
//! reverse order, so they run left to right and leave their words on the
//! operand stack in source order.
//!
//! Atoms cost one structural step; every operator application, access and
//! call result costs one elementary step.

use crate::interpreter::builtins::{BuiltinOutcome, CallArg, CallFrame, CallPhase};
use crate::interpreter::engine::{Execution, Frame, Step};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::io::OutputSink;
use crate::memory::value::{
    bool_to_word, float_to_word, pointer_to_word, word_to_bool, word_to_float, word_to_int,
    word_to_pointer, wrap_int, Word,
};
use crate::parser::ast::{Argument, BinOp, CallTarget, Expr, LogicOp, SourceLocation, UnaryOp};
use tracing::trace;

impl<'p, S: OutputSink> Execution<'p, S> {
    fn push_stage(&mut self, expr: &'p Expr, stage: u8) {
        self.frames.push(Frame::Expr { expr, stage });
    }

    pub(crate) fn resume_expr(
        &mut self,
        expr: &'p Expr,
        stage: u8,
    ) -> Result<Option<Step>, RuntimeError> {
        match expr {
            Expr::Literal { value, location } => {
                let word = self.program.literal_word(value);
                self.values.push(word);
                Ok(Some(Step::structural(*location)))
            }
            Expr::Variable { name, location } => {
                let address = self.memory.variable_address(name, *location)?;
                let word = self.memory.read(i64::from(address), *location)?;
                self.values.push(word);
                Ok(Some(Step::structural(*location)))
            }
            Expr::AddressOf { name, location } => {
                let address = self.memory.variable_address(name, *location)?;
                self.values.push(pointer_to_word(address));
                Ok(Some(Step::elementary(*location)))
            }
            Expr::Call {
                target,
                args,
                location,
            } => {
                self.begin_call(target, args, *location)?;
                Ok(None)
            }
            Expr::Unary {
                op,
                operand,
                location,
            } => {
                if stage == 0 {
                    self.push_stage(expr, 1);
                    self.eval(operand);
                    return Ok(None);
                }
                let word = self.pop_value();
                let result = match op {
                    UnaryOp::Not => bool_to_word(!word_to_bool(word, *location)?),
                    UnaryOp::Deref => {
                        let address = word_to_pointer(word, *location)?;
                        self.memory.read(i64::from(address), *location)?
                    }
                };
                self.values.push(result);
                Ok(Some(Step::elementary(*location)))
            }
            Expr::Index {
                array,
                index,
                location,
            } => {
                if stage == 0 {
                    self.push_stage(expr, 1);
                    self.eval(index);
                    self.eval(array);
                    return Ok(None);
                }
                let index = word_to_int(self.pop_value());
                let base = word_to_pointer(self.pop_value(), *location)?;
                let word = self
                    .memory
                    .read(i64::from(base) + i64::from(index), *location)?;
                self.values.push(word);
                Ok(Some(Step::elementary(*location)))
            }
            Expr::Field {
                object,
                field,
                location,
            } => {
                if stage == 0 {
                    self.push_stage(expr, 1);
                    self.eval(object);
                    return Ok(None);
                }
                let base = word_to_pointer(self.pop_value(), *location)?;
                let offset = self.field_offset(field, *location)?;
                let word = self.memory.read(i64::from(base) + offset, *location)?;
                self.values.push(word);
                Ok(Some(Step::elementary(*location)))
            }
            Expr::Binary {
                op,
                left,
                right,
                location,
            } => {
                if stage == 0 {
                    self.push_stage(expr, 1);
                    self.eval(right);
                    self.eval(left);
                    return Ok(None);
                }
                let right = self.pop_value();
                let left = self.pop_value();
                self.values.push(binary_op(*op, left, right, *location)?);
                Ok(Some(Step::elementary(*location)))
            }
            Expr::Logical {
                op,
                left,
                right,
                location,
            } => match stage {
                0 => {
                    self.push_stage(expr, 1);
                    self.eval(left);
                    Ok(None)
                }
                1 => {
                    let left = word_to_bool(self.pop_value(), *location)?;
                    match (op, left) {
                        (LogicOp::And, false) | (LogicOp::Or, true) => {
                            self.values.push(bool_to_word(left));
                            Ok(Some(Step::elementary(*location)))
                        }
                        _ => {
                            self.push_stage(expr, 2);
                            self.eval(right);
                            Ok(None)
                        }
                    }
                }
                _ => {
                    let right = word_to_bool(self.pop_value(), *location)?;
                    self.values.push(bool_to_word(right));
                    Ok(Some(Step::elementary(*location)))
                }
            },
        }
    }

    /// Offset of `field` in whichever structure declares it
    pub(crate) fn field_offset(
        &self,
        field: &str,
        location: SourceLocation,
    ) -> Result<i64, RuntimeError> {
        self.program
            .field_index(field)
            .map(|index| index as i64)
            .ok_or_else(|| RuntimeError::UndeclaredField {
                name: field.to_string(),
                location,
            })
    }

    /// Check the callee and its arity, then schedule argument evaluation
    fn begin_call(
        &mut self,
        target: &'p CallTarget,
        args: &'p [Argument],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let accepted = match target {
            CallTarget::Builtin(builtin) => builtin.arity().accepts(args.len()),
            CallTarget::Function(name) => {
                let function =
                    self.program
                        .function(name)
                        .ok_or_else(|| RuntimeError::UndeclaredFunction {
                            name: name.clone(),
                            location,
                        })?;
                function.params.len() == args.len()
            }
        };
        if !accepted {
            return Err(RuntimeError::IncorrectArgumentCount {
                function: target.name().to_string(),
                location,
            });
        }

        self.frames.push(Frame::Call(CallFrame {
            target,
            args,
            location,
            next_arg: 0,
            phase: CallPhase::Arguments,
        }));
        Ok(())
    }

    pub(crate) fn resume_call(
        &mut self,
        mut call: CallFrame<'p>,
    ) -> Result<Option<Step>, RuntimeError> {
        let location = call.location;
        match std::mem::replace(&mut call.phase, CallPhase::Arguments) {
            CallPhase::Arguments => {
                let args = call.args;
                while let Some(arg) = args.get(call.next_arg) {
                    call.next_arg += 1;
                    if let Argument::Value(value) = arg {
                        self.frames.push(Frame::Call(call));
                        self.eval(value);
                        return Ok(None);
                    }
                }
                self.dispatch(call)
            }
            CallPhase::Initialise {
                address,
                values,
                next,
            } => {
                let word = values.get(next).copied().unwrap_or(0);
                self.memory
                    .write(i64::from(address) + next as i64, word, location)?;
                call.phase = if next + 1 < values.len() {
                    CallPhase::Initialise {
                        address,
                        values,
                        next: next + 1,
                    }
                } else {
                    CallPhase::Finish(pointer_to_word(address))
                };
                self.frames.push(Frame::Call(call));
                Ok(Some(Step::elementary(location)))
            }
            CallPhase::Read { word, count } => self.resume_read(call, word, count),
            // the callee's Body frame left the result on the operand stack
            CallPhase::Callee => Ok(Some(Step::elementary(location))),
            CallPhase::Finish(word) => {
                self.values.push(word);
                Ok(Some(Step::elementary(location)))
            }
        }
    }

    /// All arguments are evaluated: enter the callee or run the built-in
    fn dispatch(&mut self, mut call: CallFrame<'p>) -> Result<Option<Step>, RuntimeError> {
        let location = call.location;
        let count = call
            .args
            .iter()
            .filter(|arg| matches!(arg, Argument::Value(_)))
            .count();
        let words = self.values.split_off(self.values.len().saturating_sub(count));

        match call.target {
            CallTarget::Function(name) => {
                let program = self.program;
                let function =
                    program
                        .function(name)
                        .ok_or_else(|| RuntimeError::UndeclaredFunction {
                            name: name.clone(),
                            location,
                        })?;
                self.memory
                    .push_frame(name, &function.params, &words, location)?;
                trace!(
                    function = %name,
                    depth = self.memory.stack().depth(),
                    "enter"
                );
                call.phase = CallPhase::Callee;
                self.frames.push(Frame::Call(call));
                self.frames.push(Frame::Body);
                self.push_block(&function.body);
                Ok(None)
            }
            CallTarget::Builtin(builtin) => {
                let mut words = words.into_iter();
                let args: Vec<CallArg<'p>> = call
                    .args
                    .iter()
                    .map(|arg| match arg {
                        Argument::Value(_) => CallArg::Word(words.next().unwrap_or(0)),
                        Argument::Tag(tag) => CallArg::Tag(*tag),
                        Argument::StructName(name) => CallArg::Struct(name.as_str()),
                    })
                    .collect();

                match self.call_builtin(*builtin, &args, location)? {
                    BuiltinOutcome::Value(word) => {
                        self.values.push(word);
                        Ok(Some(Step::elementary(location)))
                    }
                    BuiltinOutcome::Initialise { address, values } => {
                        call.phase = CallPhase::Initialise {
                            address,
                            values,
                            next: 0,
                        };
                        self.resume_call(call)
                    }
                    BuiltinOutcome::Read => self.resume_read(call, 0, 0),
                }
            }
        }
    }
}

/// Apply a binary operator to two words
pub(crate) fn binary_op(
    op: BinOp,
    left: Word,
    right: Word,
    location: SourceLocation,
) -> Result<Word, RuntimeError> {
    let (a, b) = (i64::from(word_to_int(left)), i64::from(word_to_int(right)));
    let (x, y) = (
        f64::from(word_to_float(left)),
        f64::from(word_to_float(right)),
    );

    let word = match op {
        BinOp::Add => wrap_int(a + b),
        BinOp::Sub => wrap_int(a - b),
        BinOp::Mul => wrap_int(a * b),
        // the reported value is the divisor
        BinOp::Div | BinOp::Mod if b == 0 => {
            return Err(RuntimeError::MathDomain {
                value: b as f64,
                location,
            })
        }
        BinOp::Div => {
            let quotient = a / b;
            if a % b != 0 && (a < 0) != (b < 0) {
                wrap_int(quotient - 1)
            } else {
                wrap_int(quotient)
            }
        }
        BinOp::Mod => {
            let remainder = a % b;
            if remainder != 0 && (remainder < 0) != (b < 0) {
                wrap_int(remainder + b)
            } else {
                wrap_int(remainder)
            }
        }
        BinOp::FAdd => float_to_word(x + y),
        BinOp::FSub => float_to_word(x - y),
        BinOp::FMul => float_to_word(x * y),
        BinOp::FDiv if y == 0.0 => return Err(RuntimeError::MathDomain { value: y, location }),
        BinOp::FDiv => float_to_word(x / y),
        BinOp::Lt => bool_to_word(a < b),
        BinOp::Le => bool_to_word(a <= b),
        BinOp::Gt => bool_to_word(a > b),
        BinOp::Ge => bool_to_word(a >= b),
        BinOp::FLt => bool_to_word(x < y),
        BinOp::FLe => bool_to_word(x <= y),
        BinOp::FGt => bool_to_word(x > y),
        BinOp::FGe => bool_to_word(x >= y),
        BinOp::Eq => bool_to_word(left == right),
        BinOp::Ne => bool_to_word(left != right),
    };
    Ok(word)
}
