//! Built-in function implementations
//!
//! This module provides the closed SYN-C library, handled by the engine
//! rather than defined in user code.
//!
//! # Supported Built-ins
//!
//! - math on floats: `FABS COS SIN TAN SQRT EXP LN POW SH CH TH CEIL FLOOR ROUND`
//! - `IABS` on integers
//! - memory: `MALLOC(size, init...)`, `MALLOC_STRUCT(name)`, `FREE(ptr)`
//! - casts: `I2F F2I I2S F2S S2I S2F V2B`
//! - randomness: `RAND`, `SRAND(seed)`
//! - I/O: `PRINT PRINTERR FLUSH FLUSHERR READ`
//! - `ELEMENTARY_OPERATIONS(INT|FLOAT)`
//!
//! # Implementation Notes
//!
//! - Float functions compute in double precision and store the result as a
//!   single-precision word, so overflow gives an infinity.
//! - A NaN produced from a non-NaN argument is a `MathDomain` error.
//! - `MALLOC` initialisers and `READ` span several steps; they are driven
//!   by the call frame rather than finished here.

use crate::interpreter::constants::READ_WORD_BITS;
use crate::interpreter::engine::{Execution, Frame, Step};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::io::OutputSink;
use crate::memory::value::{
    bool_to_word, float_to_word, format_float, int_to_word, pointer_to_word, word_to_bool,
    word_to_char, word_to_float, word_to_int, word_to_pointer, wrap_int, Address, Word,
};
use crate::parser::ast::{Argument, Builtin, CallTarget, SourceLocation, TypeTag};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A call in progress
pub(crate) struct CallFrame<'p> {
    pub(crate) target: &'p CallTarget,
    pub(crate) args: &'p [Argument],
    pub(crate) location: SourceLocation,
    /// Index of the next argument to evaluate
    pub(crate) next_arg: usize,
    pub(crate) phase: CallPhase,
}

pub(crate) enum CallPhase {
    Arguments,
    /// Writing `MALLOC` initialisers, one step each
    Initialise {
        address: Address,
        values: Vec<Word>,
        next: usize,
    },
    /// Collecting the binary digits of a `READ`
    Read { word: Word, count: u32 },
    /// Waiting for a user function body to finish
    Callee,
    Finish(Word),
}

/// An evaluated argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CallArg<'p> {
    Word(Word),
    Tag(TypeTag),
    Struct(&'p str),
}

pub(crate) enum BuiltinOutcome {
    Value(Word),
    Initialise { address: Address, values: Vec<Word> },
    Read,
}

impl<'p, S: OutputSink> Execution<'p, S> {
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: &[CallArg<'p>],
        location: SourceLocation,
    ) -> Result<BuiltinOutcome, RuntimeError> {
        let word = |index: usize| match args.get(index) {
            Some(CallArg::Word(word)) => *word,
            _ => 0,
        };
        let float = |index: usize| f64::from(word_to_float(word(index)));

        let result = match builtin {
            Builtin::Iabs => int_to_word(word_to_int(word(0)).wrapping_abs()),
            Builtin::Fabs
            | Builtin::Cos
            | Builtin::Sin
            | Builtin::Tan
            | Builtin::Sqrt
            | Builtin::Exp
            | Builtin::Ln
            | Builtin::Sh
            | Builtin::Ch
            | Builtin::Th
            | Builtin::Ceil
            | Builtin::Floor
            | Builtin::Round => float_function(builtin, float(0), location)?,
            Builtin::Pow => power(float(0), float(1), location)?,
            Builtin::Malloc => {
                let address = self.memory.allocate(word_to_int(word(0)), location)?;
                let values: Vec<Word> = args
                    .iter()
                    .skip(1)
                    .filter_map(|arg| match arg {
                        CallArg::Word(word) => Some(*word),
                        _ => None,
                    })
                    .collect();
                if !values.is_empty() {
                    return Ok(BuiltinOutcome::Initialise { address, values });
                }
                pointer_to_word(address)
            }
            Builtin::MallocStruct => {
                let name = match args.first() {
                    Some(CallArg::Struct(name)) => *name,
                    _ => "",
                };
                let structure = self.program.structure(name).ok_or_else(|| {
                    RuntimeError::UndeclaredStructure {
                        name: name.to_string(),
                        location,
                    }
                })?;
                let size = structure.fields.len() as i32;
                pointer_to_word(self.memory.allocate(size, location)?)
            }
            Builtin::Free => {
                let address = word_to_pointer(word(0), location)?;
                self.memory.free(address, location)?;
                0
            }
            Builtin::Read => return Ok(BuiltinOutcome::Read),
            Builtin::Rand => float_to_word(f64::from(self.rng.gen::<f32>())),
            Builtin::Srand => {
                self.rng = StdRng::seed_from_u64(i64::from(word_to_int(word(0))) as u64);
                0
            }
            Builtin::I2f => float_to_word(f64::from(word_to_int(word(0)))),
            Builtin::F2i => float_to_int(float(0), location)?,
            Builtin::I2s => {
                let text = word_to_int(word(0)).to_string();
                self.write_truncated(&text, word(1), word(2), location)?;
                0
            }
            Builtin::F2s => {
                let text = format_float(float(0));
                self.write_truncated(&text, word(1), word(2), location)?;
                0
            }
            Builtin::S2i => {
                let text = self.read_string_arg(word(0), location)?;
                parse_int(&text, location)?
            }
            Builtin::S2f => {
                let text = self.read_string_arg(word(0), location)?;
                text.trim()
                    .parse::<f64>()
                    .map(float_to_word)
                    .map_err(|_| RuntimeError::StringToFloat { text, location })?
            }
            Builtin::V2b => bool_to_word(word(0) != 0),
            Builtin::Flush => {
                self.stdout.flush();
                0
            }
            Builtin::FlushErr => {
                self.stderr.flush();
                0
            }
            Builtin::Print | Builtin::PrintErr => {
                self.print(builtin, args, location)?;
                0
            }
            Builtin::ElementaryOperations => {
                let count = self.elementary_operations();
                match args.first() {
                    Some(CallArg::Tag(TypeTag::Float)) => float_to_word(count as f64),
                    _ => wrap_int(count as i64),
                }
            }
        };
        Ok(BuiltinOutcome::Value(result))
    }

    /// Pull binary digits until a full word is collected. Suspends with an
    /// `AwaitingInput` step while the channel is empty but still open.
    pub(crate) fn resume_read(
        &mut self,
        mut call: CallFrame<'p>,
        mut word: Word,
        mut count: u32,
    ) -> Result<Option<Step>, RuntimeError> {
        let location = call.location;
        while count < READ_WORD_BITS {
            match self.input.pop() {
                Some(digit @ ('0' | '1')) => {
                    word = (word << 1) | Word::from(digit == '1');
                    count += 1;
                }
                Some(_) => {}
                None if self.input.is_exhausted() => {
                    return Err(RuntimeError::NoInputAvailable { location });
                }
                None => {
                    call.phase = CallPhase::Read { word, count };
                    self.frames.push(Frame::Call(call));
                    return Ok(Some(Step::awaiting_input(location)));
                }
            }
        }
        self.values.push(word);
        Ok(Some(Step::elementary(location)))
    }

    /// Format each value by the tag before it and write it out at once, so
    /// a failure part way leaves the earlier values printed
    fn print(
        &mut self,
        builtin: Builtin,
        args: &[CallArg<'p>],
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let mut tag: Option<TypeTag> = None;
        for arg in args {
            match *arg {
                CallArg::Tag(next) => {
                    if let Some(current) = tag {
                        return Err(RuntimeError::InvalidTypeParameter {
                            parameter: current.name().to_string(),
                            function: builtin.name().to_string(),
                            location,
                        });
                    }
                    tag = Some(next);
                }
                CallArg::Word(word) => {
                    let text = self.render(tag.take().unwrap_or(TypeTag::String), word, location)?;
                    if builtin == Builtin::PrintErr {
                        self.stderr.write_str(&text);
                    } else {
                        self.stdout.write_str(&text);
                    }
                }
                CallArg::Struct(_) => {}
            }
        }
        Ok(())
    }

    fn render(&self, tag: TypeTag, word: Word, location: SourceLocation) -> Result<String, RuntimeError> {
        let text = match tag {
            TypeTag::Int => word_to_int(word).to_string(),
            TypeTag::Float => format_float(f64::from(word_to_float(word))),
            TypeTag::Bool => match word_to_bool(word, location)? {
                true => "True".to_string(),
                false => "False".to_string(),
            },
            TypeTag::Char => word_to_char(word, location)?.to_string(),
            TypeTag::String => self.read_string_arg(word, location)?,
            TypeTag::Pointer => word_to_pointer(word, location)?.to_string(),
        };
        Ok(text)
    }

    fn read_string_arg(&self, word: Word, location: SourceLocation) -> Result<String, RuntimeError> {
        let address = word_to_pointer(word, location)?;
        self.memory.read_string(i64::from(address), location)
    }

    /// Write `text` cut to `size` characters; a negative size drops that
    /// many characters from the end instead
    fn write_truncated(
        &mut self,
        text: &str,
        pointer: Word,
        size: Word,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let address = word_to_pointer(pointer, location)?;
        let size = i64::from(word_to_int(size));
        let len = text.len() as i64;
        let keep = if size >= 0 {
            size.min(len)
        } else {
            (len + size).max(0)
        };
        self.memory
            .write_string(i64::from(address), &text[..keep as usize], location)
    }
}

fn float_function(builtin: Builtin, x: f64, location: SourceLocation) -> Result<Word, RuntimeError> {
    let domain_error = || RuntimeError::MathDomain { value: x, location };
    let result = match builtin {
        Builtin::Fabs => x.abs(),
        Builtin::Cos => x.cos(),
        Builtin::Sin => x.sin(),
        Builtin::Tan => x.tan(),
        Builtin::Sqrt => x.sqrt(),
        Builtin::Exp => x.exp(),
        Builtin::Ln if x <= 0.0 => return Err(domain_error()),
        Builtin::Ln => x.ln(),
        Builtin::Sh => x.sinh(),
        Builtin::Ch => x.cosh(),
        Builtin::Th => x.tanh(),
        Builtin::Ceil => x.ceil(),
        Builtin::Floor => x.floor(),
        Builtin::Round => x.round_ties_even(),
        _ => x,
    };
    if result.is_nan() && !x.is_nan() {
        return Err(domain_error());
    }
    Ok(float_to_word(result))
}

fn power(x: f64, y: f64, location: SourceLocation) -> Result<Word, RuntimeError> {
    let result = x.powf(y);
    if (x == 0.0 && y < 0.0) || (result.is_nan() && !x.is_nan() && !y.is_nan()) {
        return Err(RuntimeError::MathDomain { value: x, location });
    }
    Ok(float_to_word(result))
}

/// Truncate toward zero; the result must fit in 32 bits
fn float_to_int(value: f64, location: SourceLocation) -> Result<Word, RuntimeError> {
    let truncated = value.trunc();
    if !value.is_finite() || truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
        return Err(RuntimeError::FloatToInt { value, location });
    }
    Ok(int_to_word(truncated as i32))
}

fn parse_int(text: &str, location: SourceLocation) -> Result<Word, RuntimeError> {
    text.trim()
        .parse::<i32>()
        .map(int_to_word)
        .map_err(|_| RuntimeError::StringToInt {
            text: text.to_string(),
            location,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn apply(builtin: Builtin, x: f64) -> Result<f32, RuntimeError> {
        float_function(builtin, x, here()).map(word_to_float)
    }

    #[test]
    fn test_float_functions() {
        assert_eq!(apply(Builtin::Fabs, -2.5), Ok(2.5));
        assert_eq!(apply(Builtin::Sqrt, 16.0), Ok(4.0));
        assert_eq!(apply(Builtin::Ceil, 1.2), Ok(2.0));
        assert_eq!(apply(Builtin::Floor, -1.2), Ok(-2.0));
        assert_eq!(apply(Builtin::Exp, 0.0), Ok(1.0));
        assert_eq!(apply(Builtin::Exp, 1000.0), Ok(f32::INFINITY));
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(apply(Builtin::Round, 0.5), Ok(0.0));
        assert_eq!(apply(Builtin::Round, 1.5), Ok(2.0));
        assert_eq!(apply(Builtin::Round, 2.5), Ok(2.0));
        assert_eq!(apply(Builtin::Round, -2.7), Ok(-3.0));
    }

    #[test]
    fn test_domain_errors() {
        for (builtin, x) in [
            (Builtin::Sqrt, -1.0),
            (Builtin::Ln, 0.0),
            (Builtin::Ln, -3.0),
            (Builtin::Cos, f64::INFINITY),
        ] {
            assert!(
                matches!(apply(builtin, x), Err(RuntimeError::MathDomain { .. })),
                "{} of {}",
                builtin.name(),
                x
            );
        }
        // NaN in, NaN out
        assert!(apply(Builtin::Sqrt, f64::NAN).map(f32::is_nan).unwrap_or(false));
    }

    #[test]
    fn test_power() {
        assert_eq!(power(2.0, 10.0, here()).map(word_to_float), Ok(1024.0));
        assert_eq!(power(4.0, 0.5, here()).map(word_to_float), Ok(2.0));
        assert!(power(0.0, -1.0, here()).is_err());
        assert!(power(-8.0, 1.0 / 3.0, here()).is_err());
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(float_to_int(-2.9, here()), Ok(int_to_word(-2)));
        assert_eq!(float_to_int(2147483520.0, here()), Ok(int_to_word(2147483520)));
        assert!(float_to_int(2147483648.0, here()).is_err());
        assert!(float_to_int(f64::NAN, here()).is_err());
        assert!(float_to_int(f64::NEG_INFINITY, here()).is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(" -42 ", here()), Ok(int_to_word(-42)));
        assert_eq!(parse_int("+7", here()), Ok(7));
        assert!(parse_int("2147483648", here()).is_err());
        assert!(parse_int("4x", here()).is_err());
        assert!(parse_int("", here()).is_err());
    }
}
