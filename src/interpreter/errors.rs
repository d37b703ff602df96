//! Runtime error types for the SYN-C engine
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! during program execution (as opposed to structural errors found at load time,
//! see [`crate::program::LoadError`]).
//!
//! All runtime errors are fatal - they halt the run and carry the source
//! location of the node being executed. Messages render as
//! `Line L, Char C : <message>`.

use crate::memory::value::Word;
use crate::parser::ast::SourceLocation;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Address outside `[1, 2^24)`
    #[error("{location} : Memory cannot be accessed at address {address}.")]
    MemoryAccess {
        address: i64,
        location: SourceLocation,
    },

    /// Write below the stack limit, into the static strings
    #[error("{location} : The address {address} is read-only.")]
    ReadOnlyWrite {
        address: i64,
        location: SourceLocation,
    },

    /// The stack would reach the lowest heap block
    #[error("{location} : Memory limit exceeded while declaring variable {variable}.")]
    MemoryExceeded {
        variable: String,
        location: SourceLocation,
    },

    #[error("{location} : Malloc cannot be called with negative or null size.")]
    MallocInvalidSize { size: i32, location: SourceLocation },

    #[error("{location} : Free can be called only on pointers allocated with malloc.")]
    FreeOfUnallocatedPointer {
        address: u32,
        location: SourceLocation,
    },

    #[error(
        "{location} : Cannot code boolean with {word:032b}. Boolean should be coded with 0000...000X."
    )]
    InvalidBooleanEncoding { word: Word, location: SourceLocation },

    #[error(
        "{location} : Cannot code character with {word:032b}. Characters should be coded with 0000...0000XXXXXXX."
    )]
    InvalidCharEncoding { word: Word, location: SourceLocation },

    #[error(
        "{location} : Cannot code pointer with {word:032b}. Pointers should be coded with 000000000XXXXXXXXXXXXXXXXXXXXXXXX."
    )]
    InvalidPointerEncoding { word: Word, location: SourceLocation },

    /// Division by zero or a float function outside its domain
    #[error("{location} : Operation is undefined for value {value:.2}.")]
    MathDomain { value: f64, location: SourceLocation },

    #[error("{location} : Variable {name} was not declared.")]
    UndeclaredVariable {
        name: String,
        location: SourceLocation,
    },

    #[error("{location} : Function {name} was not declared.")]
    UndeclaredFunction {
        name: String,
        location: SourceLocation,
    },

    #[error("{location} : Structure {name} was not declared.")]
    UndeclaredStructure {
        name: String,
        location: SourceLocation,
    },

    #[error("{location} : The field {name} was not declared in any structure.")]
    UndeclaredField {
        name: String,
        location: SourceLocation,
    },

    #[error("{location} : Wrong number of parameters in function {function}.")]
    IncorrectArgumentCount {
        function: String,
        location: SourceLocation,
    },

    /// Two type tags in a row inside `PRINT`/`PRINTERR`
    #[error("{location} : Wrong parameter {parameter} in function {function}.")]
    InvalidTypeParameter {
        parameter: String,
        function: String,
        location: SourceLocation,
    },

    #[error("{location} : String {text} cannot be casted to integer.")]
    StringToInt {
        text: String,
        location: SourceLocation,
    },

    #[error("{location} : String {text} cannot be casted to float.")]
    StringToFloat {
        text: String,
        location: SourceLocation,
    },

    #[error("{location} : Float {value:.2} cannot be casted to integer.")]
    FloatToInt { value: f64, location: SourceLocation },

    /// `READ` needed more characters and the input channel is exhausted
    #[error("{location} : No character available in standard input.")]
    NoInputAvailable { location: SourceLocation },

    /// Raised by hosts that enforce an operation quota, never by the engine
    #[error("{location} : Too many elementary operations (limit {limit}).")]
    OperationBudgetExceeded {
        limit: u64,
        location: SourceLocation,
    },
}

impl RuntimeError {
    /// Source location of the node that failed
    pub fn location(&self) -> SourceLocation {
        match self {
            RuntimeError::MemoryAccess { location, .. }
            | RuntimeError::ReadOnlyWrite { location, .. }
            | RuntimeError::MemoryExceeded { location, .. }
            | RuntimeError::MallocInvalidSize { location, .. }
            | RuntimeError::FreeOfUnallocatedPointer { location, .. }
            | RuntimeError::InvalidBooleanEncoding { location, .. }
            | RuntimeError::InvalidCharEncoding { location, .. }
            | RuntimeError::InvalidPointerEncoding { location, .. }
            | RuntimeError::MathDomain { location, .. }
            | RuntimeError::UndeclaredVariable { location, .. }
            | RuntimeError::UndeclaredFunction { location, .. }
            | RuntimeError::UndeclaredStructure { location, .. }
            | RuntimeError::UndeclaredField { location, .. }
            | RuntimeError::IncorrectArgumentCount { location, .. }
            | RuntimeError::InvalidTypeParameter { location, .. }
            | RuntimeError::StringToInt { location, .. }
            | RuntimeError::StringToFloat { location, .. }
            | RuntimeError::FloatToInt { location, .. }
            | RuntimeError::NoInputAvailable { location }
            | RuntimeError::OperationBudgetExceeded { location, .. } => *location,
        }
    }

    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::MemoryAccess { .. } => "MemoryAccess",
            RuntimeError::ReadOnlyWrite { .. } => "ReadOnlyWrite",
            RuntimeError::MemoryExceeded { .. } => "MemoryExceeded",
            RuntimeError::MallocInvalidSize { .. } => "MallocInvalidSize",
            RuntimeError::FreeOfUnallocatedPointer { .. } => "FreeOfUnallocatedPointer",
            RuntimeError::InvalidBooleanEncoding { .. } => "InvalidBooleanEncoding",
            RuntimeError::InvalidCharEncoding { .. } => "InvalidCharEncoding",
            RuntimeError::InvalidPointerEncoding { .. } => "InvalidPointerEncoding",
            RuntimeError::MathDomain { .. } => "MathDomainError",
            RuntimeError::UndeclaredVariable { .. } => "UndeclaredVariable",
            RuntimeError::UndeclaredFunction { .. } => "UndeclaredFunction",
            RuntimeError::UndeclaredStructure { .. } => "UndeclaredStructure",
            RuntimeError::UndeclaredField { .. } => "UndeclaredField",
            RuntimeError::IncorrectArgumentCount { .. } => "IncorrectArgumentCount",
            RuntimeError::InvalidTypeParameter { .. } => "InvalidTypeParameter",
            RuntimeError::StringToInt { .. } => "StringToInt",
            RuntimeError::StringToFloat { .. } => "StringToFloat",
            RuntimeError::FloatToInt { .. } => "FloatToInt",
            RuntimeError::NoInputAvailable { .. } => "NoInputAvailable",
            RuntimeError::OperationBudgetExceeded { .. } => "OperationBudgetExceeded",
        }
    }
}
