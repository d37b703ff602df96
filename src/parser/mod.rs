//! SYN-C source parser
//!
//! This module transforms SYN-C source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser state, helpers and the [`parse_source`] entry point
//! - [`ast`]: AST node definitions
//!
//! # Language shape
//!
//! - Upper-case keywords, lower-case identifiers
//! - One optional `GLOBALS` block, then `STRUCT` declarations, then functions
//! - Statements have no separators and blocks are closed by `END*` keywords
//! - Integer and float operators are distinct (`+` versus `+.`)
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{parse_source, ParseError, Parser};
