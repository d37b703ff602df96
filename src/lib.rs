//! # Introduction
//!
//! `synctty` runs programs written in SYN-C, the small language in which
//! agents of a turn-based game are written. Execution is stepped: the
//! caller decides when the program advances and can stop it between any two
//! steps, which is how a game host meters each agent's elementary operations
//! per turn.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Program → Execution ⇄ Host / TUI
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST.
//! 2. [`program`]: validates the AST and lays out the static memory image
//!    (string literals, then globals).
//! 3. [`memory`]: the flat word store with its call stack and heap.
//! 4. [`interpreter`]: the stepped engine and the built-in library.
//! 5. [`host`]: turn-by-turn driver enforcing operation budgets.
//! 6. [`ui`]: ratatui step viewer; not part of the stable library API.

pub mod host;
pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod program;
pub mod ui;
