//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: globals block, structures and functions
//! - `statements`: assignments, IF/FOR/WHILE, RETURN/BREAK/CONTINUE, calls
//! - `expressions`: expressions with one method per precedence level
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location} : {message}")]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser for SYN-C
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    /// Number of loop bodies enclosing the statement being parsed
    pub(crate) loop_depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            loop_depth: 0,
        })
    }

    /// Parse a whole source file:
    /// `[GLOBALS ... ENDGLOBALS] {STRUCT ...} FUNCTION ... {FUNCTION ...}`
    pub fn parse_program(&mut self) -> Result<SourceFile, ParseError> {
        let mut file = SourceFile::new();

        if self.match_token(&Token::Globals(self.current_location())) {
            file.globals = self.parse_globals_block()?;
        }

        while self.match_token(&Token::Struct(self.current_location())) {
            file.structs.push(self.parse_struct_declaration()?);
        }

        loop {
            let loc = self.current_location();
            if !self.match_token(&Token::Function(loc)) {
                break;
            }
            file.functions.push(self.parse_function_declaration()?);
        }

        if file.functions.is_empty() {
            return Err(self.error_here("Expected at least one FUNCTION"));
        }

        if !self.is_at_end() {
            return Err(self.error_here(&format!(
                "Unexpected {} after the last function",
                self.peek()
            )));
        }

        Ok(file)
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(&mut self, token: &Token, message: &str) -> Result<(), ParseError> {
        if self.match_token(token) {
            Ok(())
        } else {
            Err(self.error_here(&format!("{}, found {}", message, self.peek())))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Ident(name, _) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error_here(&format!("Expected identifier, found {}", other))),
        }
    }

    pub(crate) fn expect_lparen(&mut self, context: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::LParen(self.current_location()),
            &format!("Expected '(' {}", context),
        )
    }

    pub(crate) fn expect_rparen(&mut self, context: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::RParen(self.current_location()),
            &format!("Expected ')' {}", context),
        )
    }

    pub(crate) fn expect_semicolon(&mut self, context: &str) -> Result<(), ParseError> {
        self.expect_token(
            &Token::Semicolon(self.current_location()),
            &format!("Expected ';' {}", context),
        )
    }
}

/// Parse SYN-C source text into an unvalidated [`SourceFile`]
pub fn parse_source(source: &str) -> Result<SourceFile, ParseError> {
    Parser::new(source)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_a_function() {
        let err = parse_source("GLOBALS x = 1 ENDGLOBALS").unwrap_err();
        assert!(err.message.contains("FUNCTION"));
    }

    #[test]
    fn test_full_layout() {
        let file = parse_source(
            r#"
            GLOBALS
                count = 3
                name = "bob"
            ENDGLOBALS
            STRUCT point x y ENDSTRUCT
            FUNCTION helper(a, b) RETURN a + b END
            FUNCTION main() helper(1, 2) END
            "#,
        )
        .expect("parse failed");

        assert_eq!(file.globals.len(), 2);
        assert_eq!(file.structs[0].fields, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(file.functions.len(), 2);
        assert_eq!(file.functions[0].params, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(parse_source("FUNCTION main() END x").is_err());
    }
}
