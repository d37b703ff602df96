//! Declaration parsing implementation
//!
//! This module handles parsing of the top-level parts of a SYN-C program:
//!
//! - The globals block: `GLOBALS name = literal ... ENDGLOBALS`
//! - Structure declarations: `STRUCT name field field ... ENDSTRUCT`
//! - Function declarations: `FUNCTION name(params) statements END`
//!
//! # Grammar
//!
//! ```text
//! globals   ::= "GLOBALS" { identifier "=" literal } "ENDGLOBALS"
//! struct    ::= "STRUCT" identifier identifier { identifier } "ENDSTRUCT"
//! function  ::= "FUNCTION" identifier "(" [ identifier { "," identifier } ] ")"
//!               statements "END"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse the body of a globals block; `GLOBALS` is already consumed
    pub(crate) fn parse_globals_block(&mut self) -> Result<Vec<GlobalDecl>, ParseError> {
        let mut globals = Vec::new();

        while !self.match_token(&Token::EndGlobals(self.current_location())) {
            let name = self.expect_identifier()?;
            let location = self.current_location();
            self.expect_token(
                &Token::Eq(location),
                &format!("Expected '=' after global {}", name),
            )?;
            let value = self.parse_global_literal()?;
            globals.push(GlobalDecl {
                name,
                value,
                location,
            });
        }

        Ok(globals)
    }

    fn parse_global_literal(&mut self) -> Result<Literal, ParseError> {
        let literal = match self.peek() {
            Token::IntLiteral(text, _) => Literal::Int(text.clone()),
            Token::FloatLiteral(value, _) => Literal::Float(*value),
            Token::CharLiteral(raw, _) => Literal::Char(raw.clone()),
            Token::StringLiteral(raw, _) => Literal::Str(raw.clone()),
            Token::True(_) => Literal::True,
            Token::False(_) => Literal::False,
            Token::Null(_) => Literal::Null,
            other => {
                return Err(self.error_here(&format!(
                    "Global variables must be initialised with a literal, found {}",
                    other
                )))
            }
        };
        self.advance();
        Ok(literal)
    }

    /// Parse a structure declaration; `STRUCT` is already consumed
    pub(crate) fn parse_struct_declaration(&mut self) -> Result<StructDecl, ParseError> {
        let location = self.previous_location();
        let name = self.expect_identifier()?;

        let mut fields = Vec::new();
        while !self.match_token(&Token::EndStruct(self.current_location())) {
            fields.push(self.expect_identifier()?);
        }

        if fields.is_empty() {
            return Err(ParseError {
                message: format!("Structure {} must declare at least one field", name),
                location,
            });
        }

        Ok(StructDecl {
            name,
            fields,
            location,
        })
    }

    /// Parse a function declaration; `FUNCTION` is already consumed
    pub(crate) fn parse_function_declaration(&mut self) -> Result<FunctionDecl, ParseError> {
        let location = self.previous_location();
        let name = self.expect_identifier()?;

        self.expect_lparen("after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_rparen("after parameters")?;

        let body = self.parse_block(|token| matches!(token, Token::End(_)))?;
        self.expect_token(
            &Token::End(self.current_location()),
            &format!("Expected END to close function {}", name),
        )?;

        Ok(FunctionDecl {
            name,
            params,
            body,
            location,
        })
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();

        if self.check(&Token::RParen(self.current_location())) {
            return Ok(params);
        }

        loop {
            params.push(self.expect_identifier()?);
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(params)
    }
}
