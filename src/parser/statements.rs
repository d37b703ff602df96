//! Statement parsing implementation
//!
//! This module handles parsing of all SYN-C statement types:
//!
//! - Assignments: `x = e`, `a[i] = e`, `s->f = e`, `$p = e`
//! - Control flow: `IF`/`ELIF`/`ELSE`/`ENDIF`, `FOR`/`ENDFOR`, `WHILE`/`ENDWHILE`
//! - Jump statements: `RETURN e`, `BREAK`, `CONTINUE`
//! - Bare calls: `f(x)`, `PRINT(INT, x)`
//!
//! Statements have no terminator; one ends where the next token cannot
//! continue its expression.
//!
//! # Grammar
//!
//! ```text
//! statement ::= assignment | if_stmt | for_stmt | while_stmt
//!             | "RETURN" expr | "BREAK" | "CONTINUE" | call
//! if_stmt   ::= "IF" "(" expr ")" statements
//!               { "ELIF" "(" expr ")" statements }
//!               [ "ELSE" statements ] "ENDIF"
//! for_stmt  ::= "FOR" "(" identifier ";" expr ";" expr ")" statements "ENDFOR"
//! while_stmt ::= "WHILE" "(" expr ")" statements "ENDWHILE"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse statements until `is_terminator` matches the next token.
    /// The terminator itself is left for the caller to consume.
    pub(crate) fn parse_block(
        &mut self,
        is_terminator: impl Fn(&Token) -> bool,
    ) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();

        while !is_terminator(self.peek()) {
            if self.is_at_end() {
                return Err(self.error_here("Unexpected end of file inside a block"));
            }
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let loc = self.current_location();

        if self.match_token(&Token::If(loc)) {
            return self.parse_if_statement(loc);
        }

        if self.match_token(&Token::For(loc)) {
            return self.parse_for_statement(loc);
        }

        if self.match_token(&Token::While(loc)) {
            return self.parse_while_statement(loc);
        }

        if self.match_token(&Token::Return(loc)) {
            let value = self.parse_expression()?;
            return Ok(Stmt::Return {
                value,
                location: loc,
            });
        }

        if self.match_token(&Token::Break(loc)) {
            self.require_loop("BREAK", loc)?;
            return Ok(Stmt::Break { location: loc });
        }

        if self.match_token(&Token::Continue(loc)) {
            self.require_loop("CONTINUE", loc)?;
            return Ok(Stmt::Continue { location: loc });
        }

        self.parse_assignment_or_call()
    }

    fn require_loop(&self, keyword: &str, location: SourceLocation) -> Result<(), ParseError> {
        if self.loop_depth == 0 {
            return Err(ParseError {
                message: format!("{} can only be used inside a loop", keyword),
                location,
            });
        }
        Ok(())
    }

    /// Parse `target = value` or a bare call. The target is parsed as an
    /// ordinary expression and then checked for an assignable shape.
    fn parse_assignment_or_call(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_location();
        let expr = self.parse_expression()?;

        let loc = self.current_location();
        if !self.match_token(&Token::Eq(loc)) {
            return match expr {
                Expr::Call { location, .. } => Ok(Stmt::Call {
                    call: expr,
                    location,
                }),
                _ => Err(ParseError {
                    message: "Expected an assignment or a function call".to_string(),
                    location: start,
                }),
            };
        }

        let value = self.parse_expression()?;
        match expr {
            Expr::Variable { name, .. } => Ok(Stmt::Assign {
                target: name,
                value,
                location: loc,
            }),
            Expr::Index { array, index, .. } => Ok(Stmt::IndexAssign {
                array: *array,
                index: *index,
                value,
                location: loc,
            }),
            Expr::Field { object, field, .. } => Ok(Stmt::FieldAssign {
                object: *object,
                field,
                value,
                location: loc,
            }),
            Expr::Unary {
                op: UnaryOp::Deref,
                operand,
                ..
            } => Ok(Stmt::DerefAssign {
                pointer: *operand,
                value,
                location: loc,
            }),
            _ => Err(ParseError {
                message: "Invalid assignment target".to_string(),
                location: start,
            }),
        }
    }

    fn parse_condition(&mut self, keyword: &str) -> Result<Expr, ParseError> {
        self.expect_lparen(&format!("after {}", keyword))?;
        let condition = self.parse_expression()?;
        self.expect_rparen(&format!("after {} condition", keyword))?;
        Ok(condition)
    }

    /// Parse IF statement; `IF` is already consumed
    fn parse_if_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let ends_branch =
            |token: &Token| matches!(token, Token::Elif(_) | Token::Else(_) | Token::EndIf(_));

        let mut branches = Vec::new();
        let condition = self.parse_condition("IF")?;
        let body = self.parse_block(ends_branch)?;
        branches.push(CondBranch { condition, body });

        while self.match_token(&Token::Elif(self.current_location())) {
            let condition = self.parse_condition("ELIF")?;
            let body = self.parse_block(ends_branch)?;
            branches.push(CondBranch { condition, body });
        }

        let else_body = if self.match_token(&Token::Else(self.current_location())) {
            Some(self.parse_block(|token| matches!(token, Token::EndIf(_)))?)
        } else {
            None
        };

        self.expect_token(
            &Token::EndIf(self.current_location()),
            "Expected ENDIF to close IF",
        )?;

        Ok(Stmt::If {
            branches,
            else_body,
            location,
        })
    }

    /// Parse FOR statement; `FOR` is already consumed
    fn parse_for_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        self.expect_lparen("after FOR")?;
        let variable = self.expect_identifier()?;
        self.expect_semicolon("after FOR variable")?;
        let start = self.parse_expression()?;
        self.expect_semicolon("after FOR start")?;
        let end = self.parse_expression()?;
        self.expect_rparen("after FOR end")?;

        let body = self.parse_loop_body(|token| matches!(token, Token::EndFor(_)))?;
        self.expect_token(
            &Token::EndFor(self.current_location()),
            "Expected ENDFOR to close FOR",
        )?;

        Ok(Stmt::For {
            variable,
            start,
            end,
            body,
            location,
        })
    }

    /// Parse WHILE statement; `WHILE` is already consumed
    fn parse_while_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let condition = self.parse_condition("WHILE")?;

        let body = self.parse_loop_body(|token| matches!(token, Token::EndWhile(_)))?;
        self.expect_token(
            &Token::EndWhile(self.current_location()),
            "Expected ENDWHILE to close WHILE",
        )?;

        Ok(Stmt::While {
            condition,
            body,
            location,
        })
    }

    fn parse_loop_body(
        &mut self,
        is_terminator: impl Fn(&Token) -> bool,
    ) -> Result<Vec<Stmt>, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_block(is_terminator);
        self.loop_depth -= 1;
        body
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::parse_source;

    fn main_body(source: &str) -> Vec<Stmt> {
        let program = format!("FUNCTION main() {} END", source);
        parse_source(&program)
            .expect("parse failed")
            .functions
            .remove(0)
            .body
    }

    #[test]
    fn test_assignment_targets() {
        let body = main_body("x = 1 a[0] = 2 s->f = 3 $p = 4");
        assert!(matches!(&body[0], Stmt::Assign { target, .. } if target == "x"));
        assert!(matches!(body[1], Stmt::IndexAssign { .. }));
        assert!(matches!(&body[2], Stmt::FieldAssign { field, .. } if field == "f"));
        assert!(matches!(body[3], Stmt::DerefAssign { .. }));
    }

    #[test]
    fn test_if_elif_else_chain() {
        let body = main_body("IF(a) x = 1 ELIF(b) x = 2 ELIF(c) x = 3 ELSE x = 4 ENDIF");
        match &body[0] {
            Stmt::If {
                branches,
                else_body,
                ..
            } => {
                assert_eq!(branches.len(), 3);
                assert_eq!(else_body.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("expected IF, got {:?}", other),
        }
    }

    #[test]
    fn test_break_outside_loop_is_rejected() {
        let err = parse_source("FUNCTION main() IF(TRUE) BREAK ENDIF END").unwrap_err();
        assert!(err.message.contains("BREAK"));
    }

    #[test]
    fn test_break_inside_nested_if_in_loop() {
        let body = main_body("WHILE(TRUE) IF(x == 1) BREAK ENDIF CONTINUE ENDWHILE");
        assert!(matches!(body[0], Stmt::While { .. }));
    }

    #[test]
    fn test_bare_expression_is_rejected() {
        assert!(parse_source("FUNCTION main() x + 1 END").is_err());
    }

    #[test]
    fn test_for_statement_parts() {
        let body = main_body("FOR(i; 0; n + 1) PRINT(INT, i) ENDFOR");
        match &body[0] {
            Stmt::For {
                variable, body, ..
            } => {
                assert_eq!(variable, "i");
                assert!(matches!(body[0], Stmt::Call { .. }));
            }
            other => panic!("expected FOR, got {:?}", other),
        }
    }
}
