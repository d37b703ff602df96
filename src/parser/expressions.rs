//! Expression parsing implementation
//!
//! Precedence climbing with one method per level, loosest first:
//!
//! ```text
//! logic       ::= equality { ("AND" | "OR") equality }
//! equality    ::= comparison { ("==" | "!=") comparison }
//! comparison  ::= additive { ("<" | "<=" | ">" | ">=" | "<." | "<=." | ">." | ">=.") additive }
//! additive    ::= modulo { ("+" | "-" | "+." | "-.") modulo }
//! modulo      ::= multiplicative { "%" multiplicative }
//! multiplicative ::= unary { ("*" | "/" | "*." | "/.") unary }
//! unary       ::= "NOT" unary | "$" unary | "&" identifier | postfix
//! postfix     ::= primary { "[" expr "]" | "->" identifier }
//! primary     ::= literal | identifier | call | "(" expr ")"
//! ```
//!
//! Every binary level is left-associative.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse expression (entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_logic()
    }

    fn parse_logic(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;

        loop {
            let op = match self.peek() {
                Token::And(_) => LogicOp::And,
                Token::Or(_) => LogicOp::Or,
                _ => break,
            };
            let location = self.advance().location();
            let right = self.parse_equality()?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse one left-associative binary level
    fn parse_binary_level(
        &mut self,
        operator: impl Fn(&Token) -> Option<BinOp>,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;

        while let Some(op) = operator(self.peek()) {
            let location = self.advance().location();
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |token| match token {
                Token::EqEq(_) => Some(BinOp::Eq),
                Token::NotEq(_) => Some(BinOp::Ne),
                _ => None,
            },
            Self::parse_comparison,
        )
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |token| match token {
                Token::Lt(_) => Some(BinOp::Lt),
                Token::Le(_) => Some(BinOp::Le),
                Token::Gt(_) => Some(BinOp::Gt),
                Token::Ge(_) => Some(BinOp::Ge),
                Token::FLt(_) => Some(BinOp::FLt),
                Token::FLe(_) => Some(BinOp::FLe),
                Token::FGt(_) => Some(BinOp::FGt),
                Token::FGe(_) => Some(BinOp::FGe),
                _ => None,
            },
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |token| match token {
                Token::Plus(_) => Some(BinOp::Add),
                Token::Minus(_) => Some(BinOp::Sub),
                Token::FPlus(_) => Some(BinOp::FAdd),
                Token::FMinus(_) => Some(BinOp::FSub),
                _ => None,
            },
            Self::parse_modulo,
        )
    }

    fn parse_modulo(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |token| match token {
                Token::Percent(_) => Some(BinOp::Mod),
                _ => None,
            },
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(
            |token| match token {
                Token::Star(_) => Some(BinOp::Mul),
                Token::Slash(_) => Some(BinOp::Div),
                Token::FStar(_) => Some(BinOp::FMul),
                Token::FSlash(_) => Some(BinOp::FDiv),
                _ => None,
            },
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        if self.match_token(&Token::Not(location)) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                location,
            });
        }

        if self.match_token(&Token::Dollar(location)) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Deref,
                operand: Box::new(operand),
                location,
            });
        }

        if self.match_token(&Token::Amp(location)) {
            let name = self.expect_identifier()?;
            return Ok(Expr::AddressOf { name, location });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let location = self.current_location();
            if self.match_token(&Token::LBracket(location)) {
                let index = self.parse_expression()?;
                self.expect_token(
                    &Token::RBracket(self.current_location()),
                    "Expected ']' after index",
                )?;
                expr = Expr::Index {
                    array: Box::new(expr),
                    index: Box::new(index),
                    location,
                };
            } else if self.match_token(&Token::Arrow(location)) {
                let field = self.expect_identifier()?;
                expr = Expr::Field {
                    object: Box::new(expr),
                    field,
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        let literal = match self.peek() {
            Token::IntLiteral(text, _) => Some(Literal::Int(text.clone())),
            Token::FloatLiteral(value, _) => Some(Literal::Float(*value)),
            Token::CharLiteral(raw, _) => Some(Literal::Char(raw.clone())),
            Token::StringLiteral(raw, _) => Some(Literal::Str(raw.clone())),
            Token::True(_) => Some(Literal::True),
            Token::False(_) => Some(Literal::False),
            Token::Null(_) => Some(Literal::Null),
            _ => None,
        };
        if let Some(value) = literal {
            self.advance();
            return Ok(Expr::Literal { value, location });
        }

        match self.peek().clone() {
            Token::Ident(name, _) => {
                self.advance();
                if self.check(&Token::LParen(self.current_location())) {
                    self.parse_call(CallTarget::Function(name))
                } else {
                    Ok(Expr::Variable { name, location })
                }
            }
            Token::Builtin(builtin, _) => {
                self.advance();
                self.parse_call(CallTarget::Builtin(builtin))
            }
            Token::LParen(_) => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect_rparen("after parenthesised expression")?;
                Ok(inner)
            }
            other => Err(self.error_here(&format!("Expected expression, found {}", other))),
        }
    }

    /// Parse the argument list of a call; the callee name is already consumed
    fn parse_call(&mut self, target: CallTarget) -> Result<Expr, ParseError> {
        let location = self.current_location();
        self.expect_lparen(&format!("after {}", target.name()))?;

        let args = match target {
            CallTarget::Builtin(Builtin::MallocStruct) => {
                vec![Argument::StructName(self.expect_identifier()?)]
            }
            CallTarget::Builtin(Builtin::ElementaryOperations) => match self.peek() {
                Token::TypeTag(tag @ (TypeTag::Int | TypeTag::Float), _) => {
                    let tag = *tag;
                    self.advance();
                    vec![Argument::Tag(tag)]
                }
                other => {
                    return Err(self.error_here(&format!(
                        "ELEMENTARY_OPERATIONS expects INT or FLOAT, found {}",
                        other
                    )))
                }
            },
            CallTarget::Builtin(builtin) => self.parse_arguments(builtin.takes_type_tags())?,
            CallTarget::Function(_) => self.parse_arguments(false)?,
        };

        self.expect_rparen(&format!("after arguments of {}", target.name()))?;

        Ok(Expr::Call {
            target,
            args,
            location,
        })
    }

    fn parse_arguments(&mut self, allow_tags: bool) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();

        if self.check(&Token::RParen(self.current_location())) {
            return Ok(args);
        }

        loop {
            match self.peek() {
                Token::TypeTag(tag, _) if allow_tags => {
                    let tag = *tag;
                    self.advance();
                    args.push(Argument::Tag(tag));
                }
                _ => args.push(Argument::Value(self.parse_expression()?)),
            }
            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> Expr {
        let mut parser = Parser::new(source).expect("lexing failed");
        parser.parse_expression().expect("parse failed")
    }

    #[test]
    fn test_multiplication_binds_tighter_than_modulo() {
        // a % b * c parses as a % (b * c)
        match expr("a % b * c") {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, BinOp::Mod);
                assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        match expr("a - b - c") {
            Expr::Binary { op, left, .. } => {
                assert_eq!(op, BinOp::Sub);
                assert!(matches!(*left, Expr::Binary { op: BinOp::Sub, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_and_or_share_a_level() {
        match expr("a OR b AND c") {
            Expr::Logical { op, left, .. } => {
                assert_eq!(op, LogicOp::And);
                assert!(matches!(*left, Expr::Logical { op: LogicOp::Or, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_deref_applies_to_field_access() {
        match expr("$p->next") {
            Expr::Unary { op, operand, .. } => {
                assert_eq!(op, UnaryOp::Deref);
                assert!(matches!(*operand, Expr::Field { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_print_arguments_mix_tags_and_values() {
        match expr("PRINT(INT, x, \"s\", FLOAT, 1.5)") {
            Expr::Call { target, args, .. } => {
                assert_eq!(target, CallTarget::Builtin(Builtin::Print));
                assert_eq!(args.len(), 5);
                assert_eq!(args[0], Argument::Tag(TypeTag::Int));
                assert_eq!(args[3], Argument::Tag(TypeTag::Float));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_type_tags_only_in_print() {
        let mut parser = Parser::new("foo(INT)").expect("lexing failed");
        assert!(parser.parse_expression().is_err());
    }

    #[test]
    fn test_malloc_struct_takes_a_name() {
        match expr("MALLOC_STRUCT(node)") {
            Expr::Call { args, .. } => {
                assert_eq!(args, vec![Argument::StructName("node".to_string())]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_operator_location() {
        let e = expr("a\n  + b");
        assert_eq!(e.location().line, 2);
        assert_eq!(e.location().column, 3);
    }
}
