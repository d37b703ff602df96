//! Lexer (tokenizer) for SYN-C source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Keywords and library functions are upper case; identifiers must start with a
//! lower-case letter, so the two never collide.

use super::ast::{Builtin, SourceLocation, TypeTag};
use std::fmt;
use thiserror::Error;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(String, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    CharLiteral(String, SourceLocation),
    StringLiteral(String, SourceLocation),

    // Names
    Ident(String, SourceLocation),
    Builtin(Builtin, SourceLocation),
    TypeTag(TypeTag, SourceLocation),

    // Keywords
    Globals(SourceLocation),
    EndGlobals(SourceLocation),
    Struct(SourceLocation),
    EndStruct(SourceLocation),
    Function(SourceLocation),
    End(SourceLocation),
    If(SourceLocation),
    Elif(SourceLocation),
    Else(SourceLocation),
    EndIf(SourceLocation),
    For(SourceLocation),
    EndFor(SourceLocation),
    While(SourceLocation),
    EndWhile(SourceLocation),
    Return(SourceLocation),
    Continue(SourceLocation),
    Break(SourceLocation),
    Not(SourceLocation),
    And(SourceLocation),
    Or(SourceLocation),
    True(SourceLocation),
    False(SourceLocation),
    Null(SourceLocation),

    // Integer arithmetic
    Plus(SourceLocation),    // +
    Minus(SourceLocation),   // -
    Star(SourceLocation),    // *
    Slash(SourceLocation),   // /
    Percent(SourceLocation), // %

    // Float arithmetic
    FPlus(SourceLocation),  // +.
    FMinus(SourceLocation), // -.
    FStar(SourceLocation),  // *.
    FSlash(SourceLocation), // /.

    // Comparison
    Lt(SourceLocation),    // <
    Le(SourceLocation),    // <=
    Gt(SourceLocation),    // >
    Ge(SourceLocation),    // >=
    FLt(SourceLocation),   // <.
    FLe(SourceLocation),   // <=.
    FGt(SourceLocation),   // >.
    FGe(SourceLocation),   // >=.
    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=

    // Memory
    Dollar(SourceLocation), // $
    Amp(SourceLocation),    // &
    Arrow(SourceLocation),  // ->

    // Punctuation
    Eq(SourceLocation),
    LParen(SourceLocation),
    RParen(SourceLocation),
    LBracket(SourceLocation),
    RBracket(SourceLocation),
    Comma(SourceLocation),
    Semicolon(SourceLocation),

    Eof(SourceLocation),
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::IntLiteral(_, loc)
            | Token::FloatLiteral(_, loc)
            | Token::CharLiteral(_, loc)
            | Token::StringLiteral(_, loc)
            | Token::Ident(_, loc)
            | Token::Builtin(_, loc)
            | Token::TypeTag(_, loc) => *loc,
            Token::Globals(loc)
            | Token::EndGlobals(loc)
            | Token::Struct(loc)
            | Token::EndStruct(loc)
            | Token::Function(loc)
            | Token::End(loc)
            | Token::If(loc)
            | Token::Elif(loc)
            | Token::Else(loc)
            | Token::EndIf(loc)
            | Token::For(loc)
            | Token::EndFor(loc)
            | Token::While(loc)
            | Token::EndWhile(loc)
            | Token::Return(loc)
            | Token::Continue(loc)
            | Token::Break(loc)
            | Token::Not(loc)
            | Token::And(loc)
            | Token::Or(loc)
            | Token::True(loc)
            | Token::False(loc)
            | Token::Null(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::Slash(loc)
            | Token::Percent(loc)
            | Token::FPlus(loc)
            | Token::FMinus(loc)
            | Token::FStar(loc)
            | Token::FSlash(loc)
            | Token::Lt(loc)
            | Token::Le(loc)
            | Token::Gt(loc)
            | Token::Ge(loc)
            | Token::FLt(loc)
            | Token::FLe(loc)
            | Token::FGt(loc)
            | Token::FGe(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::Dollar(loc)
            | Token::Amp(loc)
            | Token::Arrow(loc)
            | Token::Eq(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBracket(loc)
            | Token::RBracket(loc)
            | Token::Comma(loc)
            | Token::Semicolon(loc)
            | Token::Eof(loc) => *loc,
        }
    }

    /// Tokens after which a `-` is the subtraction operator
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::IntLiteral(..)
                | Token::FloatLiteral(..)
                | Token::CharLiteral(..)
                | Token::StringLiteral(..)
                | Token::Ident(..)
                | Token::True(_)
                | Token::False(_)
                | Token::Null(_)
                | Token::RParen(_)
                | Token::RBracket(_)
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "{}", n),
            Token::FloatLiteral(x, _) => write!(f, "{}", x),
            Token::CharLiteral(c, _) => write!(f, "'{}'", c),
            Token::StringLiteral(s, _) => write!(f, "\"{}\"", s),
            Token::Ident(name, _) => write!(f, "{}", name),
            Token::Builtin(builtin, _) => write!(f, "{}", builtin.name()),
            Token::TypeTag(tag, _) => write!(f, "{}", tag.name()),
            Token::Globals(_) => write!(f, "GLOBALS"),
            Token::EndGlobals(_) => write!(f, "ENDGLOBALS"),
            Token::Struct(_) => write!(f, "STRUCT"),
            Token::EndStruct(_) => write!(f, "ENDSTRUCT"),
            Token::Function(_) => write!(f, "FUNCTION"),
            Token::End(_) => write!(f, "END"),
            Token::If(_) => write!(f, "IF"),
            Token::Elif(_) => write!(f, "ELIF"),
            Token::Else(_) => write!(f, "ELSE"),
            Token::EndIf(_) => write!(f, "ENDIF"),
            Token::For(_) => write!(f, "FOR"),
            Token::EndFor(_) => write!(f, "ENDFOR"),
            Token::While(_) => write!(f, "WHILE"),
            Token::EndWhile(_) => write!(f, "ENDWHILE"),
            Token::Return(_) => write!(f, "RETURN"),
            Token::Continue(_) => write!(f, "CONTINUE"),
            Token::Break(_) => write!(f, "BREAK"),
            Token::Not(_) => write!(f, "NOT"),
            Token::And(_) => write!(f, "AND"),
            Token::Or(_) => write!(f, "OR"),
            Token::True(_) => write!(f, "TRUE"),
            Token::False(_) => write!(f, "FALSE"),
            Token::Null(_) => write!(f, "NULL"),
            Token::Plus(_) => write!(f, "+"),
            Token::Minus(_) => write!(f, "-"),
            Token::Star(_) => write!(f, "*"),
            Token::Slash(_) => write!(f, "/"),
            Token::Percent(_) => write!(f, "%"),
            Token::FPlus(_) => write!(f, "+."),
            Token::FMinus(_) => write!(f, "-."),
            Token::FStar(_) => write!(f, "*."),
            Token::FSlash(_) => write!(f, "/."),
            Token::Lt(_) => write!(f, "<"),
            Token::Le(_) => write!(f, "<="),
            Token::Gt(_) => write!(f, ">"),
            Token::Ge(_) => write!(f, ">="),
            Token::FLt(_) => write!(f, "<."),
            Token::FLe(_) => write!(f, "<=."),
            Token::FGt(_) => write!(f, ">."),
            Token::FGe(_) => write!(f, ">=."),
            Token::EqEq(_) => write!(f, "=="),
            Token::NotEq(_) => write!(f, "!="),
            Token::Dollar(_) => write!(f, "$"),
            Token::Amp(_) => write!(f, "&"),
            Token::Arrow(_) => write!(f, "->"),
            Token::Eq(_) => write!(f, "="),
            Token::LParen(_) => write!(f, "("),
            Token::RParen(_) => write!(f, ")"),
            Token::LBracket(_) => write!(f, "["),
            Token::RBracket(_) => write!(f, "]"),
            Token::Comma(_) => write!(f, ","),
            Token::Semicolon(_) => write!(f, ";"),
            Token::Eof(_) => write!(f, "end of file"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{location} : {message}")]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Character-level scanner producing [`Token`]s
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    previous_ends_operand: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            previous_ends_operand: false,
        }
    }

    /// Tokenize the entire input; the stream always ends with [`Token::Eof`]
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }
            let token = self.next_token()?;
            self.previous_ends_operand = token.ends_operand();
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(Token::Eof(loc)),
        };

        let token = match c {
            '"' => return self.string_literal(loc),
            '\'' => return self.char_literal(loc),
            '0'..='9' => return self.number_literal(c, loc),
            'a'..='z' => return Ok(self.identifier(c, loc)),
            'A'..='Z' => return self.keyword(c, loc),

            '-' if !self.previous_ends_operand
                && self.peek().is_some_and(|d| d.is_ascii_digit()) =>
            {
                return self.number_literal(c, loc);
            }

            '+' => self.float_variant(Token::FPlus(loc), Token::Plus(loc)),
            '*' => self.float_variant(Token::FStar(loc), Token::Star(loc)),
            '/' => self.float_variant(Token::FSlash(loc), Token::Slash(loc)),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Token::Arrow(loc)
                } else {
                    self.float_variant(Token::FMinus(loc), Token::Minus(loc))
                }
            }
            '%' => Token::Percent(loc),
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.float_variant(Token::FLe(loc), Token::Le(loc))
                } else {
                    self.float_variant(Token::FLt(loc), Token::Lt(loc))
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.float_variant(Token::FGe(loc), Token::Ge(loc))
                } else {
                    self.float_variant(Token::FGt(loc), Token::Gt(loc))
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::EqEq(loc)
                } else {
                    Token::Eq(loc)
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::NotEq(loc)
                } else {
                    return Err(LexError {
                        message: "Unexpected character '!' (use NOT or !=)".to_string(),
                        location: loc,
                    });
                }
            }
            '$' => Token::Dollar(loc),
            '&' => Token::Amp(loc),
            '(' => Token::LParen(loc),
            ')' => Token::RParen(loc),
            '[' => Token::LBracket(loc),
            ']' => Token::RBracket(loc),
            ',' => Token::Comma(loc),
            ';' => Token::Semicolon(loc),
            other => {
                return Err(LexError {
                    message: format!("Unexpected character '{}'", other),
                    location: loc,
                });
            }
        };

        Ok(token)
    }

    /// Pick the float form of an operator when it is followed by `.`
    fn float_variant(&mut self, float: Token, int: Token) -> Token {
        if self.peek() == Some('.') {
            self.advance();
            float
        } else {
            int
        }
    }

    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some('"') => return Ok(Token::StringLiteral(value, loc)),
                Some(c) => value.push(c),
                None => {
                    return Err(LexError {
                        message: "Unterminated string literal".to_string(),
                        location: loc,
                    })
                }
            }
        }
    }

    /// `'c'` or `'\c'` where `c` is printable ASCII; escape validity is
    /// checked when the program is loaded
    fn char_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        let mut raw = String::new();

        if self.peek() == Some('\\') {
            self.advance();
            raw.push('\\');
        }

        match self.advance() {
            Some(c) if (' '..='~').contains(&c) => raw.push(c),
            _ => {
                return Err(LexError {
                    message: "Invalid character literal".to_string(),
                    location: loc,
                })
            }
        }

        if self.advance() != Some('\'') {
            return Err(LexError {
                message: "Unterminated character literal".to_string(),
                location: loc,
            });
        }

        Ok(Token::CharLiteral(raw, loc))
    }

    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first);
        self.take_digits(&mut text);

        let has_fraction = self.peek() == Some('.')
            && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit());
        if !has_fraction {
            return Ok(Token::IntLiteral(text, loc));
        }

        self.advance();
        text.push('.');
        self.take_digits(&mut text);

        let exponent_follows = match (self.peek(), self.peek_ahead(1), self.peek_ahead(2)) {
            (Some('e'), Some(d), _) if d.is_ascii_digit() => true,
            (Some('e'), Some('-'), Some(d)) if d.is_ascii_digit() => true,
            _ => false,
        };
        if exponent_follows {
            self.advance();
            text.push('e');
            if self.peek() == Some('-') {
                self.advance();
                text.push('-');
            }
            self.take_digits(&mut text);
        }

        text.parse::<f64>()
            .map(|value| Token::FloatLiteral(value, loc))
            .map_err(|_| LexError {
                message: format!("Invalid float literal {}", text),
                location: loc,
            })
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.advance();
        }
    }

    fn take_word(&mut self, first: char) -> String {
        let mut word = String::new();
        word.push(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    fn identifier(&mut self, first: char, loc: SourceLocation) -> Token {
        Token::Ident(self.take_word(first), loc)
    }

    fn keyword(&mut self, first: char, loc: SourceLocation) -> Result<Token, LexError> {
        let word = self.take_word(first);

        let token = match word.as_str() {
            "GLOBALS" => Token::Globals(loc),
            "ENDGLOBALS" => Token::EndGlobals(loc),
            "STRUCT" => Token::Struct(loc),
            "ENDSTRUCT" => Token::EndStruct(loc),
            "FUNCTION" => Token::Function(loc),
            "END" => Token::End(loc),
            "IF" => Token::If(loc),
            "ELIF" => Token::Elif(loc),
            "ELSE" => Token::Else(loc),
            "ENDIF" => Token::EndIf(loc),
            "FOR" => Token::For(loc),
            "ENDFOR" => Token::EndFor(loc),
            "WHILE" => Token::While(loc),
            "ENDWHILE" => Token::EndWhile(loc),
            "RETURN" => Token::Return(loc),
            "CONTINUE" => Token::Continue(loc),
            "BREAK" => Token::Break(loc),
            "NOT" => Token::Not(loc),
            "AND" => Token::And(loc),
            "OR" => Token::Or(loc),
            "TRUE" => Token::True(loc),
            "FALSE" => Token::False(loc),
            "NULL" => Token::Null(loc),
            "INT" => Token::TypeTag(TypeTag::Int, loc),
            "FLOAT" => Token::TypeTag(TypeTag::Float, loc),
            "BOOL" => Token::TypeTag(TypeTag::Bool, loc),
            "CHAR" => Token::TypeTag(TypeTag::Char, loc),
            "STRING" => Token::TypeTag(TypeTag::String, loc),
            "POINTER" => Token::TypeTag(TypeTag::Pointer, loc),
            other => match Builtin::from_keyword(other) {
                Some(builtin) => Token::Builtin(builtin, loc),
                None => {
                    return Err(LexError {
                        message: format!("Unknown keyword {}", other),
                        location: loc,
                    })
                }
            },
        };

        Ok(token)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match (self.peek(), self.peek_ahead(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => self.skip_line_comment(),
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let loc = self.current_location();
        self.advance();
        self.advance();

        loop {
            match (self.peek(), self.peek_ahead(1)) {
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                (Some(_), _) => {
                    self.advance();
                }
                (None, _) => {
                    return Err(LexError {
                        message: "Unterminated block comment".to_string(),
                        location: loc,
                    })
                }
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.input.get(self.position).copied()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().expect("lexing failed")
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = lex("FUNCTION main() END");
        assert!(matches!(tokens[0], Token::Function(_)));
        assert!(matches!(&tokens[1], Token::Ident(name, _) if name == "main"));
        assert!(matches!(tokens[2], Token::LParen(_)));
        assert!(matches!(tokens[3], Token::RParen(_)));
        assert!(matches!(tokens[4], Token::End(_)));
        assert!(matches!(tokens[5], Token::Eof(_)));
    }

    #[test]
    fn test_float_operators() {
        let tokens = lex("a +. b <=. c -> d");
        assert!(matches!(tokens[1], Token::FPlus(_)));
        assert!(matches!(tokens[3], Token::FLe(_)));
        assert!(matches!(tokens[5], Token::Arrow(_)));
    }

    #[test]
    fn test_negative_literals_depend_on_context() {
        let tokens = lex("x = -3");
        assert!(matches!(&tokens[2], Token::IntLiteral(n, _) if n == "-3"));

        let tokens = lex("x-1");
        assert!(matches!(tokens[1], Token::Minus(_)));
        assert!(matches!(&tokens[2], Token::IntLiteral(n, _) if n == "1"));
    }

    #[test]
    fn test_float_literal_with_exponent() {
        let tokens = lex("1.5e-3");
        assert!(matches!(tokens[0], Token::FloatLiteral(x, _) if (x - 0.0015).abs() < 1e-12));
    }

    #[test]
    fn test_char_and_string_literals() {
        let tokens = lex(r#"'a' '\n' "hi\n""#);
        assert!(matches!(&tokens[0], Token::CharLiteral(c, _) if c == "a"));
        assert!(matches!(&tokens[1], Token::CharLiteral(c, _) if c == "\\n"));
        assert!(matches!(&tokens[2], Token::StringLiteral(s, _) if s == "hi\\n"));
    }

    #[test]
    fn test_comments() {
        let tokens = lex("// line\nx /* block\n comment */ y");
        assert!(matches!(&tokens[0], Token::Ident(name, loc) if name == "x" && loc.line == 2));
        assert!(matches!(&tokens[1], Token::Ident(name, loc) if name == "y" && loc.line == 3));
    }

    #[test]
    fn test_builtins_and_type_tags() {
        let tokens = lex("PRINT(INT, MALLOC_STRUCT)");
        assert!(matches!(tokens[0], Token::Builtin(Builtin::Print, _)));
        assert!(matches!(tokens[2], Token::TypeTag(TypeTag::Int, _)));
        assert!(matches!(tokens[4], Token::Builtin(Builtin::MallocStruct, _)));
    }

    #[test]
    fn test_unknown_keyword_is_rejected() {
        let err = Lexer::new("FOO").tokenize().unwrap_err();
        assert!(err.message.contains("FOO"));
    }

    #[test]
    fn test_error_message_leads_with_location() {
        let err = Lexer::new("x = 1\n  FOO").tokenize().unwrap_err();
        assert_eq!(err.to_string(), format!("Line 2, Char 3 : {}", err.message));
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.to_string().starts_with("Line 2"));
    }
}
