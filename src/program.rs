//! Program model: load-time validation and static memory layout
//!
//! [`Program::load`] turns source text into an immutable, validated program.
//! The checks run in a fixed order and the first failure aborts loading:
//!
//! 1. structures and functions: unique names, unique fields and parameters,
//!    no field shared between two structures
//! 2. literals: integers fit in 32 bits, characters and strings are printable
//!    ASCII or one of the escapes `\0 \t \v \r \n \f \\ \'`; each distinct
//!    string is placed once in the read-only segment
//! 3. a parameterless `main` exists
//! 4. globals: unique, not shadowing any function parameter, initialised
//!    from literals into the global segment

use crate::interpreter::constants::{MEMORY_SIZE, STATIC_SEGMENT_START};
use crate::memory::value::{
    bool_to_word, char_to_word, float_to_word, int_to_word, pointer_to_word, Address, Word,
    FALSE_WORD,
};
use crate::parser::ast::*;
use crate::parser::{parse_source, ParseError};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::debug;

/// Structural errors; any of them rejects the program before it runs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("{0}")]
    Syntax(#[from] ParseError),

    #[error("{location} : Structure {name} is declared twice.")]
    DuplicateStructure {
        name: String,
        location: SourceLocation,
    },

    #[error("{location} : Structure {structure} has twice the field {field}.")]
    DuplicateField {
        structure: String,
        field: String,
        location: SourceLocation,
    },

    #[error("{location} : Structures {first} and {second} have the same field {field}.")]
    SharedField {
        first: String,
        second: String,
        field: String,
        location: SourceLocation,
    },

    #[error("{location} : Function {name} is declared twice.")]
    DuplicateFunction {
        name: String,
        location: SourceLocation,
    },

    #[error("{location} : Function {function} has twice the parameter {parameter}.")]
    DuplicateParameter {
        function: String,
        parameter: String,
        location: SourceLocation,
    },

    #[error("{location} : Global variable {name} is declared twice.")]
    DuplicateGlobal {
        name: String,
        location: SourceLocation,
    },

    #[error(
        "{location} : Global variable {global} has the same name as a parameter of function {function}."
    )]
    GlobalShadowsParameter {
        global: String,
        function: String,
        location: SourceLocation,
    },

    #[error("There is no main function in the program.")]
    NoMainFunction,

    #[error("{location} : main function should not contain any input parameter.")]
    MainWithParameters { location: SourceLocation },

    #[error("{location} : Program contains non valid character : '{character}'.")]
    InvalidCharacter {
        character: String,
        location: SourceLocation,
    },

    #[error("{location} : Program contains non valid integer : {literal}.")]
    InvalidInteger {
        literal: String,
        location: SourceLocation,
    },

    #[error("{location} : Static strings do not fit in memory.")]
    StaticMemoryExhausted { location: SourceLocation },
}

/// A validated program with its static memory image
#[derive(Debug, Clone)]
pub struct Program {
    source: SourceFile,
    functions: FxHashMap<String, usize>,
    structs: FxHashMap<String, usize>,
    field_index: FxHashMap<String, usize>,
    globals: Vec<String>,
    strings: FxHashMap<String, Address>,
    image: Vec<Word>,
    stack_limit: Address,
}

impl Program {
    /// Parse and validate source text
    pub fn load(source: &str) -> Result<Self, LoadError> {
        let file = parse_source(source)?;
        Self::from_source_file(file)
    }

    /// Validate an already parsed file
    pub fn from_source_file(source: SourceFile) -> Result<Self, LoadError> {
        let mut program = Program {
            source: SourceFile::new(),
            functions: FxHashMap::default(),
            structs: FxHashMap::default(),
            field_index: FxHashMap::default(),
            globals: Vec::new(),
            strings: FxHashMap::default(),
            image: Vec::new(),
            stack_limit: STATIC_SEGMENT_START,
        };

        program.index_declarations(&source)?;
        program.place_literals(&source)?;
        check_main(&source)?;
        program.place_globals(&source)?;
        program.source = source;

        debug!(
            functions = program.functions.len(),
            structs = program.structs.len(),
            globals = program.globals.len(),
            strings = program.strings.len(),
            stack_limit = program.stack_limit,
            "program loaded"
        );

        Ok(program)
    }

    fn index_declarations(&mut self, source: &SourceFile) -> Result<(), LoadError> {
        let mut field_owner: FxHashMap<&str, &str> = FxHashMap::default();

        for (slot, decl) in source.structs.iter().enumerate() {
            if self.structs.insert(decl.name.clone(), slot).is_some() {
                return Err(LoadError::DuplicateStructure {
                    name: decl.name.clone(),
                    location: decl.location,
                });
            }

            let mut seen = FxHashSet::default();
            for (index, field) in decl.fields.iter().enumerate() {
                if !seen.insert(field.as_str()) {
                    return Err(LoadError::DuplicateField {
                        structure: decl.name.clone(),
                        field: field.clone(),
                        location: decl.location,
                    });
                }
                if let Some(owner) = field_owner.insert(field.as_str(), decl.name.as_str()) {
                    return Err(LoadError::SharedField {
                        first: owner.to_string(),
                        second: decl.name.clone(),
                        field: field.clone(),
                        location: decl.location,
                    });
                }
                self.field_index.insert(field.clone(), index);
            }
        }

        for (slot, decl) in source.functions.iter().enumerate() {
            if self.functions.insert(decl.name.clone(), slot).is_some() {
                return Err(LoadError::DuplicateFunction {
                    name: decl.name.clone(),
                    location: decl.location,
                });
            }

            let mut seen = FxHashSet::default();
            for param in &decl.params {
                if !seen.insert(param.as_str()) {
                    return Err(LoadError::DuplicateParameter {
                        function: decl.name.clone(),
                        parameter: param.clone(),
                        location: decl.location,
                    });
                }
            }
        }

        Ok(())
    }

    fn place_literals(&mut self, source: &SourceFile) -> Result<(), LoadError> {
        for global in &source.globals {
            self.place_literal(&global.value, global.location)?;
        }
        for function in &source.functions {
            for stmt in &function.body {
                visit_stmt(stmt, &mut |literal, location| {
                    self.place_literal(literal, location)
                })?;
            }
        }
        Ok(())
    }

    fn place_literal(&mut self, literal: &Literal, location: SourceLocation) -> Result<(), LoadError> {
        match literal {
            Literal::Int(text) => {
                parse_int_literal(text, location)?;
            }
            Literal::Char(raw) => {
                decode_escapes(raw, location)?;
            }
            Literal::Str(raw) => {
                if self.strings.contains_key(raw) {
                    return Ok(());
                }
                let text = decode_escapes(raw, location)?;
                let address = self.stack_limit;
                let end = u64::from(address) + text.len() as u64 + 1;
                if end >= u64::from(MEMORY_SIZE) {
                    return Err(LoadError::StaticMemoryExhausted { location });
                }
                self.image.extend(text.bytes().map(char_to_word));
                self.image.push(FALSE_WORD);
                self.stack_limit = end as Address;
                self.strings.insert(raw.clone(), address);
            }
            Literal::Float(_) | Literal::Null | Literal::True | Literal::False => {}
        }
        Ok(())
    }

    fn place_globals(&mut self, source: &SourceFile) -> Result<(), LoadError> {
        let mut seen = FxHashSet::default();

        for global in &source.globals {
            if !seen.insert(global.name.as_str()) {
                return Err(LoadError::DuplicateGlobal {
                    name: global.name.clone(),
                    location: global.location,
                });
            }
            if let Some(function) = source
                .functions
                .iter()
                .find(|function| function.params.contains(&global.name))
            {
                return Err(LoadError::GlobalShadowsParameter {
                    global: global.name.clone(),
                    function: function.name.clone(),
                    location: global.location,
                });
            }

            let word = self.literal_word(&global.value);
            self.image.push(word);
            self.globals.push(global.name.clone());
        }

        if u64::from(self.stack_limit) + self.globals.len() as u64 >= u64::from(MEMORY_SIZE) {
            let location = source
                .globals
                .last()
                .map(|global| global.location)
                .unwrap_or_default();
            return Err(LoadError::StaticMemoryExhausted { location });
        }

        Ok(())
    }

    /// The word a literal evaluates to; strings evaluate to their address.
    /// Literals are validated at load time, so this cannot fail.
    pub fn literal_word(&self, literal: &Literal) -> Word {
        match literal {
            Literal::Int(text) => text.parse::<i32>().map(int_to_word).unwrap_or(0),
            Literal::Float(value) => float_to_word(*value),
            Literal::Char(raw) => decode_escapes(raw, SourceLocation::default())
                .ok()
                .and_then(|text| text.bytes().next())
                .map(char_to_word)
                .unwrap_or(0),
            Literal::Str(raw) => pointer_to_word(self.strings.get(raw).copied().unwrap_or(0)),
            Literal::Null | Literal::False => bool_to_word(false),
            Literal::True => bool_to_word(true),
        }
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions
            .get(name)
            .map(|&slot| &self.source.functions[slot])
    }

    /// The entry point; present in every loaded program
    pub fn main(&self) -> Option<&FunctionDecl> {
        self.function("main")
    }

    pub fn structure(&self, name: &str) -> Option<&StructDecl> {
        self.structs.get(name).map(|&slot| &self.source.structs[slot])
    }

    /// Offset of a field inside whichever structure declares it
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.field_index.get(field).copied()
    }

    /// Address of a string literal in the read-only segment, keyed by its
    /// text as written in the source
    pub fn string_address(&self, raw: &str) -> Option<Address> {
        self.strings.get(raw).copied()
    }

    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    /// First address past the read-only segment
    pub fn stack_limit(&self) -> Address {
        self.stack_limit
    }

    /// Initial words of the read-only and global segments, from address 1
    pub fn image(&self) -> &[Word] {
        &self.image
    }
}

fn check_main(source: &SourceFile) -> Result<(), LoadError> {
    let main = source
        .functions
        .iter()
        .find(|function| function.name == "main")
        .ok_or(LoadError::NoMainFunction)?;
    if !main.params.is_empty() {
        return Err(LoadError::MainWithParameters {
            location: main.location,
        });
    }
    Ok(())
}

fn parse_int_literal(text: &str, location: SourceLocation) -> Result<i32, LoadError> {
    text.parse::<i32>().map_err(|_| LoadError::InvalidInteger {
        literal: text.to_string(),
        location,
    })
}

/// Validate a char or string literal and decode its escapes
pub fn decode_escapes(raw: &str, location: SourceLocation) -> Result<String, LoadError> {
    let invalid = |character: String| LoadError::InvalidCharacter {
        character,
        location,
    };

    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let escaped = match chars.next() {
                Some('0') => '\0',
                Some('t') => '\t',
                Some('v') => '\u{0b}',
                Some('r') => '\r',
                Some('n') => '\n',
                Some('f') => '\u{0c}',
                Some('\\') => '\\',
                Some('\'') => '\'',
                Some(other) => return Err(invalid(format!("\\{}", other))),
                None => return Err(invalid("\\".to_string())),
            };
            decoded.push(escaped);
        } else if (' '..='~').contains(&c) {
            decoded.push(c);
        } else {
            return Err(invalid(c.to_string()));
        }
    }
    Ok(decoded)
}

fn visit_stmt(
    stmt: &Stmt,
    f: &mut impl FnMut(&Literal, SourceLocation) -> Result<(), LoadError>,
) -> Result<(), LoadError> {
    match stmt {
        Stmt::Assign { value, .. } | Stmt::Return { value, .. } => visit_expr(value, f),
        Stmt::IndexAssign {
            array,
            index,
            value,
            ..
        } => {
            visit_expr(array, f)?;
            visit_expr(index, f)?;
            visit_expr(value, f)
        }
        Stmt::FieldAssign { object, value, .. } => {
            visit_expr(object, f)?;
            visit_expr(value, f)
        }
        Stmt::DerefAssign { pointer, value, .. } => {
            visit_expr(pointer, f)?;
            visit_expr(value, f)
        }
        Stmt::If {
            branches,
            else_body,
            ..
        } => {
            for branch in branches {
                visit_expr(&branch.condition, f)?;
                for inner in &branch.body {
                    visit_stmt(inner, f)?;
                }
            }
            for inner in else_body.iter().flatten() {
                visit_stmt(inner, f)?;
            }
            Ok(())
        }
        Stmt::For {
            start, end, body, ..
        } => {
            visit_expr(start, f)?;
            visit_expr(end, f)?;
            body.iter().try_for_each(|inner| visit_stmt(inner, f))
        }
        Stmt::While {
            condition, body, ..
        } => {
            visit_expr(condition, f)?;
            body.iter().try_for_each(|inner| visit_stmt(inner, f))
        }
        Stmt::Call { call, .. } => visit_expr(call, f),
        Stmt::Continue { .. } | Stmt::Break { .. } => Ok(()),
    }
}

fn visit_expr(
    expr: &Expr,
    f: &mut impl FnMut(&Literal, SourceLocation) -> Result<(), LoadError>,
) -> Result<(), LoadError> {
    match expr {
        Expr::Literal { value, location } => f(value, *location),
        Expr::Variable { .. } | Expr::AddressOf { .. } => Ok(()),
        Expr::Call { args, .. } => args.iter().try_for_each(|arg| match arg {
            Argument::Value(value) => visit_expr(value, f),
            Argument::Tag(_) | Argument::StructName(_) => Ok(()),
        }),
        Expr::Index { array, index, .. } => {
            visit_expr(array, f)?;
            visit_expr(index, f)
        }
        Expr::Field { object, .. } => visit_expr(object, f),
        Expr::Unary { operand, .. } => visit_expr(operand, f),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            visit_expr(left, f)?;
            visit_expr(right, f)
        }
    }
}
