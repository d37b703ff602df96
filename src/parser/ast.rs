//! AST (Abstract Syntax Tree) definitions for SYN-C
//!
//! The tree is built once by the parser and never mutated afterwards. The
//! execution engine walks it through shared references, so the same function
//! body can be entered by many nested calls at once.
//!
//! Every node carries a [`SourceLocation`] pointing at the token that
//! introduced it: the keyword for statements, the operator for operators,
//! `=` for assignments and `(` for calls.

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}, Char {}", self.line, self.column)
    }
}

/// Literal tokens, kept as written so the program model can validate them
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Decimal text, range-checked at load time
    Int(String),
    Float(f64),
    /// Raw text between the quotes, e.g. `a` or `\n`
    Char(String),
    /// Raw text between the quotes, escapes not yet decoded
    Str(String),
    Null,
    True,
    False,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /
    Mod,      // %
    FAdd,     // +.
    FSub,     // -.
    FMul,     // *.
    FDiv,     // /.
    Lt,       // <
    Le,       // <=
    Gt,       // >
    Ge,       // >=
    FLt,      // <.
    FLe,      // <=.
    FGt,      // >.
    FGe,      // >=.
    Eq,       // ==
    Ne,       // !=
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::FAdd => "+.",
            BinOp::FSub => "-.",
            BinOp::FMul => "*.",
            BinOp::FDiv => "/.",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::FLt => "<.",
            BinOp::FLe => "<=.",
            BinOp::FGt => ">.",
            BinOp::FGe => ">=.",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
        }
    }
}

/// Short-circuiting boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Prefix operators that take an arbitrary operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,   // NOT
    Deref, // $
}

/// Type tags accepted by `PRINT`, `PRINTERR` and `ELEMENTARY_OPERATIONS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    Char,
    String,
    Pointer,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Int => "INT",
            TypeTag::Float => "FLOAT",
            TypeTag::Bool => "BOOL",
            TypeTag::Char => "CHAR",
            TypeTag::String => "STRING",
            TypeTag::Pointer => "POINTER",
        }
    }
}

/// The closed library of built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Iabs,
    Fabs,
    Cos,
    Sin,
    Tan,
    Sqrt,
    Exp,
    Ln,
    Pow,
    Sh,
    Ch,
    Th,
    Ceil,
    Floor,
    Round,
    Malloc,
    MallocStruct,
    Free,
    Read,
    Rand,
    Srand,
    I2f,
    I2s,
    F2i,
    F2s,
    S2i,
    S2f,
    V2b,
    Flush,
    FlushErr,
    Print,
    PrintErr,
    ElementaryOperations,
}

/// How many arguments a built-in accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        }
    }
}

impl Builtin {
    /// Look up a library function by its upper-case keyword
    pub fn from_keyword(word: &str) -> Option<Self> {
        let builtin = match word {
            "IABS" => Builtin::Iabs,
            "FABS" => Builtin::Fabs,
            "COS" => Builtin::Cos,
            "SIN" => Builtin::Sin,
            "TAN" => Builtin::Tan,
            "SQRT" => Builtin::Sqrt,
            "EXP" => Builtin::Exp,
            "LN" => Builtin::Ln,
            "POW" => Builtin::Pow,
            "SH" => Builtin::Sh,
            "CH" => Builtin::Ch,
            "TH" => Builtin::Th,
            "CEIL" => Builtin::Ceil,
            "FLOOR" => Builtin::Floor,
            "ROUND" => Builtin::Round,
            "MALLOC" => Builtin::Malloc,
            "MALLOC_STRUCT" => Builtin::MallocStruct,
            "FREE" => Builtin::Free,
            "READ" => Builtin::Read,
            "RAND" => Builtin::Rand,
            "SRAND" => Builtin::Srand,
            "I2F" => Builtin::I2f,
            "I2S" => Builtin::I2s,
            "F2I" => Builtin::F2i,
            "F2S" => Builtin::F2s,
            "S2I" => Builtin::S2i,
            "S2F" => Builtin::S2f,
            "V2B" => Builtin::V2b,
            "FLUSH" => Builtin::Flush,
            "FLUSHERR" => Builtin::FlushErr,
            "PRINT" => Builtin::Print,
            "PRINTERR" => Builtin::PrintErr,
            "ELEMENTARY_OPERATIONS" => Builtin::ElementaryOperations,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Iabs => "IABS",
            Builtin::Fabs => "FABS",
            Builtin::Cos => "COS",
            Builtin::Sin => "SIN",
            Builtin::Tan => "TAN",
            Builtin::Sqrt => "SQRT",
            Builtin::Exp => "EXP",
            Builtin::Ln => "LN",
            Builtin::Pow => "POW",
            Builtin::Sh => "SH",
            Builtin::Ch => "CH",
            Builtin::Th => "TH",
            Builtin::Ceil => "CEIL",
            Builtin::Floor => "FLOOR",
            Builtin::Round => "ROUND",
            Builtin::Malloc => "MALLOC",
            Builtin::MallocStruct => "MALLOC_STRUCT",
            Builtin::Free => "FREE",
            Builtin::Read => "READ",
            Builtin::Rand => "RAND",
            Builtin::Srand => "SRAND",
            Builtin::I2f => "I2F",
            Builtin::I2s => "I2S",
            Builtin::F2i => "F2I",
            Builtin::F2s => "F2S",
            Builtin::S2i => "S2I",
            Builtin::S2f => "S2F",
            Builtin::V2b => "V2B",
            Builtin::Flush => "FLUSH",
            Builtin::FlushErr => "FLUSHERR",
            Builtin::Print => "PRINT",
            Builtin::PrintErr => "PRINTERR",
            Builtin::ElementaryOperations => "ELEMENTARY_OPERATIONS",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Builtin::Read | Builtin::Rand | Builtin::Flush | Builtin::FlushErr => {
                Arity::Exactly(0)
            }
            Builtin::Pow => Arity::Exactly(2),
            Builtin::I2s | Builtin::F2s => Arity::Exactly(3),
            Builtin::Malloc => Arity::AtLeast(1),
            Builtin::Print | Builtin::PrintErr => Arity::Any,
            _ => Arity::Exactly(1),
        }
    }

    /// Whether the argument list may contain type tags
    pub fn takes_type_tags(self) -> bool {
        matches!(
            self,
            Builtin::Print | Builtin::PrintErr | Builtin::ElementaryOperations
        )
    }
}

/// Who a call expression invokes
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    Function(String),
    Builtin(Builtin),
}

impl CallTarget {
    pub fn name(&self) -> &str {
        match self {
            CallTarget::Function(name) => name,
            CallTarget::Builtin(builtin) => builtin.name(),
        }
    }
}

/// One entry of a call's argument list
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Value(Expr),
    Tag(TypeTag),
    /// Bare structure name given to `MALLOC_STRUCT`
    StructName(String),
}

/// Expressions: every evaluation produces exactly one word
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        location: SourceLocation,
    },
    Variable {
        name: String,
        location: SourceLocation,
    },
    Call {
        target: CallTarget,
        args: Vec<Argument>,
        location: SourceLocation,
    },
    /// `array[index]`
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
        location: SourceLocation,
    },
    /// `object->field`
    Field {
        object: Box<Expr>,
        field: String,
        location: SourceLocation,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    /// `&name`
    AddressOf {
        name: String,
        location: SourceLocation,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Logical {
        op: LogicOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Literal { location, .. }
            | Expr::Variable { location, .. }
            | Expr::Call { location, .. }
            | Expr::Index { location, .. }
            | Expr::Field { location, .. }
            | Expr::Unary { location, .. }
            | Expr::AddressOf { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Logical { location, .. } => *location,
        }
    }
}

/// One `IF`/`ELIF` arm
#[derive(Debug, Clone, PartialEq)]
pub struct CondBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = value`
    Assign {
        target: String,
        value: Expr,
        location: SourceLocation,
    },
    /// `array[index] = value`
    IndexAssign {
        array: Expr,
        index: Expr,
        value: Expr,
        location: SourceLocation,
    },
    /// `object->field = value`
    FieldAssign {
        object: Expr,
        field: String,
        value: Expr,
        location: SourceLocation,
    },
    /// `$pointer = value`
    DerefAssign {
        pointer: Expr,
        value: Expr,
        location: SourceLocation,
    },
    If {
        branches: Vec<CondBranch>,
        else_body: Option<Vec<Stmt>>,
        location: SourceLocation,
    },
    For {
        variable: String,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    Return {
        value: Expr,
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    /// A call evaluated for its effect; always holds an [`Expr::Call`]
    Call {
        call: Expr,
        location: SourceLocation,
    },
}

impl Stmt {
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::Assign { location, .. }
            | Stmt::IndexAssign { location, .. }
            | Stmt::FieldAssign { location, .. }
            | Stmt::DerefAssign { location, .. }
            | Stmt::If { location, .. }
            | Stmt::For { location, .. }
            | Stmt::While { location, .. }
            | Stmt::Return { location, .. }
            | Stmt::Continue { location }
            | Stmt::Break { location }
            | Stmt::Call { location, .. } => *location,
        }
    }
}

/// `name = literal` inside `GLOBALS ... ENDGLOBALS`
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDecl {
    pub name: String,
    pub value: Literal,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<String>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// A parsed (not yet validated) SYN-C source file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    pub globals: Vec<GlobalDecl>,
    pub structs: Vec<StructDecl>,
    pub functions: Vec<FunctionDecl>,
}

impl SourceFile {
    pub fn new() -> Self {
        Self::default()
    }
}
