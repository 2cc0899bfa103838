//! Concrete syntax tree produced by the grammar and consumed by lowering.
//!
//! Nodes are tagged with the grammar rule that produced them. Anonymous
//! punctuation is dropped; the tokens that remain carry their raw source text.

use std::fmt;

/// Grammar rules that produce tree nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    // expressions
    Lor,
    Land,
    Eqeq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Negate,
    At,
    GetName,
    LeftName,
    Apply,
    IfThenElse,
    BooleanTrue,
    BooleanFalse,
    Null,
    Int,
    Float,
    String,
    Placeholder,
    PlaceholderOption,
    StringLiteral,
    Array,
    Pair,
    Map,
    MapKv,
    Obj,
    ObjectKv,

    // types & declarations
    Type,
    UnboundDecl,
    BoundDecl,

    // tasks
    InputDecls,
    NoninputDecl,
    Command,
    OutputDecls,
    RuntimeSection,
    RuntimeKv,
    MetaSection,
    MetaObject,
    MetaKv,
    MetaArray,
    Task,
    Tasks,

    // workflows
    NamespacedIdent,
    Call,
    CallAlias,
    CallAfter,
    CallInputs,
    InputColon,
    CallInput,
    Scatter,
    Conditional,
    WorkflowOutputDecls,
    OutputIdent,
    Workflow,

    // documents
    Struct,
    Import,
    ImportAs,
    ImportAlias,
    Version,
    Document,
}

impl Rule {
    /// Rules lowered by the expression lowerer
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            Rule::Lor
                | Rule::Land
                | Rule::Eqeq
                | Rule::Neq
                | Rule::Lt
                | Rule::Lte
                | Rule::Gt
                | Rule::Gte
                | Rule::Add
                | Rule::Sub
                | Rule::Mul
                | Rule::Div
                | Rule::Rem
                | Rule::Negate
                | Rule::At
                | Rule::GetName
                | Rule::LeftName
                | Rule::Apply
                | Rule::IfThenElse
                | Rule::BooleanTrue
                | Rule::BooleanFalse
                | Rule::Null
                | Rule::Int
                | Rule::Float
                | Rule::String
                | Rule::Placeholder
                | Rule::PlaceholderOption
                | Rule::StringLiteral
                | Rule::Array
                | Rule::Pair
                | Rule::Map
                | Rule::MapKv
                | Rule::Obj
                | Rule::ObjectKv
        )
    }
}

/// Line/column span of a node or token. Columns are one-based; the end
/// column points just past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Meta {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Meta {
    pub fn new(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// Span from the start of `self` to the end of `other`
    pub fn to(self, other: Meta) -> Meta {
        Meta::new(self.line, self.column, other.end_line, other.end_column)
    }
}

/// Kind of a kept token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier or keyword
    Word,
    Int,
    Float,
    /// String/command delimiter: `"`, `'`, `<<<`, `>>>`
    Delimiter,
    /// Literal text inside a string or command
    Text,
    /// Type quantifier or wildcard: `?`, `+`, `+?`, `?+`, `*`
    Symbol,
}

/// A token kept in the concrete tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteToken {
    pub kind: TokenKind,
    pub text: String,
    pub meta: Meta,
}

impl ConcreteToken {
    pub fn new(kind: TokenKind, text: impl Into<String>, meta: Meta) -> Self {
        Self {
            kind,
            text: text.into(),
            meta,
        }
    }
}

/// Child of a concrete node
#[derive(Debug, Clone, PartialEq)]
pub enum ConcreteChild {
    Node(ConcreteNode),
    Token(ConcreteToken),
}

impl ConcreteChild {
    pub fn meta(&self) -> Meta {
        match self {
            ConcreteChild::Node(node) => node.meta,
            ConcreteChild::Token(token) => token.meta,
        }
    }
}

/// Interior node of the concrete tree
#[derive(Debug, Clone, PartialEq)]
pub struct ConcreteNode {
    pub rule: Rule,
    pub meta: Meta,
    pub children: Vec<ConcreteChild>,
}

impl ConcreteNode {
    pub fn new(rule: Rule, meta: Meta, children: Vec<ConcreteChild>) -> Self {
        Self {
            rule,
            meta,
            children,
        }
    }
}

impl From<ConcreteNode> for ConcreteChild {
    fn from(node: ConcreteNode) -> Self {
        ConcreteChild::Node(node)
    }
}

impl From<ConcreteToken> for ConcreteChild {
    fn from(token: ConcreteToken) -> Self {
        ConcreteChild::Token(token)
    }
}

/// A `#` comment seen by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentToken {
    /// Comment text including the leading `#`
    pub text: String,
    /// Byte offset in the source
    pub offset: usize,
    pub line: u32,
    pub column: u32,
    pub end_line: Option<u32>,
    pub end_column: Option<u32>,
}

/// Failure of the concrete parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteSyntaxError {
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
}

impl ConcreteSyntaxError {
    pub fn at(meta: Meta, message: impl Into<String>) -> Self {
        Self {
            line: Some(meta.line),
            column: Some(meta.column),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConcreteSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} at line {}, column {}", self.message, line, column)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ConcreteSyntaxError {}

/// Result of a concrete parsing step
pub type ConcreteResult<T> = Result<T, ConcreteSyntaxError>;
