//! WDL expressions composing literal values, arithmetic, comparison, conditionals,
//! string interpolation, arrays & maps, and function applications.
//!
//! The abstract syntax tree (AST) for any expression is represented by an enum
//! and associated structs. Operators and indexing are represented as [`Expression::Apply`]
//! nodes with underscore-prefixed function names (`_add`, `_at`, `_negate`, ...),
//! so downstream passes only need to understand function application.

use crate::error::SourcePosition;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod escapes;

pub use escapes::decode_escapes;

/// WDL expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Boolean literal (true/false)
    Boolean { pos: SourcePosition, value: bool },

    /// Integer literal
    Int { pos: SourcePosition, value: i64 },

    /// Float literal
    Float { pos: SourcePosition, value: f64 },

    /// Null literal (None in WDL)
    Null { pos: SourcePosition },

    /// Quoted string literal, possibly with placeholders
    String {
        pos: SourcePosition,
        quote: StringQuote,
        parts: Vec<StringPart>,
    },

    /// `<<< ... >>>` multi-line string
    MultiLineString {
        pos: SourcePosition,
        parts: Vec<StringPart>,
    },

    /// Array literal [item1, item2, ...]
    Array {
        pos: SourcePosition,
        items: Vec<Expression>,
    },

    /// Pair literal (left, right)
    Pair {
        pos: SourcePosition,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Map literal {key1: value1, key2: value2, ...}
    Map {
        pos: SourcePosition,
        pairs: Vec<(Expression, Expression)>,
    },

    /// Struct or object literal. `type_name` is absent for `object {...}`
    /// and legacy key-only literals.
    Struct {
        pos: SourcePosition,
        members: Vec<(String, Expression)>,
        type_name: Option<String>,
    },

    /// Conditional expression: if condition then true_expr else false_expr
    IfThenElse {
        pos: SourcePosition,
        condition: Box<Expression>,
        true_expr: Box<Expression>,
        false_expr: Box<Expression>,
    },

    /// Identifier reference, as produced by call input shorthand
    Ident { pos: SourcePosition, name: String },

    /// Unqualified name marker used as the base of a bare-identifier [`Expression::Get`]
    LeftName { pos: SourcePosition, name: String },

    /// Member access `expr.member`; with no member it is a plain lookup of
    /// the base
    Get {
        pos: SourcePosition,
        expr: Box<Expression>,
        member: Option<String>,
    },

    /// Function application: function_name(arg1, arg2, ...)
    Apply {
        pos: SourcePosition,
        function_name: String,
        arguments: Vec<Expression>,
    },
}

/// Delimiter of a quoted string literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringQuote {
    /// `"..."`
    Double,
    /// `'...'`
    Single,
}

impl StringQuote {
    /// The delimiter character.
    pub fn as_char(self) -> char {
        match self {
            StringQuote::Double => '"',
            StringQuote::Single => '\'',
        }
    }
}

/// Parts of a string, multi-line string or command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StringPart {
    /// Literal text, exactly as written (escape sequences not decoded)
    Text(String),
    /// Expression placeholder ~{expr}
    Placeholder(Placeholder),
}

/// Embedded `~{...}`/`${...}` expression with formatting options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub pos: SourcePosition,
    /// Recognized options: `default`, `false`, `true`, `sep`
    pub options: IndexMap<String, String>,
    pub expr: Box<Expression>,
}

impl Placeholder {
    pub fn new(pos: SourcePosition, options: IndexMap<String, String>, expr: Expression) -> Self {
        Self {
            pos,
            options,
            expr: Box::new(expr),
        }
    }
}

/// Task command template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCommand {
    pub pos: SourcePosition,
    pub parts: Vec<StringPart>,
}

impl TaskCommand {
    pub fn new(pos: SourcePosition, parts: Vec<StringPart>) -> Self {
        Self { pos, parts }
    }
}

impl Expression {
    pub fn boolean(pos: SourcePosition, value: bool) -> Self {
        Expression::Boolean { pos, value }
    }

    pub fn int(pos: SourcePosition, value: i64) -> Self {
        Expression::Int { pos, value }
    }

    pub fn float(pos: SourcePosition, value: f64) -> Self {
        Expression::Float { pos, value }
    }

    pub fn null(pos: SourcePosition) -> Self {
        Expression::Null { pos }
    }

    pub fn string(pos: SourcePosition, quote: StringQuote, parts: Vec<StringPart>) -> Self {
        Expression::String { pos, quote, parts }
    }

    pub fn multi_line_string(pos: SourcePosition, parts: Vec<StringPart>) -> Self {
        Expression::MultiLineString { pos, parts }
    }

    pub fn array(pos: SourcePosition, items: Vec<Expression>) -> Self {
        Expression::Array { pos, items }
    }

    pub fn pair(pos: SourcePosition, left: Expression, right: Expression) -> Self {
        Expression::Pair {
            pos,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn map(pos: SourcePosition, pairs: Vec<(Expression, Expression)>) -> Self {
        Expression::Map { pos, pairs }
    }

    pub fn struct_literal(
        pos: SourcePosition,
        members: Vec<(String, Expression)>,
        type_name: Option<String>,
    ) -> Self {
        Expression::Struct {
            pos,
            members,
            type_name,
        }
    }

    pub fn if_then_else(
        pos: SourcePosition,
        condition: Expression,
        true_expr: Expression,
        false_expr: Expression,
    ) -> Self {
        Expression::IfThenElse {
            pos,
            condition: Box::new(condition),
            true_expr: Box::new(true_expr),
            false_expr: Box::new(false_expr),
        }
    }

    pub fn ident(pos: SourcePosition, name: String) -> Self {
        Expression::Ident { pos, name }
    }

    pub fn left_name(pos: SourcePosition, name: String) -> Self {
        Expression::LeftName { pos, name }
    }

    pub fn get(pos: SourcePosition, expr: Expression, member: Option<String>) -> Self {
        Expression::Get {
            pos,
            expr: Box::new(expr),
            member,
        }
    }

    pub fn apply(pos: SourcePosition, function_name: String, arguments: Vec<Expression>) -> Self {
        Expression::Apply {
            pos,
            function_name,
            arguments,
        }
    }

    /// Source position of this expression
    pub fn pos(&self) -> &SourcePosition {
        match self {
            Expression::Boolean { pos, .. }
            | Expression::Int { pos, .. }
            | Expression::Float { pos, .. }
            | Expression::Null { pos }
            | Expression::String { pos, .. }
            | Expression::MultiLineString { pos, .. }
            | Expression::Array { pos, .. }
            | Expression::Pair { pos, .. }
            | Expression::Map { pos, .. }
            | Expression::Struct { pos, .. }
            | Expression::IfThenElse { pos, .. }
            | Expression::Ident { pos, .. }
            | Expression::LeftName { pos, .. }
            | Expression::Get { pos, .. }
            | Expression::Apply { pos, .. } => pos,
        }
    }

    /// Direct child expressions, in source order
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::String { parts, .. } | Expression::MultiLineString { parts, .. } => parts
                .iter()
                .filter_map(|part| match part {
                    StringPart::Placeholder(ph) => Some(ph.expr.as_ref()),
                    StringPart::Text(_) => None,
                })
                .collect(),
            Expression::Array { items, .. } => items.iter().collect(),
            Expression::Pair { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::Map { pairs, .. } => pairs.iter().flat_map(|(k, v)| [k, v]).collect(),
            Expression::Struct { members, .. } => members.iter().map(|(_, v)| v).collect(),
            Expression::IfThenElse {
                condition,
                true_expr,
                false_expr,
                ..
            } => vec![condition.as_ref(), true_expr.as_ref(), false_expr.as_ref()],
            Expression::Get { expr, .. } => vec![expr.as_ref()],
            Expression::Apply { arguments, .. } => arguments.iter().collect(),
            Expression::Boolean { .. }
            | Expression::Int { .. }
            | Expression::Float { .. }
            | Expression::Null { .. }
            | Expression::Ident { .. }
            | Expression::LeftName { .. } => Vec::new(),
        }
    }
}

/// Infix spelling of the synthetic operator functions
fn infix_operator(function_name: &str) -> Option<&'static str> {
    match function_name {
        "_lor" => Some("||"),
        "_land" => Some("&&"),
        "_add" => Some("+"),
        "_sub" => Some("-"),
        "_mul" => Some("*"),
        "_div" => Some("/"),
        "_rem" => Some("%"),
        "_eqeq" => Some("=="),
        "_neq" => Some("!="),
        "_lt" => Some("<"),
        "_lte" => Some("<="),
        "_gt" => Some(">"),
        "_gte" => Some(">="),
        _ => None,
    }
}

fn write_parts(f: &mut fmt::Formatter<'_>, parts: &[StringPart]) -> fmt::Result {
    for part in parts {
        match part {
            StringPart::Text(text) => write!(f, "{}", text)?,
            StringPart::Placeholder(ph) => write!(f, "{}", ph)?,
        }
    }
    Ok(())
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{{")?;
        for (name, value) in &self.options {
            write!(f, "{}={:?} ", name, value)?;
        }
        write!(f, "{}}}", self.expr)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Boolean { value, .. } => write!(f, "{}", value),
            Expression::Int { value, .. } => write!(f, "{}", value),
            Expression::Float { value, .. } => write!(f, "{:?}", value),
            Expression::Null { .. } => write!(f, "None"),
            Expression::String { quote, parts, .. } => {
                write!(f, "{}", quote.as_char())?;
                write_parts(f, parts)?;
                write!(f, "{}", quote.as_char())
            }
            Expression::MultiLineString { parts, .. } => {
                write!(f, "<<<")?;
                write_parts(f, parts)?;
                write!(f, ">>>")
            }
            Expression::Array { items, .. } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expression::Pair { left, right, .. } => write!(f, "({}, {})", left, right),
            Expression::Map { pairs, .. } => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Expression::Struct {
                members,
                type_name,
                ..
            } => {
                write!(f, "{} {{", type_name.as_deref().unwrap_or("object"))?;
                for (i, (name, expr)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, expr)?;
                }
                write!(f, "}}")
            }
            Expression::IfThenElse {
                condition,
                true_expr,
                false_expr,
                ..
            } => write!(f, "if {} then {} else {}", condition, true_expr, false_expr),
            Expression::Ident { name, .. } | Expression::LeftName { name, .. } => {
                write!(f, "{}", name)
            }
            Expression::Get { expr, member, .. } => match member {
                Some(member) => write!(f, "{}.{}", expr, member),
                None => write!(f, "{}", expr),
            },
            Expression::Apply {
                function_name,
                arguments,
                ..
            } => {
                if let (Some(op), [left, right]) =
                    (infix_operator(function_name), arguments.as_slice())
                {
                    return write!(f, "({} {} {})", left, op, right);
                }
                match (function_name.as_str(), arguments.as_slice()) {
                    ("_negate", [operand]) => write!(f, "!{}", operand),
                    ("_at", [base, index]) => write!(f, "{}[{}]", base, index),
                    _ => {
                        write!(f, "{}(", function_name)?;
                        for (i, arg) in arguments.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", arg)?;
                        }
                        write!(f, ")")
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePosition {
        SourcePosition::new("test.wdl".to_string(), "test.wdl".to_string(), 1, 1, 1, 5)
    }

    fn name(n: &str) -> Expression {
        Expression::get(pos(), Expression::left_name(pos(), n.to_string()), None)
    }

    #[test]
    fn test_display_operators() {
        let expr = Expression::apply(
            pos(),
            "_add".to_string(),
            vec![
                Expression::int(pos(), 1),
                Expression::apply(
                    pos(),
                    "_mul".to_string(),
                    vec![Expression::int(pos(), 2), name("x")],
                ),
            ],
        );
        assert_eq!(expr.to_string(), "(1 + (2 * x))");

        let expr = Expression::apply(
            pos(),
            "_negate".to_string(),
            vec![Expression::apply(
                pos(),
                "_at".to_string(),
                vec![name("xs"), Expression::int(pos(), 0)],
            )],
        );
        assert_eq!(expr.to_string(), "!xs[0]");
    }

    #[test]
    fn test_display_strings_keep_raw_text() {
        let expr = Expression::string(
            pos(),
            StringQuote::Single,
            vec![
                StringPart::Text(r"a\tb ".to_string()),
                StringPart::Placeholder(Placeholder::new(pos(), IndexMap::new(), name("who"))),
            ],
        );
        assert_eq!(expr.to_string(), r"'a\tb ~{who}'");
    }

    #[test]
    fn test_children() {
        let expr = Expression::if_then_else(
            pos(),
            Expression::boolean(pos(), true),
            Expression::int(pos(), 1),
            Expression::int(pos(), 2),
        );
        assert_eq!(expr.children().len(), 3);

        let expr = Expression::map(
            pos(),
            vec![(Expression::int(pos(), 1), Expression::null(pos()))],
        );
        assert_eq!(expr.children().len(), 2);
        assert!(Expression::null(pos()).children().is_empty());
    }

    #[test]
    fn test_get_member_display() {
        let expr = Expression::get(pos(), name("p"), Some("left".to_string()));
        assert_eq!(expr.to_string(), "p.left");
        assert_eq!(expr.pos(), &pos());
    }
}
