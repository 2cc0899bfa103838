//! Token definitions for the WDL lexer

use super::cst::Meta;
use std::fmt;

/// Token produced by the lexer in normal (code) mode.
///
/// Keywords aren't distinguished from identifiers here: the grammar matches
/// reserved words by text where it expects them, and lowering rejects
/// keywords used as names.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or keyword
    Word(String),

    // Numeric literals, kept as source text
    IntLiteral(String),
    FloatLiteral(String),

    // String openers
    DoubleQuote,
    SingleQuote,
    /// `<<<`
    HeredocStart,

    // Operators - Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Operators - Comparison
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Operators - Logical
    And,
    Or,
    Not,

    // Operators - Assignment
    Assign,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    // Punctuation
    Comma,
    Dot,
    Colon,
    Question,

    // End of file
    Eof,
}

impl Token {
    /// Check if this token is the given word
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word(w) if w == word)
    }

    /// Check if this token is any word
    pub fn is_any_word(&self) -> bool {
        matches!(self, Token::Word(_))
    }

    /// Check if this token is a type quantifier
    pub fn is_quantifier(&self) -> bool {
        matches!(self, Token::Question | Token::Plus)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(s) => write!(f, "{}", s),
            Token::IntLiteral(s) | Token::FloatLiteral(s) => write!(f, "{}", s),

            Token::DoubleQuote => write!(f, "\""),
            Token::SingleQuote => write!(f, "'"),
            Token::HeredocStart => write!(f, "<<<"),

            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),

            Token::Equal => write!(f, "=="),
            Token::NotEqual => write!(f, "!="),
            Token::Less => write!(f, "<"),
            Token::LessEqual => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEqual => write!(f, ">="),

            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Not => write!(f, "!"),

            Token::Assign => write!(f, "="),

            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),

            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Colon => write!(f, ":"),
            Token::Question => write!(f, "?"),

            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedToken {
    pub token: Token,
    pub meta: Meta,
}

impl LocatedToken {
    pub fn new(token: Token, meta: Meta) -> Self {
        Self { token, meta }
    }
}
