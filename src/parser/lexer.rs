//! Mode-aware lexer for WDL, built from nom combinators.
//!
//! Normal code is lexed one [`Token`] at a time after skipping whitespace and
//! comments. String literals and command sections have their own scanners
//! ([`body_piece`]) since whitespace and `#` are significant inside them.

use super::cst::Meta;
use super::tokens::Token;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace1, one_of, space0},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::{pair, preceded, tuple},
    IResult, InputTake,
};
use nom_locate::LocatedSpan;

pub type Span<'a> = LocatedSpan<&'a str>;

/// Meta spanning from `start` up to (not including) `end`
pub fn span_meta(start: &Span, end: &Span) -> Meta {
    Meta::new(
        start.location_line(),
        start.get_utf8_column() as u32,
        end.location_line(),
        end.get_utf8_column() as u32,
    )
}

/// Meta covering exactly `span`, which must not contain a newline
pub fn single_line_meta(span: &Span) -> Meta {
    let column = span.get_utf8_column() as u32;
    let width = span.fragment().chars().count() as u32;
    Meta::new(
        span.location_line(),
        column,
        span.location_line(),
        column + width,
    )
}

// Trivia

/// Parse a comment, including its leading `#`
pub fn comment(input: Span) -> IResult<Span, Span> {
    recognize(pair(char('#'), take_while(|c: char| c != '\n' && c != '\r')))(input)
}

/// Skip whitespace and comments, returning the comments seen
pub fn trivia(input: Span) -> IResult<Span, Vec<Span>> {
    let (rest, items) = many0(alt((map(multispace1, |_| None), map(comment, Some))))(input)?;
    Ok((rest, items.into_iter().flatten().collect()))
}

// Normal-mode tokens

fn exponent(input: Span) -> IResult<Span, Span> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

/// Parse a float literal (unsigned; signs are handled by the grammar)
pub fn float_literal(input: Span) -> IResult<Span, Token> {
    map(
        alt((
            recognize(tuple((digit1, char('.'), digit0, opt(exponent)))),
            recognize(tuple((char('.'), digit1, opt(exponent)))),
            recognize(pair(digit1, exponent)),
        )),
        |s: Span| Token::FloatLiteral(s.fragment().to_string()),
    )(input)
}

/// Parse an integer literal (unsigned)
pub fn int_literal(input: Span) -> IResult<Span, Token> {
    map(digit1, |s: Span| Token::IntLiteral(s.fragment().to_string()))(input)
}

/// Parse an identifier or keyword
pub fn word(input: Span) -> IResult<Span, Token> {
    map(
        recognize(pair(alpha1, many0(alt((alphanumeric1, tag("_")))))),
        |s: Span| Token::Word(s.fragment().to_string()),
    )(input)
}

/// Parse operators
pub fn operator(input: Span) -> IResult<Span, Token> {
    alt((
        // Two-character operators
        value(Token::Equal, tag("==")),
        value(Token::NotEqual, tag("!=")),
        value(Token::LessEqual, tag("<=")),
        value(Token::GreaterEqual, tag(">=")),
        value(Token::And, tag("&&")),
        value(Token::Or, tag("||")),
        // Single-character operators
        value(Token::Plus, char('+')),
        value(Token::Minus, char('-')),
        value(Token::Star, char('*')),
        value(Token::Slash, char('/')),
        value(Token::Percent, char('%')),
        value(Token::Less, char('<')),
        value(Token::Greater, char('>')),
        value(Token::Not, char('!')),
        value(Token::Assign, char('=')),
    ))(input)
}

/// Parse delimiters
pub fn delimiter(input: Span) -> IResult<Span, Token> {
    alt((
        value(Token::LeftParen, char('(')),
        value(Token::RightParen, char(')')),
        value(Token::LeftBracket, char('[')),
        value(Token::RightBracket, char(']')),
        value(Token::LeftBrace, char('{')),
        value(Token::RightBrace, char('}')),
    ))(input)
}

/// Parse punctuation
pub fn punctuation(input: Span) -> IResult<Span, Token> {
    alt((
        value(Token::Comma, char(',')),
        value(Token::Dot, char('.')),
        value(Token::Colon, char(':')),
        value(Token::Question, char('?')),
    ))(input)
}

/// Parse a single token in normal mode (no leading trivia)
pub fn normal_token(input: Span) -> IResult<Span, Token> {
    alt((
        value(Token::HeredocStart, tag("<<<")), // Must come before operators
        value(Token::DoubleQuote, char('"')),
        value(Token::SingleQuote, char('\'')),
        float_literal, // Must come before int_literal
        int_literal,
        word,
        operator,
        delimiter,
        punctuation,
    ))(input)
}

/// Text following a `version` keyword, up to the next whitespace
pub fn version_text(input: Span) -> IResult<Span, Span> {
    preceded(space0, take_till1(|c: char| c.is_whitespace()))(input)
}

// String and command bodies

/// Kind of delimited body being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `"..."` or `'...'` with placeholders
    Quoted(char),
    /// `<<<...>>>` expression string
    MultiLine,
    /// `command { ... }`
    CommandBrace,
    /// `command <<< ... >>>`
    CommandHeredoc,
    /// `"..."` or `'...'` without placeholders (meta values, import URIs)
    Literal(char),
}

impl BodyKind {
    /// Closing delimiter
    pub fn close(self) -> &'static str {
        match self {
            BodyKind::Quoted('\'') | BodyKind::Literal('\'') => "'",
            BodyKind::Quoted(_) | BodyKind::Literal(_) => "\"",
            BodyKind::MultiLine | BodyKind::CommandHeredoc => ">>>",
            BodyKind::CommandBrace => "}",
        }
    }

    /// Sequences opening an embedded placeholder
    pub fn placeholder_openers(self) -> &'static [&'static str] {
        match self {
            BodyKind::Quoted(_) | BodyKind::CommandBrace => &["~{", "${"],
            BodyKind::MultiLine | BodyKind::CommandHeredoc => &["~{"],
            BodyKind::Literal(_) => &[],
        }
    }
}

/// One piece of a delimited body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyPiece<'a> {
    /// Literal text, raw (escape sequences untouched)
    Text(Span<'a>),
    /// `~{` or `${`
    PlaceholderOpen(Span<'a>),
    /// Closing delimiter
    Close(Span<'a>),
}

/// Byte length of the literal text at the start of `s`, stopping at the
/// closing delimiter or a placeholder opener. A backslash always takes the
/// following character with it, so escaped delimiters don't end the text.
fn scan_body(s: &str, kind: BodyKind) -> usize {
    let close = kind.close();
    let openers = kind.placeholder_openers();
    let mut i = 0;
    while i < s.len() {
        let rest = &s[i..];
        if rest.starts_with(close) || openers.iter().any(|opener| rest.starts_with(opener)) {
            break;
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some('\\') => {
                i += 1;
                i += chars.next().map(char::len_utf8).unwrap_or(0);
            }
            Some(c) => i += c.len_utf8(),
            None => break,
        }
    }
    i
}

/// Parse the literal text at the start of a body, possibly empty
pub fn body_text<'a>(input: Span<'a>, kind: BodyKind) -> IResult<Span<'a>, Span<'a>> {
    let len = scan_body(input.fragment(), kind);
    Ok(input.take_split(len))
}

/// Parse the next piece of a body. Fails at end of input.
pub fn body_piece<'a>(input: Span<'a>, kind: BodyKind) -> IResult<Span<'a>, BodyPiece<'a>> {
    if let Ok((rest, close)) = tag::<_, _, nom::error::Error<Span>>(kind.close())(input) {
        return Ok((rest, BodyPiece::Close(close)));
    }
    for opener in kind.placeholder_openers() {
        if let Ok((rest, open)) = tag::<_, _, nom::error::Error<Span>>(*opener)(input) {
            return Ok((rest, BodyPiece::PlaceholderOpen(open)));
        }
    }
    let (rest, text) = body_text(input, kind)?;
    if text.fragment().is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        )));
    }
    Ok((rest, BodyPiece::Text(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        let mut input = Span::new(source);
        let mut tokens = Vec::new();
        loop {
            let (rest, _) = trivia(input).unwrap();
            if rest.fragment().is_empty() {
                break;
            }
            let (rest, token) = normal_token(rest).unwrap();
            tokens.push(token);
            input = rest;
        }
        tokens
    }

    #[test]
    fn test_int_literal_parsing() {
        let (_, token) = int_literal(Span::new("42")).unwrap();
        assert_eq!(token, Token::IntLiteral("42".to_string()));

        // Signs are left to the grammar
        assert!(int_literal(Span::new("-123")).is_err());
    }

    #[test]
    fn test_float_literal_parsing() {
        for text in ["3.11", "2.5e10", ".14", ".5e10", "1.", "1e-3"] {
            let (rest, token) = float_literal(Span::new(text)).unwrap();
            assert_eq!(token, Token::FloatLiteral(text.to_string()));
            assert!(rest.fragment().is_empty());
        }
        assert!(float_literal(Span::new("-2.5e10")).is_err());
        assert!(float_literal(Span::new("42")).is_err());
    }

    #[test]
    fn test_words_with_keyword_prefix() {
        let (rest, token) = word(Span::new("true_false_ternary")).unwrap();
        assert_eq!(token, Token::Word("true_false_ternary".to_string()));
        assert!(rest.fragment().is_empty());
    }

    #[test]
    fn test_operators() {
        let test_cases = vec![
            ("==", Token::Equal),
            ("!=", Token::NotEqual),
            ("<=", Token::LessEqual),
            (">=", Token::GreaterEqual),
            ("&&", Token::And),
            ("||", Token::Or),
            ("+", Token::Plus),
            ("-", Token::Minus),
            ("*", Token::Star),
            ("/", Token::Slash),
            ("%", Token::Percent),
        ];

        for (input_str, expected) in test_cases {
            let (_, token) = operator(Span::new(input_str)).unwrap();
            assert_eq!(token, expected, "operator {}", input_str);
        }
    }

    #[test]
    fn test_normal_tokens_skip_trivia() {
        let tokens = lex_all("task t { # a comment\n  Int x = <<<\n}");
        assert_eq!(
            tokens,
            vec![
                Token::Word("task".to_string()),
                Token::Word("t".to_string()),
                Token::LeftBrace,
                Token::Word("Int".to_string()),
                Token::Word("x".to_string()),
                Token::Assign,
                Token::HeredocStart,
                Token::RightBrace,
            ]
        );
    }

    #[test]
    fn test_trivia_reports_comments() {
        let (rest, comments) = trivia(Span::new("  # one\n\n\t# two\r\nx")).unwrap();
        assert_eq!(*rest.fragment(), "x");
        let texts: Vec<&str> = comments.iter().map(|c| *c.fragment()).collect();
        assert_eq!(texts, vec!["# one", "# two"]);
        assert_eq!(comments[1].location_line(), 3);
        assert_eq!(single_line_meta(&comments[1]), Meta::new(3, 2, 3, 7));
    }

    #[test]
    fn test_body_pieces_in_double_quotes() {
        let input = Span::new(r#"a \"b\" ~{x} c""#);
        let (rest, piece) = body_piece(input, BodyKind::Quoted('"')).unwrap();
        assert!(matches!(piece, BodyPiece::Text(t) if *t.fragment() == r#"a \"b\" "#));
        let (rest, piece) = body_piece(rest, BodyKind::Quoted('"')).unwrap();
        assert!(matches!(piece, BodyPiece::PlaceholderOpen(t) if *t.fragment() == "~{"));
        assert_eq!(*rest.fragment(), "x} c\"");
    }

    #[test]
    fn test_heredoc_ignores_dollar_brace() {
        let input = Span::new("echo ${HOME} ~{name}>>>");
        let (rest, piece) = body_piece(input, BodyKind::CommandHeredoc).unwrap();
        assert!(matches!(piece, BodyPiece::Text(t) if *t.fragment() == "echo ${HOME} "));
        let (rest, _) = body_piece(rest, BodyKind::CommandHeredoc).unwrap();
        assert_eq!(*rest.fragment(), "name}>>>");
    }

    #[test]
    fn test_literal_body_has_no_placeholders() {
        let input = Span::new("lib/~{x}.wdl\" rest");
        let (rest, piece) = body_piece(input, BodyKind::Literal('"')).unwrap();
        assert!(matches!(piece, BodyPiece::Text(t) if *t.fragment() == "lib/~{x}.wdl"));
        let (_, piece) = body_piece(rest, BodyKind::Literal('"')).unwrap();
        assert!(matches!(piece, BodyPiece::Close(_)));
    }

    #[test]
    fn test_unterminated_body_fails() {
        assert!(body_piece(Span::new(""), BodyKind::Quoted('\'')).is_err());
    }

    #[test]
    fn test_version_text() {
        let (rest, text) = version_text(Span::new(" 1.1\n")).unwrap();
        assert_eq!(*text.fragment(), "1.1");
        assert_eq!(*rest.fragment(), "\n");
    }
}
