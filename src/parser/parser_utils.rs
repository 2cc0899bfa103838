//! Parser utility functions for token-based parsing

use super::cst::{
    ConcreteChild, ConcreteNode, ConcreteResult, ConcreteSyntaxError, ConcreteToken, Meta, Rule,
    TokenKind,
};
use super::token_stream::TokenStream;
use super::tokens::{LocatedToken, Token};

/// Whether list items must be separated by commas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `a, b, c` with an optional trailing comma
    Comma,
    /// Commas between items are optional
    OptionalComma,
}

/// Build a node spanning `start` through the last consumed token. A node
/// that consumed nothing covers just `start`.
pub fn node(
    stream: &TokenStream,
    rule: Rule,
    start: Meta,
    children: Vec<ConcreteChild>,
) -> ConcreteNode {
    let end = stream.last_meta();
    let meta = if (end.end_line, end.end_column) < (start.line, start.column) {
        start
    } else {
        start.to(end)
    };
    ConcreteNode::new(rule, meta, children)
}

/// Convert a consumed numeric token into a concrete token
pub fn numeric_token(located: &LocatedToken, sign: Option<&LocatedToken>) -> Option<ConcreteToken> {
    let (kind, text) = match &located.token {
        Token::IntLiteral(text) => (TokenKind::Int, text),
        Token::FloatLiteral(text) => (TokenKind::Float, text),
        _ => return None,
    };
    let (prefix, meta) = match sign {
        Some(sign) => (sign.token.to_string(), sign.meta.to(located.meta)),
        None => (String::new(), located.meta),
    };
    Some(ConcreteToken::new(kind, format!("{}{}", prefix, text), meta))
}

/// Whether the current token starts a (possibly signed) numeric literal
pub fn at_number(stream: &TokenStream) -> ConcreteResult<bool> {
    Ok(match stream.peek_token()? {
        Token::IntLiteral(_) | Token::FloatLiteral(_) => true,
        Token::Minus | Token::Plus => matches!(
            stream.peek_ahead(1)?,
            Token::IntLiteral(_) | Token::FloatLiteral(_)
        ),
        _ => false,
    })
}

/// Parse a (possibly signed) numeric literal into an `Int` or `Float` node
pub fn parse_number(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let first = stream.next()?;
    let (sign, number) = match first.token {
        Token::Minus | Token::Plus => (Some(first), stream.next()?),
        _ => (None, first),
    };
    match numeric_token(&number, sign.as_ref()) {
        Some(token) => {
            let rule = if token.kind == TokenKind::Int {
                Rule::Int
            } else {
                Rule::Float
            };
            Ok(ConcreteNode::new(rule, token.meta, vec![token.into()]))
        }
        None => Err(ConcreteSyntaxError::at(
            number.meta,
            format!("expected number, found {}", number.token),
        )),
    }
}

/// Parse a list of items enclosed in delimiters
pub fn parse_delimited_list<'a, 's, T, F>(
    stream: &mut TokenStream<'a, 's>,
    open: Token,
    close: Token,
    separator: Separator,
    mut parser: F,
) -> ConcreteResult<Vec<T>>
where
    F: FnMut(&mut TokenStream<'a, 's>) -> ConcreteResult<T>,
{
    stream.expect(open)?;

    let mut items = Vec::new();
    loop {
        if stream.try_consume(&close)?.is_some() {
            return Ok(items);
        }
        items.push(parser(stream)?);

        match separator {
            Separator::Comma => {
                if stream.try_consume(&Token::Comma)?.is_none() {
                    stream.expect(close)?;
                    return Ok(items);
                }
            }
            Separator::OptionalComma => {
                stream.try_consume(&Token::Comma)?;
            }
        }
    }
}

/// Parse items until the closing token, which is consumed
pub fn parse_until<'a, 's, T, F>(
    stream: &mut TokenStream<'a, 's>,
    close: Token,
    mut parser: F,
) -> ConcreteResult<Vec<T>>
where
    F: FnMut(&mut TokenStream<'a, 's>) -> ConcreteResult<T>,
{
    let mut items = Vec::new();
    while stream.try_consume(&close)?.is_none() {
        items.push(parser(stream)?);
    }
    Ok(items)
}

/// Whether the current token is `word` and the one after it is `next`
pub fn at_word_then(stream: &TokenStream, word: &str, next: &Token) -> ConcreteResult<bool> {
    Ok(stream.at_word(word)? && stream.peek_ahead(1)? == *next)
}
