//! Strings, placeholders and compound literals

use super::cst::{
    ConcreteChild, ConcreteNode, ConcreteResult, ConcreteSyntaxError, ConcreteToken, Meta, Rule,
    TokenKind,
};
use super::expressions::parse_expr;
use super::lexer::BodyKind;
use super::parser_utils::{at_number, node, parse_delimited_list, parse_number, Separator};
use super::token_stream::{Piece, TokenStream};
use super::tokens::Token;

/// Parse a string with placeholders: `"..."`, `'...'` or `<<<...>>>`.
///
/// Children are the opening delimiter, text segments and placeholders in
/// source order, then the closing delimiter.
pub fn parse_string(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let open = stream.next()?;
    let (kind, text) = match open.token {
        Token::DoubleQuote => (BodyKind::Quoted('"'), "\""),
        Token::SingleQuote => (BodyKind::Quoted('\''), "'"),
        Token::HeredocStart => (BodyKind::MultiLine, "<<<"),
        other => {
            return Err(ConcreteSyntaxError::at(
                open.meta,
                format!("expected string, found {}", other),
            ))
        }
    };

    let mut children: Vec<ConcreteChild> =
        vec![ConcreteToken::new(TokenKind::Delimiter, text, open.meta).into()];
    parse_body(stream, kind, &mut children)?;
    Ok(node(stream, Rule::String, open.meta, children))
}

/// Parse the pieces of a string or command body up to and including the
/// closing delimiter. The closing delimiter is kept unless this is a
/// command.
pub fn parse_body(
    stream: &mut TokenStream,
    kind: BodyKind,
    children: &mut Vec<ConcreteChild>,
) -> ConcreteResult<()> {
    loop {
        match stream.body_piece(kind)? {
            Piece::Text(text) => children.push(text.into()),
            Piece::PlaceholderOpen(meta) => children.push(parse_placeholder(stream, meta)?.into()),
            Piece::Close(close) => {
                if !matches!(kind, BodyKind::CommandBrace | BodyKind::CommandHeredoc) {
                    children.push(close.into());
                }
                return Ok(());
            }
        }
    }
}

/// Parse the inside of `~{ ... }` after its opener: options, then the
/// expression, then the closing brace.
fn parse_placeholder(stream: &mut TokenStream, open: Meta) -> ConcreteResult<ConcreteNode> {
    let mut children: Vec<ConcreteChild> = Vec::new();
    while stream.peek_token()?.is_any_word() && stream.peek_ahead(1)? == Token::Assign {
        children.push(parse_placeholder_option(stream)?.into());
    }
    children.push(parse_expr(stream)?.into());
    stream.expect(Token::RightBrace)?;
    Ok(node(stream, Rule::Placeholder, open, children))
}

/// Parse `name=value` inside a placeholder
fn parse_placeholder_option(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let name = stream.expect_word("placeholder option")?;
    stream.expect(Token::Assign)?;
    let value = if at_number(stream)? {
        parse_number(stream)?
    } else {
        parse_string_literal(stream)?
    };
    Ok(node(
        stream,
        Rule::PlaceholderOption,
        name.meta,
        vec![name.into(), value.into()],
    ))
}

/// Parse a quoted string without placeholders, e.g. an import URI or a meta
/// value. Its children are the delimiters around an optional text token.
pub fn parse_string_literal(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let open = stream.next()?;
    let quote = match open.token {
        Token::DoubleQuote => '"',
        Token::SingleQuote => '\'',
        other => {
            return Err(ConcreteSyntaxError::at(
                open.meta,
                format!("expected string literal, found {}", other),
            ))
        }
    };
    let mut children: Vec<ConcreteChild> =
        vec![ConcreteToken::new(TokenKind::Delimiter, quote.to_string(), open.meta).into()];
    parse_body(stream, BodyKind::Literal(quote), &mut children)?;
    Ok(node(stream, Rule::StringLiteral, open.meta, children))
}

/// Parse an array literal `[a, b, c]`
pub fn parse_array(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.peek()?.meta;
    let items = parse_delimited_list(
        stream,
        Token::LeftBracket,
        Token::RightBracket,
        Separator::Comma,
        parse_expr,
    )?;
    Ok(node(
        stream,
        Rule::Array,
        start,
        items.into_iter().map(ConcreteChild::from).collect(),
    ))
}

/// Parse a map literal `{k: v, ...}`
pub fn parse_map(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.peek()?.meta;
    let entries = parse_delimited_list(
        stream,
        Token::LeftBrace,
        Token::RightBrace,
        Separator::Comma,
        |stream| {
            let key = parse_expr(stream)?;
            stream.expect(Token::Colon)?;
            let value = parse_expr(stream)?;
            let meta = key.meta.to(value.meta);
            Ok(ConcreteNode::new(
                Rule::MapKv,
                meta,
                vec![key.into(), value.into()],
            ))
        },
    )?;
    Ok(node(
        stream,
        Rule::Map,
        start,
        entries.into_iter().map(ConcreteChild::from).collect(),
    ))
}

/// Parse an object or struct literal: `object {k: v}` or `Name {k: v}`.
/// The leading word is kept as the first child.
pub fn parse_object(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let name = stream.expect_word("struct name")?;
    let start = name.meta;
    let entries = parse_delimited_list(
        stream,
        Token::LeftBrace,
        Token::RightBrace,
        Separator::Comma,
        parse_object_kv,
    )?;
    let mut children: Vec<ConcreteChild> = vec![name.into()];
    children.extend(entries.into_iter().map(ConcreteChild::from));
    Ok(node(stream, Rule::Obj, start, children))
}

fn parse_object_kv(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let key: ConcreteChild = match stream.peek_token()? {
        Token::DoubleQuote | Token::SingleQuote => parse_string_literal(stream)?.into(),
        _ => stream.expect_word("member name")?.into(),
    };
    let start = key.meta();
    stream.expect(Token::Colon)?;
    let value = parse_expr(stream)?;
    Ok(node(stream, Rule::ObjectKv, start, vec![key, value.into()]))
}
