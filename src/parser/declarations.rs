//! Token-based declaration parsing for WDL

use super::cst::{ConcreteChild, ConcreteNode, ConcreteResult, ConcreteSyntaxError, Rule};
use super::expressions::parse_expr;
use super::parser_utils::node;
use super::token_stream::TokenStream;
use super::tokens::Token;
use super::types::parse_type;

/// Whether the stream sits on an `env` marker rather than a type named `env`
fn at_env_marker(stream: &TokenStream) -> ConcreteResult<bool> {
    if !stream.spec().env_declarations || !stream.at_word("env")? {
        return Ok(false);
    }
    if !stream.peek_ahead(1)?.is_any_word() {
        return Ok(false);
    }
    Ok(matches!(
        stream.peek_ahead(2)?,
        Token::Word(_) | Token::LeftBracket | Token::Question | Token::Plus
    ))
}

/// Parse a declaration `Type name` or `Type name = expr`.
///
/// With `allow_env`, a leading `env` marker is kept as the first child where
/// the dialect supports it.
pub fn parse_any_decl(stream: &mut TokenStream, allow_env: bool) -> ConcreteResult<ConcreteNode> {
    let start = stream.peek()?.meta;
    let mut children: Vec<ConcreteChild> = Vec::new();

    if allow_env && at_env_marker(stream)? {
        children.push(stream.expect_keyword("env")?.into());
    }
    children.push(parse_type(stream)?.into());
    children.push(stream.expect_word("declaration name")?.into());

    if stream.try_consume(&Token::Assign)?.is_some() {
        children.push(parse_expr(stream)?.into());
        Ok(node(stream, Rule::BoundDecl, start, children))
    } else {
        Ok(node(stream, Rule::UnboundDecl, start, children))
    }
}

/// Parse a declaration that must carry an initializer
pub fn parse_bound_decl(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let decl = parse_any_decl(stream, false)?;
    if decl.rule != Rule::BoundDecl {
        let found = stream.peek()?;
        return Err(ConcreteSyntaxError::at(
            found.meta,
            format!("expected =, found {}", found.token),
        ));
    }
    Ok(decl)
}

/// Parse a declaration without an initializer, e.g. a struct member
pub fn parse_unbound_decl(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.peek()?.meta;
    let decl_type = parse_type(stream)?;
    let name = stream.expect_word("declaration name")?;
    Ok(node(
        stream,
        Rule::UnboundDecl,
        start,
        vec![decl_type.into(), name.into()],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cst::{CommentToken, TokenKind};
    use crate::parser::grammar::lookup;

    fn parse(
        source: &str,
        version: &str,
        f: fn(&mut TokenStream) -> ConcreteResult<ConcreteNode>,
    ) -> ConcreteResult<ConcreteNode> {
        let mut sink = |_c: CommentToken| {};
        let mut stream = TokenStream::new(source, lookup(version).unwrap().spec, &mut sink);
        let node = f(&mut stream)?;
        stream.finish()?;
        Ok(node)
    }

    fn task_decl(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
        parse_any_decl(stream, true)
    }

    fn first_word(node: &ConcreteNode) -> Option<&str> {
        match &node.children[0] {
            ConcreteChild::Token(token) if token.kind == TokenKind::Word => Some(&token.text),
            _ => None,
        }
    }

    #[test]
    fn test_bound_and_unbound() {
        let node = parse("Int x = 1 + 2", "1.0", task_decl).unwrap();
        assert_eq!(node.rule, Rule::BoundDecl);
        assert_eq!(node.children.len(), 3);

        let node = parse("Array[File]+ files", "1.0", task_decl).unwrap();
        assert_eq!(node.rule, Rule::UnboundDecl);
    }

    #[test]
    fn test_bound_decl_requires_initializer() {
        let err = parse("String s", "1.0", parse_bound_decl).unwrap_err();
        assert_eq!(err.message, "expected =, found end of input");
    }

    #[test]
    fn test_env_marker() {
        let node = parse("env String PATH", "1.2", task_decl).unwrap();
        assert_eq!(first_word(&node), Some("env"));
        assert_eq!(node.children.len(), 3);

        let node = parse("env Array[String] xs = []", "development", task_decl).unwrap();
        assert_eq!(first_word(&node), Some("env"));

        // a struct type named env
        let node = parse("env e", "1.2", task_decl).unwrap();
        assert_eq!(first_word(&node), None);

        // not recognised before 1.2
        assert!(parse("env String PATH", "1.1", task_decl).is_err());
    }
}
