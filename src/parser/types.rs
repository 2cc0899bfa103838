//! Token-based type parsing for WDL

use super::cst::{ConcreteChild, ConcreteNode, ConcreteResult, ConcreteToken, Rule, TokenKind};
use super::parser_utils::node;
use super::token_stream::TokenStream;
use super::tokens::Token;

/// Parse a type such as `Int`, `Array[File]+?` or `Map[String, Pair[Int, Int]]?`.
///
/// Type names and parameter counts are not checked here. The node keeps the
/// name, then any parameter types, then the quantifier as a symbol token.
pub fn parse_type(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let name = stream.expect_word("type")?;
    let start = name.meta;
    let mut children: Vec<ConcreteChild> = vec![name.into()];

    if stream.try_consume(&Token::LeftBracket)?.is_some() {
        loop {
            children.push(stream.nested("type", parse_type)?.into());
            if stream.try_consume(&Token::Comma)?.is_none() {
                break;
            }
        }
        stream.expect(Token::RightBracket)?;
    }

    if let Some(quantifier) = parse_quantifier(stream)? {
        children.push(quantifier.into());
    }

    Ok(node(stream, Rule::Type, start, children))
}

/// Parse an optional `?`, `+`, `+?` or `?+` quantifier
fn parse_quantifier(stream: &mut TokenStream) -> ConcreteResult<Option<ConcreteToken>> {
    let first = stream.peek()?;
    if !first.token.is_quantifier() {
        return Ok(None);
    }
    stream.next()?;

    let mut text = first.token.to_string();
    let mut meta = first.meta;
    let second = stream.peek()?;
    if second.token.is_quantifier() && second.token != first.token {
        stream.next()?;
        text.push_str(&second.token.to_string());
        meta = meta.to(second.meta);
    }
    Ok(Some(ConcreteToken::new(TokenKind::Symbol, text, meta)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cst::CommentToken;
    use crate::parser::grammar::lookup;

    fn parse(source: &str) -> ConcreteResult<ConcreteNode> {
        let mut sink = |_c: CommentToken| {};
        let mut stream = TokenStream::new(source, lookup("1.0").unwrap().spec, &mut sink);
        let node = parse_type(&mut stream)?;
        stream.finish()?;
        Ok(node)
    }

    fn quantifier(node: &ConcreteNode) -> Option<String> {
        match node.children.last() {
            Some(ConcreteChild::Token(token)) if token.kind == TokenKind::Symbol => {
                Some(token.text.clone())
            }
            _ => None,
        }
    }

    #[test]
    fn test_parse_simple_type() {
        let node = parse("String").unwrap();
        assert_eq!(node.children.len(), 1);
        assert_eq!(quantifier(&node), None);
    }

    #[test]
    fn test_parse_quantifiers() {
        assert_eq!(quantifier(&parse("Int?").unwrap()).as_deref(), Some("?"));
        assert_eq!(quantifier(&parse("Array[Int]+").unwrap()).as_deref(), Some("+"));
        assert_eq!(quantifier(&parse("Array[Int]+?").unwrap()).as_deref(), Some("+?"));
        assert!(parse("Int??").is_err());
    }

    #[test]
    fn test_parse_nested_type() {
        let node = parse("Map[String, Array[Pair[Int, File?]]]?").unwrap();
        assert_eq!(node.children.len(), 4);
        match &node.children[2] {
            ConcreteChild::Node(inner) => assert_eq!(inner.rule, Rule::Type),
            other => panic!("Expected type node, got {:?}", other),
        }
        assert_eq!(node.meta.end_column, 38);
    }

    #[test]
    fn test_parse_type_error() {
        let err = parse("Array[Int").unwrap_err();
        assert_eq!(err.message, "expected ], found end of input");
    }
}
