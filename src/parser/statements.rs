//! Workflow statement parsing: calls, scatters, conditionals and outputs

use super::cst::{ConcreteChild, ConcreteNode, ConcreteResult, ConcreteToken, Rule, TokenKind};
use super::declarations::{parse_any_decl, parse_bound_decl};
use super::expressions::parse_expr;
use super::parser_utils::{at_word_then, node, parse_delimited_list, parse_until, Separator};
use super::token_stream::TokenStream;
use super::tokens::Token;

/// Parse a dotted name such as `lib.task`
fn parse_namespaced_ident(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let first = stream.expect_word("call target")?;
    let start = first.meta;
    let mut children: Vec<ConcreteChild> = vec![first.into()];
    while stream.try_consume(&Token::Dot)?.is_some() {
        children.push(stream.expect_word("name")?.into());
    }
    Ok(node(stream, Rule::NamespacedIdent, start, children))
}

/// Parse one call input: `name = expr`, or the shorthand `name`
fn parse_call_input(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let name = stream.expect_word("call input name")?;
    let start = name.meta;
    let mut children: Vec<ConcreteChild> = vec![name.into()];
    if stream.try_consume(&Token::Assign)?.is_some() {
        children.push(parse_expr(stream)?.into());
    }
    Ok(node(stream, Rule::CallInput, start, children))
}

/// Parse the `{ input: a = 1, b }` block of a call
fn parse_call_inputs(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect(Token::LeftBrace)?.meta;
    let mut children: Vec<ConcreteChild> = Vec::new();

    if at_word_then(stream, "input", &Token::Colon)? {
        let input = stream.expect_keyword("input")?;
        stream.expect(Token::Colon)?;
        children.push(node(stream, Rule::InputColon, input.meta, Vec::new()).into());
    }

    loop {
        if stream.try_consume(&Token::RightBrace)?.is_some() {
            break;
        }
        children.push(parse_call_input(stream)?.into());
        if stream.try_consume(&Token::Comma)?.is_none() {
            stream.expect(Token::RightBrace)?;
            break;
        }
    }

    Ok(node(stream, Rule::CallInputs, start, children))
}

/// Parse a call statement: `call ns.task [as alias] [after other]* [{ inputs }]`
pub fn parse_call_statement(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("call")?.meta;
    let mut children: Vec<ConcreteChild> = vec![parse_namespaced_ident(stream)?.into()];

    if stream.at_word("as")? {
        let keyword = stream.expect_keyword("as")?;
        let alias = stream.expect_word("call alias")?;
        children.push(node(stream, Rule::CallAlias, keyword.meta, vec![alias.into()]).into());
    }

    if stream.spec().call_after {
        while stream.at_word("after")? && stream.peek_ahead(1)?.is_any_word() {
            let keyword = stream.expect_keyword("after")?;
            let name = stream.expect_word("call name")?;
            children.push(node(stream, Rule::CallAfter, keyword.meta, vec![name.into()]).into());
        }
    }

    if stream.peek_token()? == Token::LeftBrace {
        children.push(parse_call_inputs(stream)?.into());
    }

    Ok(node(stream, Rule::Call, start, children))
}

/// Parse a braced list of inner workflow elements
fn parse_inner_body(stream: &mut TokenStream) -> ConcreteResult<Vec<ConcreteChild>> {
    stream.expect(Token::LeftBrace)?;
    let elements = stream.nested("block", |stream| {
        parse_until(stream, Token::RightBrace, parse_workflow_element)
    })?;
    Ok(elements.into_iter().map(ConcreteChild::from).collect())
}

/// Parse a scatter block: `scatter (x in xs) { ... }`
pub fn parse_scatter_statement(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("scatter")?.meta;
    stream.expect(Token::LeftParen)?;
    let variable = stream.expect_word("scatter variable")?;
    stream.expect_keyword("in")?;
    let expr = parse_expr(stream)?;
    stream.expect(Token::RightParen)?;

    let mut children: Vec<ConcreteChild> = vec![variable.into(), expr.into()];
    children.extend(parse_inner_body(stream)?);
    Ok(node(stream, Rule::Scatter, start, children))
}

/// Parse a conditional block: `if (cond) { ... }`
pub fn parse_conditional_statement(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("if")?.meta;
    stream.expect(Token::LeftParen)?;
    let condition = parse_expr(stream)?;
    stream.expect(Token::RightParen)?;

    let mut children: Vec<ConcreteChild> = vec![condition.into()];
    children.extend(parse_inner_body(stream)?);
    Ok(node(stream, Rule::Conditional, start, children))
}

/// Parse a workflow body element: call, scatter, conditional or declaration
pub fn parse_workflow_element(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    if stream.at_word("call")? && stream.peek_ahead(1)?.is_any_word() {
        return parse_call_statement(stream);
    }
    if at_word_then(stream, "scatter", &Token::LeftParen)? {
        return parse_scatter_statement(stream);
    }
    if at_word_then(stream, "if", &Token::LeftParen)? {
        return parse_conditional_statement(stream);
    }
    parse_any_decl(stream, false)
}

/// Whether a legacy output section entry is a declaration rather than a bare
/// identifier path
fn at_output_decl(stream: &TokenStream) -> ConcreteResult<bool> {
    Ok(match stream.peek_ahead(1)? {
        Token::LeftBracket | Token::Question | Token::Plus => true,
        Token::Word(_) => stream.peek_ahead(2)? == Token::Assign,
        _ => false,
    })
}

/// Parse a legacy output identifier: `call.output` or `call.*`
fn parse_output_ident(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let first = stream.expect_word("output name")?;
    let start = first.meta;
    let mut children: Vec<ConcreteChild> = vec![first.into()];
    while stream.try_consume(&Token::Dot)?.is_some() {
        if let Some(star) = stream.try_consume(&Token::Star)? {
            children.push(ConcreteToken::new(TokenKind::Symbol, "*", star.meta).into());
            break;
        }
        children.push(stream.expect_word("output name")?.into());
    }
    Ok(node(stream, Rule::OutputIdent, start, children))
}

/// Parse a workflow `output { ... }` section. Draft-2 also accepts bare and
/// wildcard identifier paths.
pub fn parse_workflow_outputs(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("output")?.meta;
    let entries = if stream.spec().legacy_output_idents {
        parse_delimited_list(
            stream,
            Token::LeftBrace,
            Token::RightBrace,
            Separator::OptionalComma,
            |stream| {
                if at_output_decl(stream)? {
                    parse_bound_decl(stream)
                } else {
                    parse_output_ident(stream)
                }
            },
        )?
    } else {
        stream.expect(Token::LeftBrace)?;
        parse_until(stream, Token::RightBrace, parse_bound_decl)?
    };
    Ok(node(
        stream,
        Rule::WorkflowOutputDecls,
        start,
        entries.into_iter().map(ConcreteChild::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::cst::CommentToken;
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

    fn rules(node: &ConcreteNode) -> Vec<Rule> {
        node.children
            .iter()
            .filter_map(|child| match child {
                ConcreteChild::Node(node) => Some(node.rule),
                ConcreteChild::Token(_) => None,
            })
            .collect()
    }

    fn texts(node: &ConcreteNode) -> Vec<String> {
        node.children
            .iter()
            .filter_map(|child| match child {
                ConcreteChild::Token(token) => Some(token.text.clone()),
                ConcreteChild::Node(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_call_statement() {
        let node = parse(
            "call lib.align as a after prep after index { input: x = 1, y }",
            "1.1",
            parse_call_statement,
        )
        .unwrap();
        assert_eq!(
            rules(&node),
            vec![
                Rule::NamespacedIdent,
                Rule::CallAlias,
                Rule::CallAfter,
                Rule::CallAfter,
                Rule::CallInputs
            ]
        );
        match &node.children[0] {
            ConcreteChild::Node(ident) => assert_eq!(texts(ident), vec!["lib", "align"]),
            other => panic!("Expected namespaced ident, got {:?}", other),
        }
        match &node.children[4] {
            ConcreteChild::Node(inputs) => assert_eq!(
                rules(inputs),
                vec![Rule::InputColon, Rule::CallInput, Rule::CallInput]
            ),
            other => panic!("Expected call inputs, got {:?}", other),
        }
    }

    #[test]
    fn test_call_inputs_without_colon() {
        let node = parse("call t { x = 1, }", "1.0", parse_call_statement).unwrap();
        match node.children.last() {
            Some(ConcreteChild::Node(inputs)) => assert_eq!(rules(inputs), vec![Rule::CallInput]),
            other => panic!("Expected call inputs, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_scatter_and_conditional() {
        let node = parse(
            "scatter (s in samples) {\n  call t { input: s = s }\n  if (s > 1) { Int y = s }\n}",
            "1.0",
            parse_workflow_element,
        )
        .unwrap();
        assert_eq!(node.rule, Rule::Scatter);
        assert_eq!(texts(&node), vec!["s"]);
        assert_eq!(
            rules(&node),
            vec![Rule::LeftName, Rule::Call, Rule::Conditional]
        );
    }

    #[test]
    fn test_legacy_output_idents() {
        let node = parse(
            "output {\n  t.out\n  t.*\n  Int x = 1\n  other, last.value }",
            "draft-2",
            parse_workflow_outputs,
        )
        .unwrap();
        assert_eq!(
            rules(&node),
            vec![
                Rule::OutputIdent,
                Rule::OutputIdent,
                Rule::BoundDecl,
                Rule::OutputIdent,
                Rule::OutputIdent
            ]
        );
        match &node.children[1] {
            ConcreteChild::Node(ident) => assert_eq!(texts(ident), vec!["t", "*"]),
            other => panic!("Expected output ident, got {:?}", other),
        }
    }

    #[test]
    fn test_output_idents_rejected_after_draft2() {
        assert!(parse("output { t.out }", "1.0", parse_workflow_outputs).is_err());
    }
}
