//! Token-based document parsing for WDL

use super::cst::{ConcreteChild, ConcreteNode, ConcreteResult, ConcreteSyntaxError, Rule};
use super::declarations::parse_unbound_decl;
use super::literals::parse_string_literal;
use super::parser_utils::{node, parse_until};
use super::tasks::{parse_task, parse_workflow};
use super::token_stream::TokenStream;
use super::tokens::Token;

/// Parse `version X`
fn parse_version(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("version")?.meta;
    let text = stream.version_text()?;
    Ok(node(stream, Rule::Version, start, vec![text.into()]))
}

/// Parse `import "uri" [as ns] [alias A as B]*`
fn parse_import(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("import")?.meta;
    let mut children: Vec<ConcreteChild> = vec![parse_string_literal(stream)?.into()];

    if stream.at_word("as")? {
        let keyword = stream.expect_keyword("as")?;
        let namespace = stream.expect_word("import namespace")?;
        children.push(node(stream, Rule::ImportAs, keyword.meta, vec![namespace.into()]).into());
    }

    while stream.at_word("alias")? {
        let keyword = stream.expect_keyword("alias")?;
        let source = stream.expect_word("struct name")?;
        stream.expect_keyword("as")?;
        let local = stream.expect_word("struct alias")?;
        children.push(
            node(
                stream,
                Rule::ImportAlias,
                keyword.meta,
                vec![source.into(), local.into()],
            )
            .into(),
        );
    }

    Ok(node(stream, Rule::Import, start, children))
}

/// Parse `struct Name { members }`
fn parse_struct(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("struct")?.meta;
    let name = stream.expect_word("struct name")?;
    stream.expect(Token::LeftBrace)?;
    let members = parse_until(stream, Token::RightBrace, parse_unbound_decl)?;

    let mut children: Vec<ConcreteChild> = vec![name.into()];
    children.extend(members.into_iter().map(ConcreteChild::from));
    Ok(node(stream, Rule::Struct, start, children))
}

/// Parse a whole document
pub fn parse_document(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.peek()?.meta;
    let spec = *stream.spec();
    let mut children: Vec<ConcreteChild> = Vec::new();

    if spec.version_statement && stream.at_word("version")? {
        children.push(parse_version(stream)?.into());
    }

    loop {
        let current = stream.peek()?;
        let item = match &current.token {
            Token::Eof => break,
            Token::Word(word) if word == "import" => parse_import(stream)?,
            Token::Word(word) if word == "task" => parse_task(stream)?,
            Token::Word(word) if word == "workflow" => parse_workflow(stream)?,
            Token::Word(word) if word == "struct" && spec.structs => parse_struct(stream)?,
            other => {
                return Err(ConcreteSyntaxError::at(
                    current.meta,
                    format!("expected import, struct, task or workflow, found {}", other),
                ))
            }
        };
        children.push(item.into());
    }

    Ok(node(stream, Rule::Document, start, children))
}
