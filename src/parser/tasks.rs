//! Token-based task and workflow parsing for WDL

use super::cst::{
    ConcreteChild, ConcreteNode, ConcreteResult, ConcreteSyntaxError, ConcreteToken, Rule,
};
use super::declarations::{parse_any_decl, parse_bound_decl};
use super::expressions::parse_expr;
use super::lexer::BodyKind;
use super::literals::{parse_body, parse_string_literal};
use super::parser_utils::{at_number, at_word_then, node, parse_delimited_list, parse_number, parse_until, Separator};
use super::statements::{parse_workflow_element, parse_workflow_outputs};
use super::token_stream::TokenStream;
use super::tokens::Token;

/// Parse a section keyword followed by `{`, keeping the keyword token
fn section_keyword(stream: &mut TokenStream, word: &str) -> ConcreteResult<ConcreteToken> {
    let keyword = stream.expect_keyword(word)?;
    stream.expect(Token::LeftBrace)?;
    Ok(keyword)
}

/// Parse `input { decls }`. Task inputs may carry the `env` marker.
pub fn parse_input_section(stream: &mut TokenStream, allow_env: bool) -> ConcreteResult<ConcreteNode> {
    let start = section_keyword(stream, "input")?.meta;
    let decls = parse_until(stream, Token::RightBrace, |s| parse_any_decl(s, allow_env))?;
    Ok(node(
        stream,
        Rule::InputDecls,
        start,
        decls.into_iter().map(ConcreteChild::from).collect(),
    ))
}

/// Parse a task's `output { decls }`
fn parse_output_section(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = section_keyword(stream, "output")?.meta;
    let decls = parse_until(stream, Token::RightBrace, parse_bound_decl)?;
    Ok(node(
        stream,
        Rule::OutputDecls,
        start,
        decls.into_iter().map(ConcreteChild::from).collect(),
    ))
}

/// Parse a metadata value: string, number, boolean, null, object or array
fn parse_meta_value(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    if at_number(stream)? {
        return parse_number(stream);
    }
    let current = stream.peek()?;
    match &current.token {
        Token::DoubleQuote | Token::SingleQuote => parse_string_literal(stream),
        Token::LeftBrace => stream.nested("metadata value", parse_meta_object),
        Token::LeftBracket => {
            let items = stream.nested("metadata value", |stream| {
                parse_delimited_list(
                    stream,
                    Token::LeftBracket,
                    Token::RightBracket,
                    Separator::Comma,
                    parse_meta_value,
                )
            })?;
            Ok(node(
                stream,
                Rule::MetaArray,
                current.meta,
                items.into_iter().map(ConcreteChild::from).collect(),
            ))
        }
        Token::Word(word) => {
            let rule = match word.as_str() {
                "true" => Rule::BooleanTrue,
                "false" => Rule::BooleanFalse,
                "null" | "None" => Rule::Null,
                _ => {
                    return Err(ConcreteSyntaxError::at(
                        current.meta,
                        format!("expected metadata value, found {}", word),
                    ))
                }
            };
            let token = stream.expect_word("metadata value")?;
            Ok(ConcreteNode::new(rule, token.meta, vec![token.into()]))
        }
        other => Err(ConcreteSyntaxError::at(
            current.meta,
            format!("expected metadata value, found {}", other),
        )),
    }
}

/// Parse `{ key: value ... }` with optional commas
fn parse_meta_object(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.peek()?.meta;
    let entries = parse_delimited_list(
        stream,
        Token::LeftBrace,
        Token::RightBrace,
        Separator::OptionalComma,
        |stream| {
            let key = stream.expect_word("metadata key")?;
            let start = key.meta;
            stream.expect(Token::Colon)?;
            let value = parse_meta_value(stream)?;
            Ok(node(stream, Rule::MetaKv, start, vec![key.into(), value.into()]))
        },
    )?;
    Ok(node(
        stream,
        Rule::MetaObject,
        start,
        entries.into_iter().map(ConcreteChild::from).collect(),
    ))
}

/// Parse `meta { ... }` or `parameter_meta { ... }`
pub fn parse_meta_section(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let kind = stream.expect_word("meta section")?;
    let start = kind.meta;
    let object = parse_meta_object(stream)?;
    Ok(node(
        stream,
        Rule::MetaSection,
        start,
        vec![kind.into(), object.into()],
    ))
}

/// Parse `runtime { key: expr ... }`
fn parse_runtime_section(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("runtime")?.meta;
    let entries = parse_delimited_list(
        stream,
        Token::LeftBrace,
        Token::RightBrace,
        Separator::OptionalComma,
        |stream| {
            let key = stream.expect_word("runtime key")?;
            let start = key.meta;
            stream.expect(Token::Colon)?;
            let value = parse_expr(stream)?;
            Ok(node(stream, Rule::RuntimeKv, start, vec![key.into(), value.into()]))
        },
    )?;
    Ok(node(
        stream,
        Rule::RuntimeSection,
        start,
        entries.into_iter().map(ConcreteChild::from).collect(),
    ))
}

/// Parse `command { ... }` or `command <<< ... >>>`. The body is kept as raw
/// text tokens and placeholders.
fn parse_command_section(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("command")?.meta;
    let open = stream.next()?;
    let kind = match open.token {
        Token::LeftBrace => BodyKind::CommandBrace,
        Token::HeredocStart => BodyKind::CommandHeredoc,
        other => {
            return Err(ConcreteSyntaxError::at(
                open.meta,
                format!("expected {{ or <<<, found {}", other),
            ))
        }
    };
    let mut children = Vec::new();
    parse_body(stream, kind, &mut children)?;
    Ok(node(stream, Rule::Command, start, children))
}

/// Parse one task element: a section or a non-input declaration
fn parse_task_element(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let spec = *stream.spec();
    if spec.input_sections && at_word_then(stream, "input", &Token::LeftBrace)? {
        return parse_input_section(stream, true);
    }
    if at_word_then(stream, "output", &Token::LeftBrace)? {
        return parse_output_section(stream);
    }
    if at_word_then(stream, "runtime", &Token::LeftBrace)? {
        return parse_runtime_section(stream);
    }
    if at_word_then(stream, "meta", &Token::LeftBrace)?
        || at_word_then(stream, "parameter_meta", &Token::LeftBrace)?
    {
        return parse_meta_section(stream);
    }
    if stream.at_word("command")?
        && matches!(
            stream.peek_ahead(1)?,
            Token::LeftBrace | Token::HeredocStart
        )
    {
        return parse_command_section(stream);
    }

    let decl = parse_any_decl(stream, true)?;
    let start = decl.meta;
    Ok(node(stream, Rule::NoninputDecl, start, vec![decl.into()]))
}

/// Parse a task definition
pub fn parse_task(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("task")?.meta;
    let name = stream.expect_word("task name")?;
    stream.expect(Token::LeftBrace)?;

    let mut children: Vec<ConcreteChild> = vec![name.into()];
    let mut has_command = false;
    loop {
        let current = stream.peek()?;
        if current.token == Token::RightBrace {
            if !has_command {
                return Err(ConcreteSyntaxError::at(
                    current.meta,
                    format!("expected command, found {}", current.token),
                ));
            }
            stream.next()?;
            break;
        }
        let element = parse_task_element(stream)?;
        has_command |= element.rule == Rule::Command;
        children.push(element.into());
    }

    Ok(node(stream, Rule::Task, start, children))
}

/// Parse a sequence of task definitions
pub fn parse_tasks(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.peek()?.meta;
    let mut tasks: Vec<ConcreteChild> = Vec::new();
    while stream.at_word("task")? {
        tasks.push(parse_task(stream)?.into());
    }
    Ok(node(stream, Rule::Tasks, start, tasks))
}

/// Parse a workflow definition
pub fn parse_workflow(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("workflow")?.meta;
    let name = stream.expect_word("workflow name")?;
    stream.expect(Token::LeftBrace)?;

    let mut children: Vec<ConcreteChild> = vec![name.into()];
    while stream.try_consume(&Token::RightBrace)?.is_none() {
        let spec = *stream.spec();
        let element = if spec.input_sections && at_word_then(stream, "input", &Token::LeftBrace)? {
            parse_input_section(stream, false)?
        } else if at_word_then(stream, "output", &Token::LeftBrace)? {
            parse_workflow_outputs(stream)?
        } else if at_word_then(stream, "meta", &Token::LeftBrace)?
            || at_word_then(stream, "parameter_meta", &Token::LeftBrace)?
        {
            parse_meta_section(stream)?
        } else {
            parse_workflow_element(stream)?
        };
        children.push(element.into());
    }

    Ok(node(stream, Rule::Workflow, start, children))
}
