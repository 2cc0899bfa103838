//! Token-based expression parsing for WDL

use super::cst::{ConcreteChild, ConcreteNode, ConcreteResult, ConcreteSyntaxError, Rule};
use super::literals::{parse_array, parse_map, parse_object, parse_string};
use super::parser_utils::{at_number, node, parse_delimited_list, parse_number, Separator};
use super::token_stream::TokenStream;
use super::tokens::Token;

/// Parse a parenthesized expression or a pair literal `(a, b)`
pub fn parse_paren_expr(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let open = stream.expect(Token::LeftParen)?;
    let first = parse_expr(stream)?;

    if stream.try_consume(&Token::Comma)?.is_some() {
        let second = parse_expr(stream)?;
        stream.expect(Token::RightParen)?;
        Ok(node(
            stream,
            Rule::Pair,
            open.meta,
            vec![first.into(), second.into()],
        ))
    } else {
        stream.expect(Token::RightParen)?;
        Ok(first)
    }
}

/// Parse a function application `name(args...)`
fn parse_apply(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let name = stream.expect_word("function name")?;
    let start = name.meta;
    let args = parse_delimited_list(
        stream,
        Token::LeftParen,
        Token::RightParen,
        Separator::Comma,
        parse_expr,
    )?;
    let mut children: Vec<ConcreteChild> = vec![name.into()];
    children.extend(args.into_iter().map(ConcreteChild::from));
    Ok(node(stream, Rule::Apply, start, children))
}

/// Parse `if c then a else b`
fn parse_if_then_else(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let start = stream.expect_keyword("if")?.meta;
    let condition = parse_expr(stream)?;
    stream.expect_keyword("then")?;
    let true_expr = parse_expr(stream)?;
    stream.expect_keyword("else")?;
    let false_expr = parse_expr(stream)?;
    Ok(node(
        stream,
        Rule::IfThenElse,
        start,
        vec![condition.into(), true_expr.into(), false_expr.into()],
    ))
}

/// Parse postfix expressions (member access and indexing)
pub fn parse_postfix_expr(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    let mut expr = parse_primary_expr(stream)?;

    // each access wraps the tree one level deeper
    let mut folded = 0;
    loop {
        match stream.peek_token()? {
            Token::Dot => {
                stream.next()?;
                let member = stream.expect_word("member name")?;
                let start = expr.meta;
                expr = node(stream, Rule::GetName, start, vec![expr.into(), member.into()]);
            }
            Token::LeftBracket => {
                stream.next()?;
                let index = parse_expr(stream)?;
                stream.expect(Token::RightBracket)?;
                let start = expr.meta;
                expr = node(stream, Rule::At, start, vec![expr.into(), index.into()]);
            }
            _ => break,
        }
        stream.descend("expression")?;
        folded += 1;
    }

    stream.ascend(folded);
    Ok(expr)
}

/// Parse unary expression
pub fn parse_unary_expr(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    match stream.try_consume(&Token::Not)? {
        Some(not) => {
            let operand = stream.nested("expression", parse_unary_expr)?;
            Ok(node(stream, Rule::Negate, not.meta, vec![operand.into()]))
        }
        None => parse_postfix_expr(stream),
    }
}

/// Get operator precedence
fn get_precedence(token: &Token) -> Option<u8> {
    match token {
        Token::Or => Some(1),
        Token::And => Some(2),
        Token::Equal
        | Token::NotEqual
        | Token::Less
        | Token::LessEqual
        | Token::Greater
        | Token::GreaterEqual => Some(3),
        Token::Plus | Token::Minus => Some(4),
        Token::Star | Token::Slash | Token::Percent => Some(5),
        _ => None,
    }
}

/// Convert an infix operator token to its rule
fn token_to_rule(token: &Token) -> Option<Rule> {
    match token {
        Token::Or => Some(Rule::Lor),
        Token::And => Some(Rule::Land),
        Token::Equal => Some(Rule::Eqeq),
        Token::NotEqual => Some(Rule::Neq),
        Token::Less => Some(Rule::Lt),
        Token::LessEqual => Some(Rule::Lte),
        Token::Greater => Some(Rule::Gt),
        Token::GreaterEqual => Some(Rule::Gte),
        Token::Plus => Some(Rule::Add),
        Token::Minus => Some(Rule::Sub),
        Token::Star => Some(Rule::Mul),
        Token::Slash => Some(Rule::Div),
        Token::Percent => Some(Rule::Rem),
        _ => None,
    }
}

/// Parse binary expression with operator precedence. All infix operators
/// are left-associative.
pub fn parse_binary_expr(
    stream: &mut TokenStream,
    min_precedence: u8,
) -> ConcreteResult<ConcreteNode> {
    let mut left = parse_unary_expr(stream)?;

    let mut folded = 0;
    loop {
        let token = stream.peek_token()?;
        let (precedence, rule) = match (get_precedence(&token), token_to_rule(&token)) {
            (Some(prec), Some(rule)) if prec >= min_precedence => (prec, rule),
            _ => break,
        };
        stream.next()?;

        let right = parse_binary_expr(stream, precedence + 1)?;
        let start = left.meta;
        left = node(stream, rule, start, vec![left.into(), right.into()]);
        stream.descend("expression")?;
        folded += 1;
    }

    stream.ascend(folded);
    Ok(left)
}

/// Parse primary expression
pub fn parse_primary_expr(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    if at_number(stream)? {
        return parse_number(stream);
    }

    let current = stream.peek()?;
    match &current.token {
        Token::LeftParen => parse_paren_expr(stream),
        Token::LeftBracket => parse_array(stream),
        Token::LeftBrace => parse_map(stream),
        Token::DoubleQuote | Token::SingleQuote | Token::HeredocStart => parse_string(stream),
        Token::Word(word) => {
            let rule = match word.as_str() {
                "true" => Some(Rule::BooleanTrue),
                "false" => Some(Rule::BooleanFalse),
                "None" => Some(Rule::Null),
                _ => None,
            };
            if let Some(rule) = rule {
                let token = stream.expect_word("literal")?;
                return Ok(ConcreteNode::new(rule, token.meta, vec![token.into()]));
            }
            if word == "if" {
                return parse_if_then_else(stream);
            }

            match stream.peek_ahead(1)? {
                Token::LeftBrace
                    if word == "object" || stream.spec().named_struct_literals =>
                {
                    parse_object(stream)
                }
                Token::LeftParen => parse_apply(stream),
                _ => {
                    let name = stream.expect_word("identifier")?;
                    Ok(ConcreteNode::new(
                        Rule::LeftName,
                        name.meta,
                        vec![name.into()],
                    ))
                }
            }
        }
        other => Err(ConcreteSyntaxError::at(
            current.meta,
            format!("expected expression, found {}", other),
        )),
    }
}

/// Parse any expression
pub fn parse_expr(stream: &mut TokenStream) -> ConcreteResult<ConcreteNode> {
    stream.nested("expression", |stream| parse_binary_expr(stream, 1))
}
