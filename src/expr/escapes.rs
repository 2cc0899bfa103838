//! Escape sequences inside WDL string literals.
//!
//! String nodes keep their literal text exactly as written; these helpers
//! validate and decode it when a plain value is needed.

use crate::error::{ParseResult, SourcePosition, WdlError};
use std::iter::Peekable;
use std::str::Chars;

/// Decode the escape sequences of `escaped`, failing with
/// [`WdlError::BadCharacterEncoding`] on anything unrecognized.
///
/// Accepted: `\\ \n \t \r \' \" \~ \$`, backslash-newline (line
/// continuation), octal `\NNN`, `\xHH`, `\uHHHH` and `\UHHHHHHHH`.
pub fn decode_escapes(pos: &SourcePosition, escaped: &str) -> ParseResult<String> {
    let bad = || WdlError::BadCharacterEncoding { pos: pos.clone() };

    let mut ans = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            ans.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => ans.push('\\'),
            Some('n') => ans.push('\n'),
            Some('t') => ans.push('\t'),
            Some('r') => ans.push('\r'),
            Some('\'') => ans.push('\''),
            Some('"') => ans.push('"'),
            Some('~') => ans.push('~'),
            Some('$') => ans.push('$'),
            Some('\n') => {}
            Some(first @ '0'..='7') => {
                let rest = take_digits(&mut chars, 2, 8).ok_or_else(bad)?;
                let code = (first as u32 - '0' as u32) * 64 + rest;
                ans.push(char::from_u32(code).ok_or_else(bad)?);
            }
            Some('x') => {
                let code = take_digits(&mut chars, 2, 16).ok_or_else(bad)?;
                ans.push(char::from_u32(code).ok_or_else(bad)?);
            }
            Some('u') => {
                let code = take_digits(&mut chars, 4, 16).ok_or_else(bad)?;
                ans.push(char::from_u32(code).ok_or_else(bad)?);
            }
            Some('U') => {
                let code = take_digits(&mut chars, 8, 16).ok_or_else(bad)?;
                ans.push(char::from_u32(code).ok_or_else(bad)?);
            }
            _ => return Err(bad()),
        }
    }
    Ok(ans)
}

/// Consume exactly `count` digits of the given radix.
fn take_digits(chars: &mut Peekable<Chars<'_>>, count: usize, radix: u32) -> Option<u32> {
    let mut value: u32 = 0;
    for _ in 0..count {
        let digit = chars.peek()?.to_digit(radix)?;
        chars.next();
        value = value.checked_mul(radix)?.checked_add(digit)?;
    }
    Some(value)
}
