//! Token stream for the recursive-descent grammar.
//!
//! The stream is a cursor into the source text. Normal-mode tokens are lexed
//! on demand, so peeking is free of side effects and backtracking is just a
//! matter of restoring the cursor. Comments are reported through a callback
//! when the token following them is consumed, each exactly once.

use super::cst::{CommentToken, ConcreteResult, ConcreteSyntaxError, ConcreteToken, Meta, TokenKind};
use super::grammar::GrammarSpec;
use super::lexer::{self, single_line_meta, span_meta, BodyKind, BodyPiece, Span};
use super::tokens::{LocatedToken, Token};

/// Deepest nesting of expressions, types and blocks a parse accepts. Every
/// level costs native stack in the grammar and again in lowering.
pub const MAX_NESTING: usize = 128;

/// Piece of a string or command body, converted to concrete tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(ConcreteToken),
    PlaceholderOpen(Meta),
    Close(ConcreteToken),
}

pub struct TokenStream<'a, 's> {
    cursor: Span<'a>,
    spec: GrammarSpec,
    /// Offset just past the last comment reported
    comment_horizon: usize,
    on_comment: &'s mut dyn FnMut(CommentToken),
    /// Span of the last consumed token
    last_meta: Meta,
    /// Current nesting level, see [`MAX_NESTING`]
    depth: usize,
}

impl<'a, 's> TokenStream<'a, 's> {
    pub fn new(
        source: &'a str,
        spec: GrammarSpec,
        on_comment: &'s mut dyn FnMut(CommentToken),
    ) -> Self {
        Self {
            cursor: Span::new(source),
            spec,
            comment_horizon: 0,
            on_comment,
            last_meta: Meta::new(1, 1, 1, 1),
            depth: 0,
        }
    }

    /// Syntax features of the active dialect
    pub fn spec(&self) -> &GrammarSpec {
        &self.spec
    }

    /// Go one nesting level deeper. `what` names the construct in the error
    /// raised once [`MAX_NESTING`] is exceeded.
    pub fn descend(&mut self, what: &str) -> ConcreteResult<()> {
        if self.depth >= MAX_NESTING {
            let at = self.peek().map(|token| token.meta).unwrap_or(self.last_meta);
            return Err(ConcreteSyntaxError::at(
                at,
                format!("{} nested too deeply", what),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Undo `levels` calls to [`TokenStream::descend`]
    pub fn ascend(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    /// Run `parse` one nesting level deeper
    pub fn nested<T>(
        &mut self,
        what: &str,
        parse: impl FnOnce(&mut Self) -> ConcreteResult<T>,
    ) -> ConcreteResult<T> {
        self.descend(what)?;
        let result = parse(self);
        self.ascend(1);
        result
    }

    /// Lex one normal-mode token at `at`, returning it with the remaining
    /// input and the comments skipped on the way.
    fn lex_at(&self, at: Span<'a>) -> ConcreteResult<(LocatedToken, Span<'a>, Vec<Span<'a>>)> {
        let (start, comments) = match lexer::trivia(at) {
            Ok(ok) => ok,
            Err(_) => (at, Vec::new()),
        };
        if start.fragment().is_empty() {
            let meta = span_meta(&start, &start);
            return Ok((LocatedToken::new(Token::Eof, meta), start, comments));
        }
        match lexer::normal_token(start) {
            Ok((rest, token)) => Ok((
                LocatedToken::new(token, span_meta(&start, &rest)),
                rest,
                comments,
            )),
            Err(_) => {
                let found = start.fragment().chars().next().unwrap_or_default();
                Err(ConcreteSyntaxError::at(
                    span_meta(&start, &start),
                    format!("unexpected character {:?}", found),
                ))
            }
        }
    }

    fn report_comments(&mut self, comments: Vec<Span<'a>>) {
        for comment in comments {
            let offset = comment.location_offset();
            if offset < self.comment_horizon {
                continue;
            }
            self.comment_horizon = offset + comment.fragment().len();
            let meta = single_line_meta(&comment);
            (self.on_comment)(CommentToken {
                text: comment.fragment().to_string(),
                offset,
                line: meta.line,
                column: meta.column,
                end_line: Some(meta.end_line),
                end_column: Some(meta.end_column),
            });
        }
    }

    /// Peek at the current token without consuming it
    pub fn peek(&self) -> ConcreteResult<LocatedToken> {
        self.lex_at(self.cursor).map(|(token, _, _)| token)
    }

    /// Peek at the current token type
    pub fn peek_token(&self) -> ConcreteResult<Token> {
        self.peek().map(|located| located.token)
    }

    /// Peek at the nth token ahead (0 = current) without consuming
    pub fn peek_ahead(&self, n: usize) -> ConcreteResult<Token> {
        let mut at = self.cursor;
        for _ in 0..n {
            let (_, rest, _) = self.lex_at(at)?;
            at = rest;
        }
        self.lex_at(at).map(|(located, _, _)| located.token)
    }

    /// Consume and return the current token
    pub fn next(&mut self) -> ConcreteResult<LocatedToken> {
        let (token, rest, comments) = self.lex_at(self.cursor)?;
        self.report_comments(comments);
        self.cursor = rest;
        self.last_meta = token.meta;
        Ok(token)
    }

    /// Consume a specific token type, returning an error if it doesn't match
    pub fn expect(&mut self, expected: Token) -> ConcreteResult<LocatedToken> {
        let current = self.peek()?;
        if current.token == expected {
            self.next()
        } else {
            Err(ConcreteSyntaxError::at(
                current.meta,
                format!("expected {}, found {}", expected, current.token),
            ))
        }
    }

    /// Try to consume a specific token type
    pub fn try_consume(&mut self, expected: &Token) -> ConcreteResult<Option<LocatedToken>> {
        if self.peek_token()? == *expected {
            self.next().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Consume any word, as a concrete token
    pub fn expect_word(&mut self, what: &str) -> ConcreteResult<ConcreteToken> {
        let current = self.peek()?;
        match current.token {
            Token::Word(text) => {
                self.next()?;
                Ok(ConcreteToken::new(TokenKind::Word, text, current.meta))
            }
            other => Err(ConcreteSyntaxError::at(
                current.meta,
                format!("expected {}, found {}", what, other),
            )),
        }
    }

    /// Consume the specific word `word`
    pub fn expect_keyword(&mut self, word: &str) -> ConcreteResult<ConcreteToken> {
        let current = self.peek()?;
        if current.token.is_word(word) {
            self.next()?;
            Ok(ConcreteToken::new(TokenKind::Word, word, current.meta))
        } else {
            Err(ConcreteSyntaxError::at(
                current.meta,
                format!("expected {}, found {}", word, current.token),
            ))
        }
    }

    /// Check whether the current token is the word `word`
    pub fn at_word(&self, word: &str) -> ConcreteResult<bool> {
        Ok(self.peek_token()?.is_word(word))
    }

    /// Lex the next piece of a string or command body. The cursor must sit
    /// inside the body, right after its opener or a placeholder.
    pub fn body_piece(&mut self, kind: BodyKind) -> ConcreteResult<Piece> {
        let start = self.cursor;
        let (rest, piece) = lexer::body_piece(start, kind).map_err(|_| {
            let what = match kind {
                BodyKind::CommandBrace | BodyKind::CommandHeredoc => "command",
                _ => "string",
            };
            ConcreteSyntaxError::at(self.last_meta, format!("unterminated {}", what))
        })?;
        let meta = span_meta(&start, &rest);
        self.cursor = rest;
        self.last_meta = meta;
        Ok(match piece {
            BodyPiece::Text(text) => {
                Piece::Text(ConcreteToken::new(TokenKind::Text, *text.fragment(), meta))
            }
            BodyPiece::PlaceholderOpen(_) => Piece::PlaceholderOpen(meta),
            BodyPiece::Close(close) => {
                Piece::Close(ConcreteToken::new(TokenKind::Delimiter, *close.fragment(), meta))
            }
        })
    }

    /// Consume the text of a `version` statement, up to the next whitespace
    pub fn version_text(&mut self) -> ConcreteResult<ConcreteToken> {
        let (rest, text) = lexer::version_text(self.cursor)
            .map_err(|_| ConcreteSyntaxError::at(self.last_meta, "expected version number"))?;
        let meta = single_line_meta(&text);
        self.cursor = rest;
        self.last_meta = meta;
        Ok(ConcreteToken::new(TokenKind::Word, *text.fragment(), meta))
    }

    /// Require that only whitespace and comments remain
    pub fn finish(&mut self) -> ConcreteResult<()> {
        let current = self.peek()?;
        if current.token != Token::Eof {
            return Err(ConcreteSyntaxError::at(
                current.meta,
                format!("unexpected {}", current.token),
            ));
        }
        self.next()?;
        Ok(())
    }

    /// Span of the most recently consumed token
    pub fn last_meta(&self) -> Meta {
        self.last_meta
    }

    /// Get the current position in the stream
    pub fn position(&self) -> Span<'a> {
        self.cursor
    }

    /// Set the position in the stream (for backtracking)
    pub fn set_position(&mut self, pos: Span<'a>) {
        self.cursor = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar::lookup;

    fn spec() -> GrammarSpec {
        lookup("1.0").unwrap().spec
    }

    #[test]
    fn test_token_stream() {
        let mut sink = |_c: CommentToken| {};
        let mut stream = TokenStream::new("foo + bar", spec(), &mut sink);

        assert_eq!(stream.peek_token().unwrap(), Token::Word("foo".to_string()));
        assert_eq!(stream.peek_ahead(1).unwrap(), Token::Plus);

        let token = stream.next().unwrap();
        assert_eq!(token.token, Token::Word("foo".to_string()));
        assert_eq!(token.meta, Meta::new(1, 1, 1, 4));

        assert_eq!(stream.next().unwrap().token, Token::Plus);
        assert_eq!(stream.next().unwrap().token, Token::Word("bar".to_string()));
        assert_eq!(stream.peek_token().unwrap(), Token::Eof);
        assert!(stream.finish().is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let mut sink = |_c: CommentToken| {};
        let mut stream = TokenStream::new("x", spec(), &mut sink);
        for _ in 0..MAX_NESTING {
            stream.descend("block").unwrap();
        }
        let err = stream.descend("block").unwrap_err();
        assert_eq!(err.message, "block nested too deeply");
        assert_eq!((err.line, err.column), (Some(1), Some(1)));

        stream.ascend(1);
        assert!(stream.nested("block", |stream| stream.next()).is_ok());
        assert!(stream.descend("block").is_ok());
    }

    #[test]
    fn test_expect() {
        let mut sink = |_c: CommentToken| {};
        let mut stream = TokenStream::new("( 42 )", spec(), &mut sink);

        assert!(stream.expect(Token::LeftParen).is_ok());
        let err = stream.expect(Token::Plus).unwrap_err();
        assert_eq!(err.message, "expected +, found 42");
        assert_eq!((err.line, err.column), (Some(1), Some(3)));

        // Still at 42
        assert_eq!(
            stream.next().unwrap().token,
            Token::IntLiteral("42".to_string())
        );
    }

    #[test]
    fn test_backtracking_reports_comments_once() {
        let mut comments = Vec::new();
        {
            let mut sink = |c: CommentToken| comments.push(c);
            let mut stream = TokenStream::new("a # first\n b # second\n", spec(), &mut sink);

            let saved = stream.position();
            stream.next().unwrap();
            stream.next().unwrap();
            stream.set_position(saved);
            stream.next().unwrap();
            stream.next().unwrap();
            stream.finish().unwrap();
        }
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["# first", "# second"]);
        assert_eq!(comments[1].line, 2);
        assert_eq!(comments[1].column, 4);
        assert_eq!(comments[1].end_column, Some(12));
    }

    #[test]
    fn test_peek_does_not_report_comments() {
        let mut count = 0;
        {
            let mut sink = |_c: CommentToken| count += 1;
            let stream = TokenStream::new("# c\nx", spec(), &mut sink);
            stream.peek().unwrap();
            stream.peek_ahead(1).unwrap();
        }
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unexpected_character() {
        let mut sink = |_c: CommentToken| {};
        let stream = TokenStream::new("\n  @", spec(), &mut sink);
        let err = stream.peek().unwrap_err();
        assert_eq!((err.line, err.column), (Some(2), Some(3)));
        assert!(err.message.contains("unexpected character"));
    }

    #[test]
    fn test_body_pieces() {
        let mut sink = |_c: CommentToken| {};
        let mut stream = TokenStream::new("\"hi ~{x}\"", spec(), &mut sink);
        stream.expect(Token::DoubleQuote).unwrap();

        match stream.body_piece(BodyKind::Quoted('"')).unwrap() {
            Piece::Text(text) => {
                assert_eq!(text.text, "hi ");
                assert_eq!(text.meta, Meta::new(1, 2, 1, 5));
            }
            other => panic!("Expected text, got {:?}", other),
        }
        assert!(matches!(
            stream.body_piece(BodyKind::Quoted('"')).unwrap(),
            Piece::PlaceholderOpen(_)
        ));
        assert_eq!(stream.next().unwrap().token, Token::Word("x".to_string()));
        assert_eq!(stream.next().unwrap().token, Token::RightBrace);
        assert!(matches!(
            stream.body_piece(BodyKind::Quoted('"')).unwrap(),
            Piece::Close(_)
        ));
    }
}
