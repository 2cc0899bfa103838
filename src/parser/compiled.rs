//! Parsers bound to a dialect and a start symbol

use super::cst::{CommentToken, ConcreteNode, ConcreteResult};
use super::declarations::parse_bound_decl;
use super::document::parse_document;
use super::expressions::parse_expr;
use super::grammar::{GrammarEntry, GrammarSpec};
use super::tasks::parse_tasks;
use super::token_stream::TokenStream;
use std::fmt;

/// Grammar rule a parse starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartSymbol {
    Expr,
    Tasks,
    BoundDecl,
    Document,
}

impl StartSymbol {
    fn rule(self) -> fn(&mut TokenStream) -> ConcreteResult<ConcreteNode> {
        match self {
            StartSymbol::Expr => parse_expr,
            StartSymbol::Tasks => parse_tasks,
            StartSymbol::BoundDecl => parse_bound_decl,
            StartSymbol::Document => parse_document,
        }
    }
}

impl fmt::Display for StartSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StartSymbol::Expr => "expr",
            StartSymbol::Tasks => "tasks",
            StartSymbol::BoundDecl => "bound_decl",
            StartSymbol::Document => "document",
        };
        write!(f, "{}", name)
    }
}

/// A grammar specialised for one dialect and start symbol
#[derive(Debug, Clone)]
pub struct CompiledParser {
    version: &'static str,
    spec: GrammarSpec,
    start: StartSymbol,
}

impl CompiledParser {
    pub fn compile(entry: &GrammarEntry, start: StartSymbol) -> Self {
        Self {
            version: entry.version,
            spec: entry.spec,
            start,
        }
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn start(&self) -> StartSymbol {
        self.start
    }

    /// Parse `text` in full. Comments are handed to `on_comment` in source
    /// order as they are lexed.
    pub fn parse(
        &self,
        text: &str,
        on_comment: &mut dyn FnMut(CommentToken),
    ) -> ConcreteResult<ConcreteNode> {
        let mut stream = TokenStream::new(text, self.spec, on_comment);
        let tree = (self.start.rule())(&mut stream)?;
        stream.finish()?;
        Ok(tree)
    }
}
