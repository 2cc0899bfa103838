//! WDL parser front end.
//!
//! Text goes through the concrete grammar of the resolved dialect, then the
//! resulting tree is lowered into the AST. A [`Parser`] owns its grammar cache
//! and lock; the free functions at the bottom of this module share one
//! process-wide default instance.

pub mod cache;
pub mod compiled;
pub mod cst;
pub mod declarations;
pub mod document;
pub mod expressions;
pub mod grammar;
pub mod keywords;
pub mod lexer;
pub mod literals;
pub mod parser_utils;
pub mod statements;
pub mod tasks;
pub mod token_stream;
pub mod tokens;
pub mod translate;
pub mod types;
pub mod version;

use crate::config::ParserConfig;
use crate::error::{ParseResult, SourcePosition, WdlError};
use crate::expr::Expression;
use crate::lower::{DocLowerer, ExprLowerer};
use crate::tree::{Declaration, Document, Task};
use cache::GrammarCache;
use compiled::StartSymbol;
use grammar::GrammarEntry;
use once_cell::sync::Lazy;
use tracing::debug;
use translate::ParseContext;

static DEFAULT_PARSER: Lazy<Parser> = Lazy::new(Parser::default);

/// A WDL parser with its own grammar cache.
///
/// Parses through one instance are serialised; independent instances do not
/// contend with each other.
#[derive(Debug, Default)]
pub struct Parser {
    config: ParserConfig,
    cache: GrammarCache,
}

impl Parser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            cache: GrammarCache::new(),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn cache(&self) -> &GrammarCache {
        &self.cache
    }

    /// Parse a standalone expression. The version defaults to
    /// `default_expression_version`; no `version` line is looked for.
    pub fn parse_expression(&self, text: &str, version: Option<&str>) -> ParseResult<Expression> {
        let buffer = self.config.buffer_uri.as_str();
        let version = version.unwrap_or(&self.config.default_expression_version);
        let ctx = ParseContext {
            uri: buffer,
            abspath: buffer,
            version,
            declared: None,
        };
        debug!(version, "parsing expression");

        let entry = grammar::lookup(version).map_err(|e| self.failed(ctx.unknown_version(e)))?;
        let (tree, _) = self
            .cache
            .parse(entry, StartSymbol::Expr, text)
            .map_err(|e| self.failed(ctx.concrete(e, buffer)))?;
        ExprLowerer::new(buffer, buffer, version, None)
            .lower(&tree)
            .map_err(|e| self.failed(ctx.lowering(e)))
    }

    /// Parse a fragment holding only task definitions
    pub fn parse_tasks(&self, text: &str, version: Option<&str>) -> ParseResult<Vec<Task>> {
        let version = version.unwrap_or(&self.config.default_document_version);
        self.parse_fragment(text, version, StartSymbol::Tasks, |lowerer, tree| {
            lowerer.lower_tasks(tree)
        })
    }

    /// Parse a single declaration with an initializer
    pub fn parse_bound_declaration(
        &self,
        text: &str,
        version: Option<&str>,
    ) -> ParseResult<Declaration> {
        let version = version.unwrap_or(&self.config.default_document_version);
        self.parse_fragment(text, version, StartSymbol::BoundDecl, |lowerer, tree| {
            lowerer.lower_bound_decl(tree)
        })
    }

    /// Parse a whole document.
    ///
    /// An explicit `version` overrides the document's own `version` line,
    /// which in turn overrides `default_document_version`. Blank text gives
    /// an empty document without running the grammar.
    pub fn parse_document(
        &self,
        text: &str,
        version: Option<&str>,
        uri: &str,
        abspath: &str,
    ) -> ParseResult<Document> {
        if text.trim().is_empty() {
            return Ok(Document::empty(
                text.to_string(),
                SourcePosition::zero(uri, abspath),
            ));
        }

        let (version, declared) =
            version::resolve(version, text, &self.config.default_document_version);
        debug!(version = %version, declared = ?declared, uri, "parsing document");
        let ctx = ParseContext {
            uri,
            abspath,
            version: &version,
            declared: declared.as_deref(),
        };

        let entry = grammar::lookup(&version).map_err(|e| self.failed(ctx.unknown_version(e)))?;
        let (tree, comments) = self
            .cache
            .parse(entry, StartSymbol::Document, text)
            .map_err(|e| self.failed(ctx.concrete(e, &self.config.buffer_uri)))?;
        doc_lowerer(entry, &ctx)
            .lower_document(&tree, text, comments, ctx.declared)
            .map_err(|e| self.failed(ctx.lowering(e)))
    }

    /// Parse a task list or declaration. Fragments have no source identity,
    /// so AST positions carry an empty URI while syntax errors report the
    /// buffer URI.
    fn parse_fragment<T>(
        &self,
        text: &str,
        version: &str,
        start: StartSymbol,
        lower: impl FnOnce(&DocLowerer, &cst::ConcreteNode) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let ctx = ParseContext {
            uri: "",
            abspath: "",
            version,
            declared: None,
        };
        debug!(version, %start, "parsing fragment");

        let entry = grammar::lookup(version).map_err(|e| self.failed(ctx.unknown_version(e)))?;
        let (tree, _) = self
            .cache
            .parse(entry, start, text)
            .map_err(|e| self.failed(ctx.concrete(e, &self.config.buffer_uri)))?;
        lower(&doc_lowerer(entry, &ctx), &tree).map_err(|e| self.failed(ctx.lowering(e)))
    }

    fn failed(&self, err: WdlError) -> WdlError {
        debug!(
            line = err.pos().line,
            column = err.pos().column,
            error = %err,
            "parse failed"
        );
        err
    }
}

fn doc_lowerer<'a>(entry: &'a GrammarEntry, ctx: &ParseContext<'a>) -> DocLowerer<'a> {
    let expr = ExprLowerer::new(ctx.uri, ctx.abspath, ctx.version, ctx.declared);
    DocLowerer::new(expr, &entry.keywords)
}

/// Parse an expression with the default parser
pub fn parse_expression(text: &str, version: Option<&str>) -> ParseResult<Expression> {
    DEFAULT_PARSER.parse_expression(text, version)
}

/// Parse a task list with the default parser
pub fn parse_tasks(text: &str, version: Option<&str>) -> ParseResult<Vec<Task>> {
    DEFAULT_PARSER.parse_tasks(text, version)
}

/// Parse a bound declaration with the default parser
pub fn parse_bound_declaration(text: &str, version: Option<&str>) -> ParseResult<Declaration> {
    DEFAULT_PARSER.parse_bound_declaration(text, version)
}

/// Parse a document with the default parser
pub fn parse_document(
    text: &str,
    version: Option<&str>,
    uri: &str,
    abspath: &str,
) -> ParseResult<Document> {
    DEFAULT_PARSER.parse_document(text, version, uri, abspath)
}
