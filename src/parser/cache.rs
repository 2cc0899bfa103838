//! Memoized parsers plus the lock that serialises every parse.
//!
//! Lexed comments go into one buffer owned by the cache. The buffer is
//! drained by the call that filled it before the lock is released, so
//! comments never leak between documents parsed on different threads.

use super::compiled::{CompiledParser, StartSymbol};
use super::cst::{CommentToken, ConcreteNode, ConcreteResult};
use super::grammar::GrammarEntry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct CacheState {
    parsers: HashMap<(&'static str, StartSymbol), Arc<CompiledParser>>,
    comments: Vec<CommentToken>,
}

impl CacheState {
    fn acquire(&mut self, entry: &GrammarEntry, start: StartSymbol) -> Arc<CompiledParser> {
        let key = (entry.version, start);
        if let Some(parser) = self.parsers.get(&key) {
            trace!(version = entry.version, %start, "grammar cache hit");
            return Arc::clone(parser);
        }
        debug!(version = entry.version, %start, "compiling parser");
        let parser = Arc::new(CompiledParser::compile(entry, start));
        self.parsers.insert(key, Arc::clone(&parser));
        parser
    }
}

/// Parsers keyed by (version, start symbol), behind a single lock
#[derive(Debug, Default)]
pub struct GrammarCache {
    state: Mutex<CacheState>,
}

impl GrammarCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panic mid-parse leaves nothing half-built except the comment
        // buffer, which every parse clears.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the parser for `(entry.version, start)`, compiling it on first use
    pub fn acquire(&self, entry: &GrammarEntry, start: StartSymbol) -> Arc<CompiledParser> {
        self.lock().acquire(entry, start)
    }

    /// Parse `text` while holding the lock, returning the tree together with
    /// the comments lexed along the way. The buffer is empty again afterwards
    /// whether or not the parse succeeded.
    pub fn parse(
        &self,
        entry: &GrammarEntry,
        start: StartSymbol,
        text: &str,
    ) -> ConcreteResult<(ConcreteNode, Vec<CommentToken>)> {
        let mut state = self.lock();
        state.comments.clear();
        let parser = state.acquire(entry, start);

        let result = {
            let buffer = &mut state.comments;
            let mut on_comment = |comment: CommentToken| buffer.push(comment);
            parser.parse(text, &mut on_comment)
        };
        let comments = std::mem::take(&mut state.comments);
        result.map(|tree| (tree, comments))
    }

    /// Number of compiled parsers
    pub fn len(&self) -> usize {
        self.lock().parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
