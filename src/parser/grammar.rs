//! Registry of the WDL dialects this crate understands.
//!
//! Each dialect is a [`GrammarSpec`] (the syntax features its grammar
//! enables) paired with its reserved keyword set.

use super::keywords::{keywords_for_version, KeywordSet};
use once_cell::sync::Lazy;
use thiserror::Error;

/// Registered versions, oldest first
pub const VERSIONS: &[&str] = &["draft-2", "1.0", "1.1", "1.2", "development"];

/// Syntax features that differ between dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrammarSpec {
    /// `version X` statement at the top of a document
    pub version_statement: bool,
    /// `struct` definitions and `alias` clauses on imports
    pub structs: bool,
    /// `input { ... }` sections in tasks and workflows
    pub input_sections: bool,
    /// `call x after y` ordering clauses
    pub call_after: bool,
    /// `Name { member: value }` struct literals
    pub named_struct_literals: bool,
    /// `env` marker on task input declarations
    pub env_declarations: bool,
    /// Bare and wildcard identifiers in workflow output sections
    pub legacy_output_idents: bool,
}

impl GrammarSpec {
    fn for_version(version: &str) -> Self {
        let v1 = version != "draft-2";
        let v1_1 = v1 && version != "1.0";
        let v1_2 = v1_1 && version != "1.1";
        Self {
            version_statement: v1,
            structs: v1,
            input_sections: v1,
            call_after: v1_1,
            named_struct_literals: v1_1,
            env_declarations: v1_2,
            legacy_output_idents: !v1,
        }
    }
}

/// One registered dialect
#[derive(Debug)]
pub struct GrammarEntry {
    pub version: &'static str,
    pub spec: GrammarSpec,
    pub keywords: KeywordSet,
}

/// Lookup of an unregistered version
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown WDL version {version}; choices: {}", .choices.join(", "))]
pub struct UnknownVersion {
    pub version: String,
    pub choices: Vec<&'static str>,
}

static REGISTRY: Lazy<Vec<GrammarEntry>> = Lazy::new(|| {
    VERSIONS
        .iter()
        .filter_map(|&version| {
            keywords_for_version(version).map(|keywords| GrammarEntry {
                version,
                spec: GrammarSpec::for_version(version),
                keywords,
            })
        })
        .collect()
});

/// Find the grammar and keyword set for `version`.
pub fn lookup(version: &str) -> Result<&'static GrammarEntry, UnknownVersion> {
    REGISTRY
        .iter()
        .find(|entry| entry.version == version)
        .ok_or_else(|| UnknownVersion {
            version: version.to_string(),
            choices: versions().collect(),
        })
}

/// Registered version names, oldest first
pub fn versions() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|entry| entry.version)
}
