//! WDL version-specific keywords

use std::collections::HashSet;

/// Reserved words of one dialect
pub type KeywordSet = HashSet<&'static str>;

const DRAFT2_KEYWORDS: &[&str] = &[
    "Array",
    "Boolean",
    "File",
    "Float",
    "Int",
    "Map",
    "None",
    "Object",
    "Pair",
    "String",
    "as",
    "call",
    "command",
    "else",
    "false",
    "if",
    "import",
    "input",
    "left",
    "meta",
    "object",
    "output",
    "parameter_meta",
    "right",
    "runtime",
    "scatter",
    "task",
    "then",
    "true",
    "workflow",
];

/// Added by WDL 1.0 and kept by every later version
const V1_KEYWORDS: &[&str] = &["alias", "struct", "version"];

/// Added by WDL 1.2
const V1_2_KEYWORDS: &[&str] = &["Directory"];

/// Get the set of keywords for a specific WDL version, or `None` if the
/// version isn't one we know.
pub fn keywords_for_version(version: &str) -> Option<KeywordSet> {
    let mut keywords: KeywordSet = DRAFT2_KEYWORDS.iter().copied().collect();
    match version {
        "draft-2" => {}
        "1.0" | "1.1" => keywords.extend(V1_KEYWORDS),
        "1.2" | "development" => {
            keywords.extend(V1_KEYWORDS);
            keywords.extend(V1_2_KEYWORDS);
        }
        _ => return None,
    }
    Some(keywords)
}

/// Check if a string is a valid WDL identifier (ignoring keywords)
pub fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
