//! Error types and source position tracking for WDL parsing.
//!
//! Parsing is fail-fast: the first violation found while parsing or lowering
//! aborts the whole operation, and that single [`WdlError`] is the only
//! diagnostic returned. There is no multi-diagnostic aggregation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source position information for AST nodes and errors.
///
/// Contains both the original URI/filename and resolved absolute path,
/// along with one-based line and column positions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// The filename/URI passed to load or import (may be relative)
    pub uri: String,
    /// The absolute filename/URI after path resolution
    pub abspath: String,
    /// One-based line number where the construct starts
    pub line: u32,
    /// One-based column number where the construct starts
    pub column: u32,
    /// One-based line number where the construct ends
    pub end_line: u32,
    /// One-based column number just past the end of the construct
    pub end_column: u32,
}

impl SourcePosition {
    pub fn new(
        uri: String,
        abspath: String,
        line: u32,
        column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            uri,
            abspath,
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// A zero-valued position, used when a failure carries no location.
    pub fn zero(uri: &str, abspath: &str) -> Self {
        Self::new(uri.to_string(), abspath.to_string(), 0, 0, 0, 0)
    }
}

/// Result type returned by every parsing and lowering step.
pub type ParseResult<T> = Result<T, WdlError>;

/// Diagnostics raised by the WDL front end.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WdlError {
    /// Malformed token stream, unknown version, or a construct the active
    /// dialect doesn't allow
    #[error("Syntax error: {message}")]
    Syntax {
        pos: SourcePosition,
        message: String,
        wdl_version: String,
        declared_wdl_version: Option<String>,
    },

    /// Grammatically parseable but semantically invalid
    #[error("Validation error: {message}")]
    Validation {
        pos: SourcePosition,
        message: String,
        wdl_version: Option<String>,
        declared_wdl_version: Option<String>,
    },

    /// Type constructor arity or parameter misuse
    #[error("Invalid type: {message}")]
    InvalidType {
        pos: SourcePosition,
        message: String,
        wdl_version: Option<String>,
        declared_wdl_version: Option<String>,
    },

    /// Multiple definitions of something that must be unique
    #[error("Multiple definitions: {message}")]
    MultipleDefinitions {
        pos: SourcePosition,
        message: String,
        wdl_version: Option<String>,
        declared_wdl_version: Option<String>,
    },

    /// Invalid escape sequence in a string literal. Raised during lowering
    /// and rewritten into [`WdlError::Syntax`] before leaving the parser.
    #[error("Bad escape sequence in string literal")]
    BadCharacterEncoding { pos: SourcePosition },
}

impl WdlError {
    /// Get the source position for this error.
    pub fn pos(&self) -> &SourcePosition {
        match self {
            WdlError::Syntax { pos, .. }
            | WdlError::Validation { pos, .. }
            | WdlError::InvalidType { pos, .. }
            | WdlError::MultipleDefinitions { pos, .. }
            | WdlError::BadCharacterEncoding { pos } => pos,
        }
    }

    /// Error message without the category prefix.
    pub fn message(&self) -> String {
        match self {
            WdlError::Syntax { message, .. }
            | WdlError::Validation { message, .. }
            | WdlError::InvalidType { message, .. }
            | WdlError::MultipleDefinitions { message, .. } => message.clone(),
            WdlError::BadCharacterEncoding { .. } => self.to_string(),
        }
    }

    /// The WDL version in effect when the error was raised, if attached.
    pub fn wdl_version(&self) -> Option<&str> {
        match self {
            WdlError::Syntax { wdl_version, .. } => Some(wdl_version),
            WdlError::Validation { wdl_version, .. }
            | WdlError::InvalidType { wdl_version, .. }
            | WdlError::MultipleDefinitions { wdl_version, .. } => wdl_version.as_deref(),
            WdlError::BadCharacterEncoding { .. } => None,
        }
    }

    /// The version declared by the document, if attached.
    pub fn declared_wdl_version(&self) -> Option<&str> {
        match self {
            WdlError::Syntax {
                declared_wdl_version,
                ..
            }
            | WdlError::Validation {
                declared_wdl_version,
                ..
            }
            | WdlError::InvalidType {
                declared_wdl_version,
                ..
            }
            | WdlError::MultipleDefinitions {
                declared_wdl_version,
                ..
            } => declared_wdl_version.as_deref(),
            WdlError::BadCharacterEncoding { .. } => None,
        }
    }

    /// Create a syntax error.
    pub fn syntax_error(
        pos: SourcePosition,
        message: String,
        wdl_version: String,
        declared_wdl_version: Option<String>,
    ) -> Self {
        WdlError::Syntax {
            pos,
            message,
            wdl_version,
            declared_wdl_version,
        }
    }

    /// Create a validation error.
    pub fn validation_error(pos: SourcePosition, message: String) -> Self {
        WdlError::Validation {
            pos,
            message,
            wdl_version: None,
            declared_wdl_version: None,
        }
    }

    /// Create an invalid type error.
    pub fn invalid_type(pos: SourcePosition, message: String) -> Self {
        WdlError::InvalidType {
            pos,
            message,
            wdl_version: None,
            declared_wdl_version: None,
        }
    }

    /// Create a multiple definitions error.
    pub fn multiple_definitions(pos: SourcePosition, message: String) -> Self {
        WdlError::MultipleDefinitions {
            pos,
            message,
            wdl_version: None,
            declared_wdl_version: None,
        }
    }

    /// Attach dialect context to a validation-class error. Syntax errors
    /// already carry it and are returned unchanged.
    pub fn with_version_context(self, version: &str, declared: Option<&str>) -> Self {
        match self {
            WdlError::Validation { pos, message, .. } => WdlError::Validation {
                pos,
                message,
                wdl_version: Some(version.to_string()),
                declared_wdl_version: declared.map(str::to_string),
            },
            WdlError::InvalidType { pos, message, .. } => WdlError::InvalidType {
                pos,
                message,
                wdl_version: Some(version.to_string()),
                declared_wdl_version: declared.map(str::to_string),
            },
            WdlError::MultipleDefinitions { pos, message, .. } => WdlError::MultipleDefinitions {
                pos,
                message,
                wdl_version: Some(version.to_string()),
                declared_wdl_version: declared.map(str::to_string),
            },
            other => other,
        }
    }
}
