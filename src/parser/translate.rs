//! Conversion of parser-internal failures into [`WdlError`] diagnostics

use super::cst::ConcreteSyntaxError;
use super::grammar::UnknownVersion;
use crate::error::{SourcePosition, WdlError};

/// Source identity and dialect context of one parse
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub uri: &'a str,
    pub abspath: &'a str,
    pub version: &'a str,
    pub declared: Option<&'a str>,
}

impl<'a> ParseContext<'a> {
    fn declared_string(&self) -> Option<String> {
        self.declared.map(str::to_string)
    }

    /// Unregistered version, reported at a zero position
    pub fn unknown_version(&self, err: UnknownVersion) -> WdlError {
        WdlError::syntax_error(
            SourcePosition::zero(self.uri, self.abspath),
            err.to_string(),
            self.version.to_string(),
            self.declared_string(),
        )
    }

    /// Failure of the concrete parser. Missing coordinates become zero and
    /// an empty source identity becomes `fallback`.
    pub fn concrete(&self, err: ConcreteSyntaxError, fallback: &str) -> WdlError {
        let line = err.line.unwrap_or(0);
        let column = err.column.unwrap_or(0);
        let or_fallback = |s: &str| {
            if s.is_empty() {
                fallback.to_string()
            } else {
                s.to_string()
            }
        };
        let pos = SourcePosition::new(
            or_fallback(self.uri),
            or_fallback(self.abspath),
            line,
            column,
            line,
            column,
        );
        WdlError::syntax_error(
            pos,
            err.to_string(),
            self.version.to_string(),
            self.declared_string(),
        )
    }

    /// Failure raised while lowering. Bad escapes become syntax errors at
    /// the string's position; everything else gets dialect context attached.
    pub fn lowering(&self, err: WdlError) -> WdlError {
        match err {
            WdlError::BadCharacterEncoding { pos } => WdlError::syntax_error(
                pos,
                "Bad escape sequence in string literal".to_string(),
                self.version.to_string(),
                self.declared_string(),
            ),
            other => other.with_version_context(self.version, self.declared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar::lookup;
    use pretty_assertions::assert_eq;

    fn context() -> ParseContext<'static> {
        ParseContext {
            uri: "",
            abspath: "/abs/doc.wdl",
            version: "1.0",
            declared: Some("1.0"),
        }
    }

    #[test]
    fn test_unknown_version() {
        let ctx = ParseContext {
            version: "9.9",
            declared: Some("9.9"),
            ..context()
        };
        let err = ctx.unknown_version(lookup("9.9").unwrap_err());
        assert_eq!(
            err.message(),
            "unknown WDL version 9.9; choices: draft-2, 1.0, 1.1, 1.2, development"
        );
        assert_eq!(err.pos(), &SourcePosition::zero("", "/abs/doc.wdl"));
        assert_eq!(err.declared_wdl_version(), Some("9.9"));
    }

    #[test]
    fn test_concrete_error_position() {
        let err = context().concrete(
            ConcreteSyntaxError {
                line: Some(3),
                column: Some(7),
                message: "expected }, found end of input".to_string(),
            },
            "(buffer)",
        );
        assert!(matches!(err, WdlError::Syntax { .. }));
        assert_eq!(err.pos().uri, "(buffer)");
        assert_eq!(err.pos().abspath, "/abs/doc.wdl");
        assert_eq!((err.pos().line, err.pos().column), (3, 7));
        assert_eq!((err.pos().end_line, err.pos().end_column), (3, 7));
        assert_eq!(err.wdl_version(), Some("1.0"));

        let err = context().concrete(
            ConcreteSyntaxError {
                line: None,
                column: None,
                message: "boom".to_string(),
            },
            "(buffer)",
        );
        assert_eq!((err.pos().line, err.pos().column), (0, 0));
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn test_lowering_errors() {
        let pos = SourcePosition::zero("a", "b");
        let err = context().lowering(WdlError::BadCharacterEncoding { pos: pos.clone() });
        assert_eq!(err.message(), "Bad escape sequence in string literal");
        assert!(matches!(err, WdlError::Syntax { .. }));
        assert_eq!(err.pos(), &pos);

        let err = context().lowering(WdlError::multiple_definitions(pos, "dup".to_string()));
        assert_eq!(err.wdl_version(), Some("1.0"));
        assert_eq!(err.declared_wdl_version(), Some("1.0"));
    }
}
