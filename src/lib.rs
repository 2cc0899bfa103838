//! # flowy-parse
//!
//! Workflow Description Language (WDL) front end: parses expressions, task
//! lists, declarations and whole documents in any supported WDL version into
//! a typed AST, with validation and precise diagnostics.
//!
//! ```
//! let doc = flowy_parse::parse_document(
//!     "version 1.0\nworkflow hello { call greet }",
//!     None,
//!     "hello.wdl",
//!     "/work/hello.wdl",
//! )
//! .unwrap();
//! assert_eq!(doc.workflow.unwrap().name, "hello");
//! ```

pub mod config;
pub mod error;
pub mod expr;
pub mod lower;
pub mod parser;
pub mod tree;
pub mod types;

pub use config::{load_config, save_config, ParserConfig};
pub use error::{ParseResult, SourcePosition, WdlError};
pub use expr::{Expression, Placeholder, StringPart, StringQuote, TaskCommand};
pub use parser::grammar::VERSIONS;
pub use parser::{parse_bound_declaration, parse_document, parse_expression, parse_tasks, Parser};
pub use tree::{
    Call, Conditional, Declaration, DocImport, Document, Scatter, SourceComment, StructTypeDef,
    Task, Workflow, WorkflowElement,
};
pub use types::Type;
