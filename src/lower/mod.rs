//! Lowering of concrete syntax trees into the AST.
//!
//! Every step returns a [`crate::error::ParseResult`] and stops at the first
//! violation. Expressions are handled by [`ExprLowerer`]; everything that can
//! contain a declaration goes through [`DocLowerer`], which also applies the
//! dialect's keyword checks.

pub mod document;
pub mod expr;

pub use document::DocLowerer;
pub use expr::ExprLowerer;
