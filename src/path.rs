//! # JSONPath Query Module
//!
//! A JSONPath dialect for navigating and updating JSON documents, with
//! support for:
//! - Child access, wildcards, index lists, slices
//! - Recursive descent with full path tracking
//! - Filter predicates with comparison, membership, and regex operators
//! - Multi-key sorters and field extractors
//! - In-place updates at every matched location
//!
//! Compile once with [`CompiledPath::compile`], then evaluate with
//! [`CompiledPath::select`] (values), [`CompiledPath::locate`] (canonical
//! paths), [`CompiledPath::find`] (both), or mutate with
//! [`CompiledPath::update`] / [`CompiledPath::update_with`]. The free
//! functions below combine compilation and evaluation for one-shot use.
//!
//! ```rust
//! use jsonpick::path;
//! use serde_json::json;
//!
//! let doc = json!({"store": {"book": [
//!     {"title": "A", "price": 5},
//!     {"title": "B", "price": 15},
//! ]}});
//!
//! let cheap = path::search("$.store.book[?(@.price < 10)].title", &doc).unwrap();
//! assert_eq!(cheap, vec![json!("A")]);
//!
//! let locations = path::locate("$..price", &doc).unwrap();
//! assert_eq!(locations[0], "$['store']['book'][0]['price']");
//! ```

pub mod ast;
pub mod common;
mod engine;
pub mod filter;
pub mod parser;
pub(crate) mod segment;
mod update;

use serde_json::Value;

use crate::error::Error;

/// Compile an expression string into a reusable [`CompiledPath`].
///
/// Equivalent to [`CompiledPath::compile`]; provided for symmetry with the
/// one-shot helpers below.
///
/// # Errors
///
/// Returns [`Error::Syntax`] when the expression is malformed.
pub fn compile(expr: &str) -> Result<CompiledPath, Error> {
    CompiledPath::compile(expr)
}

/// Compile and evaluate in one call, returning matched values.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for a malformed expression and
/// [`Error::Type`] for a mixed-type sort.
pub fn search(expr: &str, doc: &Value) -> Result<Vec<Value>, Error> {
    CompiledPath::compile(expr)?.select(doc)
}

/// Compile and evaluate in one call, returning canonical path strings.
///
/// # Errors
///
/// Same conditions as [`search`].
pub fn locate(expr: &str, doc: &Value) -> Result<Vec<String>, Error> {
    CompiledPath::compile(expr)?.locate(doc)
}

/// Compile and update in one call, replacing every match with a copy of
/// `replacement`. Returns the number of locations updated.
///
/// # Errors
///
/// Same conditions as [`search`].
pub fn update(expr: &str, doc: &mut Value, replacement: &Value) -> Result<usize, Error> {
    CompiledPath::compile(expr)?.update(doc, replacement)
}

/// Compile and update in one call, replacing every match with
/// `transform(old)`. Returns the number of locations updated.
///
/// # Errors
///
/// Same conditions as [`search`].
pub fn update_with<F>(expr: &str, doc: &mut Value, transform: F) -> Result<usize, Error>
where
    F: FnMut(&Value) -> Value,
{
    CompiledPath::compile(expr)?.update_with(doc, transform)
}

// Re-exports
pub use ast::*;
pub use common::*;
pub use filter::{Anchor, CompareOp, FilterExpr, FilterRegex, Operand, Predicate};
pub use parser::parse_path;
