/*!
# Shared Types

This module contains the shared result types of the query engine: the
locator atoms that address a position inside a document, and the pointer
type pairing a matched value with the locator chain that reaches it.
*/
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// One atomic locator within a document: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// An object member key, e.g. the `book` in `$['book']`.
    Key(String),
    /// An array element index, e.g. the `3` in `$['book'][3]`.
    Index(usize),
}

/// A pointer to a value matched during evaluation.
///
/// The locator chain always addresses the match's position in the original
/// document; walking it from the root re-selects the value. Values stay
/// borrowed while navigating; projecting steps (the field extractor) hand
/// back owned values instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Pointer<'a> {
    /// The matched value.
    pub value: Cow<'a, Value>,
    /// Locators from the document root to the value.
    pub path: Vec<Locator>,
}

impl Pointer<'_> {
    /// Render the canonical path string for this match: `$` followed by
    /// one `['key']` or `[index]` per locator. Keys are always
    /// single-quoted with `'` and `\` escaped, so the result is itself a
    /// valid expression that re-selects the value.
    #[must_use]
    pub fn canonical_path(&self) -> String {
        let mut out = String::from("$");
        for locator in &self.path {
            match locator {
                Locator::Key(key) => {
                    out.push_str("['");
                    for c in key.chars() {
                        match c {
                            '\'' => out.push_str("\\'"),
                            '\\' => out.push_str("\\\\"),
                            _ => out.push(c),
                        }
                    }
                    out.push_str("']");
                }
                Locator::Index(idx) => {
                    out.push('[');
                    out.push_str(&idx.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for Pointer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.canonical_path(), self.value)
    }
}

/// Walk a locator chain from a value, returning the addressed descendant.
/// Used by the evaluator, by filter sub-paths (`@.x.y` re-enters the same
/// navigation), and by the updater when resolving parents.
pub(crate) fn walk<'a>(value: &'a Value, locators: &[Locator]) -> Option<&'a Value> {
    let mut current = value;
    for locator in locators {
        current = match locator {
            Locator::Key(key) => current.as_object()?.get(key)?,
            Locator::Index(idx) => current.as_array()?.get(*idx)?,
        };
    }
    Some(current)
}

/// Resolve a dotted key path (`brand.version`) against a value, descending
/// through object members only. Sorter and extractor keys use this form.
pub(crate) fn get_dotted<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}
