/*!
# Path AST and Builder

Defines the compiled representation of a JSONPath expression and exposes a
fluent API for constructing expressions using a builder pattern.

# Examples

Expressions are usually compiled from strings:

```rust
use jsonpick::path::CompiledPath;
let path: CompiledPath = "$.book[0].price".parse().expect("invalid path");
assert_eq!(path.to_string(), "$.book[0].price");
```

The builder produces the same compiled form programmatically:

```rust
use jsonpick::path::{CompiledPath, PathBuilder};
let built = PathBuilder::new().child("book").index(0).child("price").build();
let parsed = CompiledPath::compile("$.book[0].price").unwrap();
assert_eq!(built, parsed);
```
*/
use std::fmt::{self, Display, Write};
use std::str::FromStr;

use crate::error::Error;
use crate::path::filter::Predicate;
use crate::path::parser::parse_path;

/// One navigation step of a compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The document root; always the first step, exactly once.
    Root,
    /// Child access by one or more keys, e.g. `.name` or `['a','b']`. On an
    /// array a key consisting of digits acts as an index.
    Child(Vec<String>),
    /// All children of an object or all elements of an array.
    Wildcard,
    /// Recursive descent: the following step applies at the current value
    /// and at every descendant, in pre-order.
    Descent,
    /// An array slice `[start:end:step]` with the slice semantics of the
    /// dynamic-language ecosystem: negative bounds count from the end and
    /// omitted bounds default by the sign of the step.
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    /// One or more explicit array indices; negatives wrap from the end.
    IndexList(Vec<i64>),
    /// A filter predicate `[?( ... )]` applied element-wise.
    Filter(Predicate),
    /// A sorter `[/(k1,~k2)]` reordering elements by the listed keys.
    Sort(Vec<SortKey>),
    /// A field extractor `(f1,f2)` projecting objects onto the listed keys.
    Extract(Vec<ExtractKey>),
}

/// One key of a sorter: a dotted sub-path and its direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Key components, e.g. `brand.version` splits to `["brand", "version"]`.
    pub path: Vec<String>,
    /// Descending order, from the `~` prefix.
    pub descending: bool,
}

/// One key of a field extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractKey {
    /// The label used in the projected object: the key text as written,
    /// including dots for nested lookups (`brand.version`).
    pub label: String,
    /// The dotted components resolved against each object.
    pub path: Vec<String>,
}

/// A compiled, immutable JSONPath expression: an ordered sequence of
/// [`Step`]s plus the source text it was compiled from. Safe to share
/// across threads for read-only evaluation.
#[derive(Debug, Clone)]
pub struct CompiledPath {
    steps: Vec<Step>,
    source: String,
}

impl CompiledPath {
    /// Compile an expression string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] describing how compilation failed,
    /// including the byte offset where applicable.
    pub fn compile(expr: &str) -> Result<Self, Error> {
        parse_path(expr)
    }

    pub(crate) fn from_parts(steps: Vec<Step>, source: String) -> Self {
        Self { steps, source }
    }

    /// The compiled steps, starting with [`Step::Root`].
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The expression text this path was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

// Equality is over the compiled steps: two paths written differently but
// compiling to the same steps are interchangeable for evaluation.
impl PartialEq for CompiledPath {
    fn eq(&self, other: &Self) -> bool {
        self.steps == other.steps
    }
}

impl Display for CompiledPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl FromStr for CompiledPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

/// Returns `true` if a key cannot appear unquoted in an expression.
fn needs_quoting(key: &str) -> bool {
    key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Write a key the way an expression would spell it: bare when safe,
/// single-quoted with `'` and `\` escaped otherwise.
fn write_key(out: &mut String, key: &str) {
    if !needs_quoting(key) {
        out.push_str(key);
        return;
    }
    out.push('\'');
    for c in key.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('\'');
}

/// Render a step sequence back to expression text. Used by the builder to
/// synthesise the `source` of a programmatically constructed path.
pub(crate) fn render_steps(steps: &[Step]) -> String {
    let mut out = String::new();
    let mut after_descent = false;
    for step in steps {
        match step {
            Step::Root => out.push('$'),
            Step::Descent => {
                out.push_str("..");
                after_descent = true;
                continue;
            }
            Step::Child(keys) if keys.len() == 1 && !needs_quoting(&keys[0]) => {
                if !after_descent {
                    out.push('.');
                }
                out.push_str(&keys[0]);
            }
            Step::Child(keys) => {
                out.push('[');
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_key(&mut out, key);
                }
                out.push(']');
            }
            Step::Wildcard => out.push_str("[*]"),
            Step::Slice { start, end, step } => {
                out.push('[');
                if let Some(s) = start {
                    let _ = write!(out, "{s}");
                }
                out.push(':');
                if let Some(e) = end {
                    let _ = write!(out, "{e}");
                }
                if let Some(t) = step {
                    let _ = write!(out, ":{t}");
                }
                out.push(']');
            }
            Step::IndexList(indices) => {
                out.push('[');
                for (i, idx) in indices.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{idx}");
                }
                out.push(']');
            }
            Step::Filter(predicate) => {
                let _ = write!(out, "[?({predicate})]");
            }
            Step::Sort(keys) => {
                out.push_str("[/(");
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    if key.descending {
                        out.push('~');
                    }
                    out.push_str(&key.path.join("."));
                }
                out.push_str(")]");
            }
            Step::Extract(keys) => {
                out.push_str("[(");
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&key.label);
                }
                out.push_str(")]");
            }
        }
        after_descent = false;
    }
    out
}

/// Builder for constructing compiled paths without going through the
/// string syntax.
pub struct PathBuilder {
    steps: Vec<Step>,
}

impl PathBuilder {
    /// Creates a builder holding only the root step.
    ///
    /// # Examples
    /// ```
    /// use jsonpick::path::PathBuilder;
    /// let path = PathBuilder::new().build();
    /// assert_eq!(path.to_string(), "$");
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: vec![Step::Root],
        }
    }

    /// Adds a child access by key.
    ///
    /// # Examples
    /// ```
    /// use jsonpick::path::PathBuilder;
    /// let path = PathBuilder::new().child("store").child("a b").build();
    /// assert_eq!(path.to_string(), "$.store['a b']");
    /// ```
    #[must_use]
    pub fn child(mut self, key: &str) -> Self {
        self.steps.push(Step::Child(vec![key.to_string()]));
        self
    }

    /// Adds a child access selecting several keys at once.
    #[must_use]
    pub fn children(mut self, keys: &[&str]) -> Self {
        self.steps
            .push(Step::Child(keys.iter().map(|k| (*k).to_string()).collect()));
        self
    }

    /// Adds an array index access; negative indices count from the end.
    ///
    /// # Examples
    /// ```
    /// use jsonpick::path::PathBuilder;
    /// let path = PathBuilder::new().child("book").index(-1).build();
    /// assert_eq!(path.to_string(), "$.book[-1]");
    /// ```
    #[must_use]
    pub fn index(mut self, index: i64) -> Self {
        self.steps.push(Step::IndexList(vec![index]));
        self
    }

    /// Adds an array slice.
    ///
    /// # Examples
    /// ```
    /// use jsonpick::path::PathBuilder;
    /// let path = PathBuilder::new().child("book").slice(Some(0), Some(-1), Some(2)).build();
    /// assert_eq!(path.to_string(), "$.book[0:-1:2]");
    /// ```
    #[must_use]
    pub fn slice(mut self, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Self {
        self.steps.push(Step::Slice { start, end, step });
        self
    }

    /// Adds a wildcard over all children or elements.
    #[must_use]
    pub fn wildcard(mut self) -> Self {
        self.steps.push(Step::Wildcard);
        self
    }

    /// Adds a recursive descent. The next step added applies at every
    /// descendant; with no following step the path selects all
    /// descendants.
    #[must_use]
    pub fn descent(mut self) -> Self {
        self.steps.push(Step::Descent);
        self
    }

    /// Adds a sorter key; dots in `key` descend into nested objects.
    ///
    /// # Examples
    /// ```
    /// use jsonpick::path::PathBuilder;
    /// let path = PathBuilder::new().child("book").sort_by(&["~price"]).build();
    /// assert_eq!(path.to_string(), "$.book[/(~price)]");
    /// ```
    #[must_use]
    pub fn sort_by(mut self, keys: &[&str]) -> Self {
        let keys = keys
            .iter()
            .map(|key| {
                let (descending, text) = match key.strip_prefix('~') {
                    Some(rest) => (true, rest),
                    None => (false, *key),
                };
                SortKey {
                    path: text.split('.').map(str::to_string).collect(),
                    descending,
                }
            })
            .collect();
        self.steps.push(Step::Sort(keys));
        self
    }

    /// Adds a field extractor over the listed keys.
    #[must_use]
    pub fn extract(mut self, keys: &[&str]) -> Self {
        let keys = keys
            .iter()
            .map(|key| ExtractKey {
                label: (*key).to_string(),
                path: key.split('.').map(str::to_string).collect(),
            })
            .collect();
        self.steps.push(Step::Extract(keys));
        self
    }

    /// Return the built path as a [`CompiledPath`].
    #[must_use]
    pub fn build(self) -> CompiledPath {
        let source = render_steps(&self.steps);
        CompiledPath::from_parts(self.steps, source)
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_matches_compiled_form() {
        let built = PathBuilder::new()
            .child("book")
            .slice(Some(1), None, None)
            .wildcard()
            .build();
        let parsed = CompiledPath::compile("$.book[1:][*]").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn builder_renders_descent_without_separator() {
        let built = PathBuilder::new().descent().child("price").build();
        assert_eq!(built.to_string(), "$..price");
        assert_eq!(built, CompiledPath::compile("$..price").unwrap());
    }

    #[test]
    fn builder_quotes_awkward_keys() {
        let built = PathBuilder::new().child("a.b c").build();
        assert_eq!(built.to_string(), "$['a.b c']");
        assert_eq!(built, CompiledPath::compile("$['a.b c']").unwrap());
    }

    #[test]
    fn builder_sort_and_extract_round_trip() {
        let built = PathBuilder::new()
            .child("book")
            .sort_by(&["category", "~price"])
            .extract(&["title", "brand.version"])
            .build();
        let parsed = CompiledPath::compile("$.book[/(category,~price)][(title,brand.version)]")
            .unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn display_preserves_source() {
        let source = "$.book[?(@.price > 8)].title";
        let path = CompiledPath::compile(source).unwrap();
        assert_eq!(path.to_string(), source);
    }

    #[test]
    fn equality_ignores_spelling() {
        let dotted = CompiledPath::compile("$.store.book").unwrap();
        let bracketed = CompiledPath::compile("$['store']['book']").unwrap();
        assert_eq!(dotted, bracketed);
    }
}
