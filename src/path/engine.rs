/*!
# Path-Tracking Evaluator

Drives a [`CompiledPath`] over a document. The working set is an ordered
list of [`Pointer`]s seeded with the document root; every step consumes
the set and produces the next one, extending each pointer's locator chain
as it narrows in. After the last step the set is projected into values
([`CompiledPath::select`]), canonical paths ([`CompiledPath::locate`]), or
kept whole ([`CompiledPath::find`]).

Navigation is forgiving by design: missing keys, out-of-range indices and
type mismatches drop candidates silently. The single evaluation error is a
sorter asked to order incompatible kinds.
*/
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

use crate::error::Error;
use crate::path::ast::{CompiledPath, ExtractKey, SortKey, Step};
use crate::path::common::{get_dotted, Locator, Pointer};
use crate::path::filter::Predicate;

impl CompiledPath {
    /// Evaluate against a document, returning every match as a value plus
    /// the locator chain that reaches it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonpick::path::CompiledPath;
    /// use serde_json::json;
    ///
    /// let doc = json!({"book": [{"price": 8.95}]});
    /// let path = CompiledPath::compile("$.book[0].price").unwrap();
    /// let found = path.find(&doc).unwrap();
    /// assert_eq!(found.len(), 1);
    /// assert_eq!(found[0].canonical_path(), "$['book'][0]['price']");
    /// assert_eq!(found[0].value.as_ref(), &json!(8.95));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Type`] when a sorter meets incomparable kinds
    /// under the same key. Navigation never errors.
    pub fn find<'a>(&self, doc: &'a Value) -> Result<Vec<Pointer<'a>>, Error> {
        let mut set = vec![Pointer {
            value: Cow::Borrowed(doc),
            path: Vec::new(),
        }];
        for step in self.steps() {
            set = apply_step(step, &set, doc)?;
        }
        Ok(set)
    }

    /// Evaluate and return the matched values, in evaluator order.
    ///
    /// The returned values are detached from the document; mutating them
    /// does not write back. Use [`CompiledPath::update`] for that.
    ///
    /// # Errors
    ///
    /// Same conditions as [`CompiledPath::find`].
    pub fn select(&self, doc: &Value) -> Result<Vec<Value>, Error> {
        Ok(self
            .find(doc)?
            .into_iter()
            .map(|ptr| ptr.value.into_owned())
            .collect())
    }

    /// Evaluate and return the canonical path string of every match.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonpick::path::CompiledPath;
    /// use serde_json::json;
    ///
    /// let doc = json!({"a": {"b": [10, 20]}});
    /// let path = CompiledPath::compile("$.a.b[*]").unwrap();
    /// assert_eq!(
    ///     path.locate(&doc).unwrap(),
    ///     vec!["$['a']['b'][0]", "$['a']['b'][1]"],
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// Same conditions as [`CompiledPath::find`].
    pub fn locate(&self, doc: &Value) -> Result<Vec<String>, Error> {
        Ok(self
            .find(doc)?
            .iter()
            .map(Pointer::canonical_path)
            .collect())
    }
}

/// Apply one step to the working set.
fn apply_step<'a>(
    step: &Step,
    set: &[Pointer<'a>],
    root: &'a Value,
) -> Result<Vec<Pointer<'a>>, Error> {
    let mut out = Vec::new();
    match step {
        Step::Root => {
            return Ok(vec![Pointer {
                value: Cow::Borrowed(root),
                path: Vec::new(),
            }]);
        }
        Step::Child(keys) => {
            for ptr in set {
                apply_child(ptr, keys, &mut out);
            }
        }
        Step::Wildcard => {
            for ptr in set {
                for locator in member_locators(ptr.value.as_ref()) {
                    push_child(ptr, locator, &mut out);
                }
            }
        }
        Step::IndexList(indices) => {
            for ptr in set {
                apply_indices(ptr, indices, &mut out);
            }
        }
        Step::Slice { start, end, step: stride } => {
            for ptr in set {
                if let Value::Array(items) = ptr.value.as_ref() {
                    for idx in slice_indices(items.len(), *start, *end, *stride) {
                        push_child(ptr, Locator::Index(idx), &mut out);
                    }
                }
            }
        }
        Step::Descent => {
            for ptr in set {
                push_descendants(ptr, &mut out);
            }
        }
        Step::Filter(predicate) => {
            for ptr in set {
                apply_filter(ptr, predicate, root, &mut out);
            }
        }
        Step::Sort(keys) => {
            for ptr in set {
                apply_sort(ptr, keys, &mut out)?;
            }
        }
        Step::Extract(keys) => {
            for ptr in set {
                apply_extract(ptr, keys, &mut out);
            }
        }
    }
    Ok(out)
}

/// Look up one locator in a value.
fn access<'v>(value: &'v Value, locator: &Locator) -> Option<&'v Value> {
    match locator {
        Locator::Key(key) => value.as_object()?.get(key),
        Locator::Index(idx) => value.as_array()?.get(*idx),
    }
}

/// Step a pointer down one locator, preserving borrowed-ness where
/// possible. Children of owned values (extractor projections) are cloned
/// out.
fn child_at<'a>(value: &Cow<'a, Value>, locator: &Locator) -> Option<Cow<'a, Value>> {
    match *value {
        Cow::Borrowed(inner) => access(inner, locator).map(Cow::Borrowed),
        Cow::Owned(ref owned) => access(owned, locator).cloned().map(Cow::Owned),
    }
}

/// Push the child at `locator`, silently skipping when it does not exist.
fn push_child<'a>(ptr: &Pointer<'a>, locator: Locator, out: &mut Vec<Pointer<'a>>) {
    if let Some(child) = child_at(&ptr.value, &locator) {
        let mut path = ptr.path.clone();
        path.push(locator);
        out.push(Pointer { value: child, path });
    }
}

/// The locators of every direct member, in document order.
fn member_locators(value: &Value) -> Vec<Locator> {
    match value {
        Value::Object(map) => map.keys().cloned().map(Locator::Key).collect(),
        Value::Array(items) => (0..items.len()).map(Locator::Index).collect(),
        _ => Vec::new(),
    }
}

fn apply_child<'a>(ptr: &Pointer<'a>, keys: &[String], out: &mut Vec<Pointer<'a>>) {
    match ptr.value.as_ref() {
        Value::Object(_) => {
            for key in keys {
                push_child(ptr, Locator::Key(key.clone()), out);
            }
        }
        // a numeric key addressing an array acts as an index
        Value::Array(_) => {
            for key in keys {
                if let Ok(idx) = key.parse::<usize>() {
                    push_child(ptr, Locator::Index(idx), out);
                }
            }
        }
        _ => {}
    }
}

fn apply_indices<'a>(ptr: &Pointer<'a>, indices: &[i64], out: &mut Vec<Pointer<'a>>) {
    let Value::Array(items) = ptr.value.as_ref() else {
        return;
    };
    let len = items.len() as i64;
    for &index in indices {
        let resolved = if index < 0 { index + len } else { index };
        if (0..len).contains(&resolved) {
            push_child(ptr, Locator::Index(resolved as usize), out);
        }
    }
}

/// Expand a pointer to itself plus all of its descendants, pre-order.
fn push_descendants<'a>(ptr: &Pointer<'a>, out: &mut Vec<Pointer<'a>>) {
    out.push(ptr.clone());
    for locator in member_locators(ptr.value.as_ref()) {
        if let Some(child) = child_at(&ptr.value, &locator) {
            let mut path = ptr.path.clone();
            path.push(locator);
            let child_ptr = Pointer { value: child, path };
            push_descendants(&child_ptr, out);
        }
    }
}

/// Element-wise filtering: arrays expand to their elements, objects are
/// tested themselves and then member-wise, scalars never match.
fn apply_filter<'a>(
    ptr: &Pointer<'a>,
    predicate: &Predicate,
    root: &Value,
    out: &mut Vec<Pointer<'a>>,
) {
    match ptr.value.as_ref() {
        Value::Array(_) => filter_members(ptr, predicate, root, out),
        Value::Object(_) => {
            if predicate.matches(ptr.value.as_ref(), root) {
                out.push(ptr.clone());
            }
            filter_members(ptr, predicate, root, out);
        }
        _ => {}
    }
}

fn filter_members<'a>(
    ptr: &Pointer<'a>,
    predicate: &Predicate,
    root: &Value,
    out: &mut Vec<Pointer<'a>>,
) {
    for locator in member_locators(ptr.value.as_ref()) {
        if let Some(child) = child_at(&ptr.value, &locator) {
            if predicate.matches(child.as_ref(), root) {
                let mut path = ptr.path.clone();
                path.push(locator);
                out.push(Pointer { value: child, path });
            }
        }
    }
}

/// The comparable form of one sort-key lookup.
enum SortValue {
    /// Key absent or null; sorts before everything present.
    Missing,
    Num(f64),
    Str(String),
    Bool(bool),
    /// Present but without an ordering (arrays and objects); comparing one
    /// against anything present is a type error.
    Unorderable(&'static str),
}

impl SortValue {
    fn kind(&self) -> Option<&'static str> {
        match self {
            Self::Missing => None,
            Self::Num(_) => Some("number"),
            Self::Str(_) => Some("string"),
            Self::Bool(_) => Some("boolean"),
            Self::Unorderable(kind) => Some(*kind),
        }
    }
}

/// Resolve one sort key against an element. Strings that parse fully as
/// finite numbers compare numerically.
fn sort_value(element: &Value, path: &[String]) -> SortValue {
    match get_dotted(element, path) {
        None | Some(Value::Null) => SortValue::Missing,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => SortValue::Num(f),
            None => SortValue::Missing,
        },
        Some(Value::String(s)) => match s.parse::<f64>() {
            Ok(f) if f.is_finite() => SortValue::Num(f),
            _ => SortValue::Str(s.clone()),
        },
        Some(Value::Bool(b)) => SortValue::Bool(*b),
        Some(Value::Array(_)) => SortValue::Unorderable("array"),
        Some(Value::Object(_)) => SortValue::Unorderable("object"),
    }
}

fn sort_cmp(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
        (SortValue::Missing, _) => Ordering::Less,
        (_, SortValue::Missing) => Ordering::Greater,
        (SortValue::Num(x), SortValue::Num(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (SortValue::Str(x), SortValue::Str(y)) => x.cmp(y),
        (SortValue::Bool(x), SortValue::Bool(y)) => x.cmp(y),
        // mixed and unorderable kinds are rejected before sorting
        _ => Ordering::Equal,
    }
}

/// Stable multi-key sort of a collection's members. Elements keep their
/// original locators; only the working-set order changes.
fn apply_sort<'a>(
    ptr: &Pointer<'a>,
    keys: &[SortKey],
    out: &mut Vec<Pointer<'a>>,
) -> Result<(), Error> {
    if !matches!(ptr.value.as_ref(), Value::Array(_) | Value::Object(_)) {
        return Ok(());
    }

    let mut entries: Vec<(Vec<SortValue>, Locator, Cow<'a, Value>)> =
        member_locators(ptr.value.as_ref())
            .into_iter()
            .filter_map(|locator| child_at(&ptr.value, &locator).map(|child| (locator, child)))
            .map(|(locator, child)| {
                let key_values = keys
                    .iter()
                    .map(|key| sort_value(child.as_ref(), &key.path))
                    .collect();
                (key_values, locator, child)
            })
            .collect();

    // reject incomparable kinds under any single key before ordering
    // anything: mixed kinds, and unorderable kinds (arrays, objects) as
    // soon as they would be compared against another present value
    for (column, key) in keys.iter().enumerate() {
        let mut seen: Option<&'static str> = None;
        for (key_values, _, _) in &entries {
            let value = &key_values[column];
            let Some(kind) = value.kind() else {
                continue;
            };
            match seen {
                None => seen = Some(kind),
                Some(prev) if prev != kind => {
                    return Err(Error::Type(format!(
                        "cannot compare {prev} and {kind} when sorting by '{}'",
                        key.path.join(".")
                    )));
                }
                Some(_) if matches!(value, SortValue::Unorderable(_)) => {
                    return Err(Error::Type(format!(
                        "cannot order {kind} values when sorting by '{}'",
                        key.path.join(".")
                    )));
                }
                Some(_) => {}
            }
        }
    }

    entries.sort_by(|a, b| {
        for (column, key) in keys.iter().enumerate() {
            let mut ord = sort_cmp(&a.0[column], &b.0[column]);
            if key.descending {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    for (_, locator, value) in entries {
        let mut path = ptr.path.clone();
        path.push(locator);
        out.push(Pointer { value, path });
    }
    Ok(())
}

/// Project an object onto the listed keys, in listed order.
fn project(value: &Value, keys: &[ExtractKey]) -> Map<String, Value> {
    let mut map = Map::new();
    for key in keys {
        if let Some(found) = get_dotted(value, &key.path) {
            map.insert(key.label.clone(), found.clone());
        }
    }
    map
}

/// Field extraction: objects are projected in place, arrays distribute the
/// projection over their object elements.
fn apply_extract<'a>(ptr: &Pointer<'a>, keys: &[ExtractKey], out: &mut Vec<Pointer<'a>>) {
    match ptr.value.as_ref() {
        Value::Object(_) => {
            out.push(Pointer {
                value: Cow::Owned(Value::Object(project(ptr.value.as_ref(), keys))),
                path: ptr.path.clone(),
            });
        }
        Value::Array(items) => {
            for (idx, element) in items.iter().enumerate() {
                if element.is_object() {
                    let mut path = ptr.path.clone();
                    path.push(Locator::Index(idx));
                    out.push(Pointer {
                        value: Cow::Owned(Value::Object(project(element, keys))),
                        path,
                    });
                }
            }
        }
        _ => {}
    }
}

/// Expand slice bounds against a concrete length, with the slice
/// semantics of the dynamic-language ecosystem: negative bounds count
/// from the end, omitted bounds default by the sign of the step, and
/// bounds inconsistent with the direction produce nothing.
fn slice_indices(len: usize, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Vec<usize> {
    let step = step.unwrap_or(1);
    if step == 0 {
        // rejected at compile time; unreachable through the parser
        return Vec::new();
    }

    let len = len as i64;
    let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };

    let start = match start {
        Some(s) => {
            let s = if s < 0 { s + len } else { s };
            s.clamp(lower, upper)
        }
        None => {
            if step < 0 {
                upper
            } else {
                lower
            }
        }
    };
    let stop = match end {
        Some(e) => {
            let e = if e < 0 { e + len } else { e };
            e.clamp(lower, upper)
        }
        None => {
            if step < 0 {
                lower
            } else {
                upper
            }
        }
    };

    let mut indices = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        indices.push(i as usize);
        i += step;
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(expr: &str) -> CompiledPath {
        CompiledPath::compile(expr).expect("path should compile")
    }

    fn select(expr: &str, doc: &Value) -> Vec<Value> {
        path(expr).select(doc).expect("evaluation should succeed")
    }

    fn locate(expr: &str, doc: &Value) -> Vec<String> {
        path(expr).locate(doc).expect("evaluation should succeed")
    }

    /// The bookstore document the reference scenarios run against.
    fn bookstore() -> Value {
        json!({
            "a.b c": "a.b c",
            "book": [
                {
                    "category": "reference",
                    "author": "Nigel Rees",
                    "title": "Sayings of the Century",
                    "price": 8.95,
                    "brand": {"version": "v1.0.0"}
                },
                {
                    "category": "fiction",
                    "author": "Evelyn Waugh",
                    "title": "Sword of Honour",
                    "price": 12.99,
                    "brand": {"version": "v0.0.1"}
                },
                {
                    "category": "fiction",
                    "author": "Herman Melville",
                    "title": "Moby Dick",
                    "isbn": "0-553-21311-3",
                    "price": 8.99,
                    "brand": {"version": "v1.0.2"}
                },
                {
                    "category": "fiction",
                    "author": "J. R. R. Tolkien",
                    "title": "The Lord of the Rings",
                    "isbn": "0-395-19395-8",
                    "price": 22.99,
                    "brand": {"version": "v1.0.3"}
                }
            ],
            "bicycle": {"color": "red", "price": 19.95},
            "scores": {
                "math": {"score": 100},
                "english": {"score": 95},
                "physic": {"score": 90},
                "chemistry": {"score": 85},
                "chinese": {"score": 60}
            }
        })
    }

    #[test]
    fn root_matches_whole_document() {
        let doc = json!({"a": 1});
        assert_eq!(select("$", &doc), vec![doc.clone()]);
        assert_eq!(locate("$", &doc), vec!["$"]);
    }

    #[test]
    fn child_navigation() {
        let doc = bookstore();
        assert_eq!(select("$.bicycle.color", &doc), vec![json!("red")]);
        assert_eq!(select("$['bicycle']['color']", &doc), vec![json!("red")]);
        assert_eq!(select("$['a.b c']", &doc), vec![json!("a.b c")]);
        assert_eq!(select("$.'a.b c'", &doc), vec![json!("a.b c")]);
    }

    #[test]
    fn child_key_list_in_listed_order() {
        let doc = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(select("$[b,a]", &doc), vec![json!(2), json!(1)]);
    }

    #[test]
    fn numeric_key_indexes_arrays() {
        let doc = json!({"items": [10, 20]});
        assert_eq!(select("$.items.1", &doc), vec![json!(20)]);
    }

    #[test]
    fn missing_keys_are_silent() {
        let doc = json!({"a": 1});
        assert!(select("$.b", &doc).is_empty());
        assert!(select("$.a.b.c", &doc).is_empty());
        assert!(select("$.a[0]", &doc).is_empty());
    }

    #[test]
    fn wildcard_preserves_insertion_order() {
        let doc = bookstore();
        assert_eq!(
            locate("$.*", &doc),
            vec!["$['a.b c']", "$['book']", "$['bicycle']", "$['scores']"]
        );
    }

    #[test]
    fn index_lists_wrap_and_skip() {
        let doc = json!({"items": [0, 1, 2, 3]});
        assert_eq!(select("$.items[1]", &doc), vec![json!(1)]);
        assert_eq!(select("$.items[-1]", &doc), vec![json!(3)]);
        assert_eq!(
            select("$.items[0,2,-1]", &doc),
            vec![json!(0), json!(2), json!(3)]
        );
        assert!(select("$.items[9]", &doc).is_empty());
        assert!(select("$.items[-9]", &doc).is_empty());
    }

    #[test]
    fn slice_semantics() {
        let doc = json!({"items": [0, 1, 2, 3, 4]});
        assert_eq!(select("$.items[1:3]", &doc), vec![json!(1), json!(2)]);
        assert_eq!(
            select("$.items[2:]", &doc),
            vec![json!(2), json!(3), json!(4)]
        );
        assert_eq!(
            select("$.items[:3]", &doc),
            vec![json!(0), json!(1), json!(2)]
        );
        assert_eq!(
            select("$.items[1:-1]", &doc),
            vec![json!(1), json!(2), json!(3)]
        );
        assert_eq!(
            select("$.items[::2]", &doc),
            vec![json!(0), json!(2), json!(4)]
        );
        assert_eq!(select("$.items[0:-1:2]", &doc), vec![json!(0), json!(2)]);
        assert!(select("$.items[-1:1]", &doc).is_empty());
        assert!(select("$.items[-1:-11:3]", &doc).is_empty());
        assert_eq!(
            select("$.items[::-1]", &doc),
            vec![json!(4), json!(3), json!(2), json!(1), json!(0)]
        );
    }

    #[test]
    fn recursive_descent_is_preorder() {
        let doc = bookstore();
        assert_eq!(
            select("$..price", &doc),
            vec![
                json!(8.95),
                json!(12.99),
                json!(8.99),
                json!(22.99),
                json!(19.95)
            ]
        );
        assert_eq!(
            locate("$..price", &doc),
            vec![
                "$['book'][0]['price']",
                "$['book'][1]['price']",
                "$['book'][2]['price']",
                "$['book'][3]['price']",
                "$['bicycle']['price']"
            ]
        );
    }

    #[test]
    fn descent_with_bracket_step() {
        let doc = json!({"a": {"store": "book"}, "b": {"store": "paper"}});
        assert_eq!(
            select("$..['store']", &doc),
            vec![json!("book"), json!("paper")]
        );
    }

    #[test]
    fn filter_expands_array_elements() {
        let doc = bookstore();
        assert_eq!(
            select("$.book[?(@.price>8 and @.price<9)].price", &doc),
            vec![json!(8.95), json!(8.99)]
        );
        assert_eq!(
            locate("$.book[?(@.price>8 and @.price<9)].price", &doc),
            vec!["$['book'][0]['price']", "$['book'][2]['price']"]
        );
    }

    #[test]
    fn filter_tests_object_and_members() {
        // the object's members are candidates too
        let doc = json!({"item": {"price": 10, "name": "test"}});
        assert_eq!(
            select("$[?(@.price > 5)]", &doc),
            vec![json!({"price": 10, "name": "test"})]
        );
        // and the object itself is a candidate
        let doc = json!({"price": 10, "item": {"other": 1}});
        assert_eq!(select("$[?(@.price > 5)]", &doc), vec![doc.clone()]);
    }

    #[test]
    fn filter_skips_scalars() {
        let doc = json!({"v": 5});
        assert!(select("$.v[?(@ > 1)]", &doc).is_empty());
    }

    #[test]
    fn filter_with_root_reference() {
        let doc = json!({"limit": 10, "items": [{"v": 5}, {"v": 50}]});
        assert_eq!(
            select("$.items[?(@.v < $.limit)].v", &doc),
            vec![json!(5)]
        );
    }

    #[test]
    fn sort_ascending_keeps_original_paths() {
        let doc = bookstore();
        assert_eq!(
            select("$.book[/(price)].price", &doc),
            vec![json!(8.95), json!(8.99), json!(12.99), json!(22.99)]
        );
        assert_eq!(
            locate("$.book[/(price)].price", &doc),
            vec![
                "$['book'][0]['price']",
                "$['book'][2]['price']",
                "$['book'][1]['price']",
                "$['book'][3]['price']"
            ]
        );
    }

    #[test]
    fn sort_descending() {
        let doc = bookstore();
        assert_eq!(
            select("$.book[/(~price)].price", &doc),
            vec![json!(22.99), json!(12.99), json!(8.99), json!(8.95)]
        );
    }

    #[test]
    fn sort_multi_key() {
        let doc = bookstore();
        assert_eq!(
            select("$.book[/(category,price)].price", &doc),
            vec![json!(8.99), json!(12.99), json!(22.99), json!(8.95)]
        );
    }

    #[test]
    fn sort_nested_key() {
        let doc = bookstore();
        assert_eq!(
            select("$.book[/(brand.version)].brand.version", &doc),
            vec![
                json!("v0.0.1"),
                json!("v1.0.0"),
                json!("v1.0.2"),
                json!("v1.0.3")
            ]
        );
    }

    #[test]
    fn sort_object_members() {
        let doc = bookstore();
        assert_eq!(
            select("$.scores[/(score)].score", &doc),
            vec![json!(60), json!(85), json!(90), json!(95), json!(100)]
        );
        assert_eq!(
            locate("$.scores[/(score)].score", &doc),
            vec![
                "$['scores']['chinese']['score']",
                "$['scores']['chemistry']['score']",
                "$['scores']['physic']['score']",
                "$['scores']['english']['score']",
                "$['scores']['math']['score']"
            ]
        );
    }

    #[test]
    fn sort_numeric_strings_numerically() {
        let doc = json!([{"v": "10"}, {"v": "2"}]);
        assert_eq!(
            select("$[/(v)].v", &doc),
            vec![json!("2"), json!("10")]
        );
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let doc = json!({"items": [
            {"k": 1, "tag": "first"},
            {"k": 0, "tag": "second"},
            {"k": 1, "tag": "third"},
            {"k": 1, "tag": "fourth"}
        ]});
        assert_eq!(
            select("$.items[/(k)].tag", &doc),
            vec![
                json!("second"),
                json!("first"),
                json!("third"),
                json!("fourth")
            ]
        );
    }

    #[test]
    fn sort_missing_keys_come_first() {
        let doc = json!([{"v": 2}, {}, {"v": 1}]);
        assert_eq!(
            locate("$[/(v)]", &doc),
            vec!["$[1]", "$[2]", "$[0]"]
        );
    }

    #[test]
    fn sort_mixed_kinds_is_a_type_error() {
        let doc = json!([{"v": "abc"}, {"v": 1}]);
        let err = path("$[/(v)]").select(&doc).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn sort_array_and_object_keys_are_a_type_error() {
        // against another kind
        let doc = json!([{"v": [1]}, {"v": 1}]);
        let err = path("$[/(v)]").select(&doc).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
        // and against each other
        let doc = json!([{"v": [1]}, {"v": [2]}]);
        let err = path("$[/(v)]").select(&doc).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
        let doc = json!([{"v": {"a": 1}}, {"v": {"a": 2}}]);
        let err = path("$[/(v)]").select(&doc).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn sort_on_scalar_is_silent() {
        let doc = json!({"value": "string"});
        assert!(select("$.value[/(x)]", &doc).is_empty());
    }

    #[test]
    fn extract_projects_objects() {
        let doc = bookstore();
        assert_eq!(
            select("$.book[*].(title)", &doc),
            vec![
                json!({"title": "Sayings of the Century"}),
                json!({"title": "Sword of Honour"}),
                json!({"title": "Moby Dick"}),
                json!({"title": "The Lord of the Rings"})
            ]
        );
    }

    #[test]
    fn extract_nested_keys_use_dotted_labels() {
        let doc = json!({"item": {"x": {"y": 1}, "a": 2}});
        assert_eq!(
            select("$.item.(a,x.y)", &doc),
            vec![json!({"a": 2, "x.y": 1})]
        );
    }

    #[test]
    fn extract_missing_fields_are_omitted() {
        let doc = json!({"item": {"a": 1}});
        assert_eq!(select("$.item.(a,b)", &doc), vec![json!({"a": 1})]);
    }

    #[test]
    fn extract_distributes_over_arrays() {
        let doc = json!({"items": [{"a": 1, "b": 2}, {"a": 3, "b": 4}]});
        assert_eq!(
            select("$.items.(a)", &doc),
            vec![json!({"a": 1}), json!({"a": 3})]
        );
    }

    #[test]
    fn extract_on_scalar_is_silent() {
        let doc = json!({"items": [1, 2, 3]});
        assert!(select("$.items[0].(a,b)", &doc).is_empty());
    }

    #[test]
    fn sort_then_extract() {
        let doc = bookstore();
        assert_eq!(
            select("$.book[/(category,price)].(title,price)", &doc),
            vec![
                json!({"title": "Moby Dick", "price": 8.99}),
                json!({"title": "Sword of Honour", "price": 12.99}),
                json!({"title": "The Lord of the Rings", "price": 22.99}),
                json!({"title": "Sayings of the Century", "price": 8.95})
            ]
        );
    }

    #[test]
    fn paths_round_trip_to_the_same_value() {
        let doc = bookstore();
        for expr in [
            "$..price",
            "$.book[?(@.price>8 and @.price<9)].price",
            "$.book[/(~price)].title",
            "$.book[0:-1:2]",
            "$['a.b c']",
            "$.scores[/(score)].score",
        ] {
            let found = path(expr).find(&doc).unwrap();
            assert!(!found.is_empty(), "no matches for {expr}");
            for ptr in found {
                let reparsed = path(&ptr.canonical_path()).select(&doc).unwrap();
                assert_eq!(reparsed, vec![ptr.value.into_owned()], "{expr}");
            }
        }
    }

    #[test]
    fn slice_index_arithmetic() {
        assert_eq!(slice_indices(5, Some(1), Some(3), None), vec![1, 2]);
        assert_eq!(slice_indices(5, None, None, Some(-1)), vec![4, 3, 2, 1, 0]);
        assert_eq!(slice_indices(5, Some(-2), None, None), vec![3, 4]);
        assert_eq!(slice_indices(5, Some(3), Some(100), None), vec![3, 4]);
        assert!(slice_indices(0, None, None, None).is_empty());
        assert!(slice_indices(5, Some(-1), Some(1), None).is_empty());
    }
}
