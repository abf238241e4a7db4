/*!
# Filter Predicate Language

Parser and evaluator for the boolean predicate language inside
`[?( ... )]` segments: comparisons, membership tests, regex matches,
logical connectives, and sub-path references rooted at `@` (the candidate
element) or `$` (the document root).

Predicates are compiled once, together with the enclosing expression;
regex literals are compiled to [`regex::Regex`] at that point so that
evaluation never pays a recompilation. Evaluation itself never fails:
absent values and type mismatches follow fixed falsy rules.

## Examples

```rust
use jsonpick::path::CompiledPath;
use serde_json::json;

let path = CompiledPath::compile("$.book[?(@.price > 8 and @.price < 9)].title").unwrap();
let doc = json!({"book": [
    {"title": "A", "price": 8.95},
    {"title": "B", "price": 12.99},
]});
assert_eq!(path.select(&doc).unwrap(), vec![json!("A")]);
```
*/
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::error::Error;
use crate::path::common::{walk, Locator};
use crate::path::parser::unescape;

/// Parser for turning raw predicate bodies into [`FilterExpr`] trees.
#[derive(Parser)]
#[grammar = "path/grammar/filter.pest"]
struct FilterParser;

/// A compiled filter predicate: the original body text plus its expression
/// tree with pre-compiled regexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    raw: String,
    expr: FilterExpr,
}

impl Predicate {
    /// The predicate body as written inside `[?( ... )]`.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Evaluate the predicate against a candidate element. `root` backs
    /// `$`-anchored sub-paths.
    #[must_use]
    pub fn matches(&self, current: &Value, root: &Value) -> bool {
        eval_expr(&self.expr, current, root)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// The predicate expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Logical disjunction; true if any branch is true.
    Or(Vec<FilterExpr>),
    /// Logical conjunction; true if every branch is true.
    And(Vec<FilterExpr>),
    /// Logical negation.
    Not(Box<FilterExpr>),
    /// A two-operand comparison.
    Compare {
        lhs: Operand,
        op: CompareOp,
        rhs: Operand,
    },
    /// A bare operand tested for truthiness, e.g. `[?(@.isbn)]`.
    Truthy(Operand),
}

/// Comparison operators of the predicate language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    /// `=~`, regex match; the right operand must be a regex literal.
    Match,
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal value: number, string, boolean, or null.
    Literal(Value),
    /// A pre-compiled `/pattern/flags` literal.
    Regex(FilterRegex),
    /// A sub-path producing at most one value, or absent.
    Path {
        anchor: Anchor,
        locators: Vec<Locator>,
    },
    /// `len(...)`: element count of a string, array, or object.
    Length(Box<Operand>),
}

/// Where a sub-path starts resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// `@`, the candidate element under test.
    Current,
    /// `$`, the document root.
    Root,
}

/// A regex literal compiled at expression-compile time.
#[derive(Debug, Clone)]
pub struct FilterRegex {
    literal: String,
    regex: Regex,
}

impl FilterRegex {
    fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

impl PartialEq for FilterRegex {
    fn eq(&self, other: &Self) -> bool {
        self.literal == other.literal
    }
}

impl fmt::Display for FilterRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal)
    }
}

/// Compile a predicate body (the text between `?(` and `)`).
///
/// # Errors
///
/// Returns [`Error::Syntax`] for malformed predicates, uncompilable or
/// misplaced regex literals, and unsupported regex flags. `offset` is the
/// byte offset of the enclosing segment within the full expression.
pub(crate) fn compile_predicate(body: &str, offset: usize) -> Result<Predicate, Error> {
    let mut pairs = FilterParser::parse(Rule::predicate, body)
        .map_err(|e| Error::syntax_at(format!("invalid filter expression: {e}"), offset))?;

    let predicate = pairs.next().expect("predicate rule always present");
    let disjunction = predicate
        .into_inner()
        .find(|p| p.as_rule() == Rule::disjunction)
        .ok_or_else(|| Error::syntax_at("empty filter expression", offset))?;

    let expr = parse_disjunction(disjunction, offset)?;
    Ok(Predicate {
        raw: body.to_string(),
        expr,
    })
}

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

fn parse_disjunction(pair: Pair<'_>, offset: usize) -> Result<FilterExpr, Error> {
    let mut terms = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::conjunction)
        .map(|p| parse_conjunction(p, offset))
        .collect::<Result<Vec<_>, _>>()?;

    if terms.len() == 1 {
        Ok(terms.remove(0))
    } else {
        Ok(FilterExpr::Or(terms))
    }
}

fn parse_conjunction(pair: Pair<'_>, offset: usize) -> Result<FilterExpr, Error> {
    let mut terms = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::negation)
        .map(|p| parse_negation(p, offset))
        .collect::<Result<Vec<_>, _>>()?;

    if terms.len() == 1 {
        Ok(terms.remove(0))
    } else {
        Ok(FilterExpr::And(terms))
    }
}

fn parse_negation(pair: Pair<'_>, offset: usize) -> Result<FilterExpr, Error> {
    let mut negations = 0;
    let mut term = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::not_op => negations += 1,
            Rule::term => term = Some(inner),
            _ => {}
        }
    }

    let term = term.ok_or_else(|| Error::syntax_at("expected a filter term", offset))?;
    let mut expr = parse_term(term, offset)?;
    for _ in 0..negations {
        expr = FilterExpr::Not(Box::new(expr));
    }
    Ok(expr)
}

fn parse_term(pair: Pair<'_>, offset: usize) -> Result<FilterExpr, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| Error::syntax_at("expected a filter term", offset))?;
    match inner.as_rule() {
        Rule::comparison => parse_comparison(inner, offset),
        Rule::group => {
            let disjunction = inner
                .into_inner()
                .next()
                .ok_or_else(|| Error::syntax_at("empty group", offset))?;
            parse_disjunction(disjunction, offset)
        }
        rule => Err(Error::syntax_at(
            format!("unexpected filter term: {rule:?}"),
            offset,
        )),
    }
}

fn parse_comparison(pair: Pair<'_>, offset: usize) -> Result<FilterExpr, Error> {
    let mut inner = pair.into_inner();
    let lhs = parse_operand(
        inner
            .next()
            .ok_or_else(|| Error::syntax_at("expected an operand", offset))?,
        offset,
    )?;

    let Some(op_pair) = inner.next() else {
        if matches!(lhs, Operand::Regex(_)) {
            return Err(Error::syntax_at(
                "a regex literal cannot stand alone; use '=~'",
                offset,
            ));
        }
        return Ok(FilterExpr::Truthy(lhs));
    };

    let op = parse_comp_op(&op_pair, offset)?;
    let rhs = parse_operand(
        inner
            .next()
            .ok_or_else(|| Error::syntax_at("expected a right-hand operand", offset))?,
        offset,
    )?;

    if op == CompareOp::Match {
        if !matches!(rhs, Operand::Regex(_)) {
            return Err(Error::syntax_at(
                "the right-hand side of '=~' must be a regex literal",
                offset,
            ));
        }
        if matches!(lhs, Operand::Regex(_)) {
            return Err(Error::syntax_at(
                "the left-hand side of '=~' must produce a string",
                offset,
            ));
        }
    } else if matches!(lhs, Operand::Regex(_)) || matches!(rhs, Operand::Regex(_)) {
        return Err(Error::syntax_at(
            "regex literals are only valid with the '=~' operator",
            offset,
        ));
    }

    Ok(FilterExpr::Compare { lhs, op, rhs })
}

fn parse_comp_op(pair: &Pair<'_>, offset: usize) -> Result<CompareOp, Error> {
    let inner = pair
        .clone()
        .into_inner()
        .next()
        .ok_or_else(|| Error::syntax_at("expected a comparison operator", offset))?;
    Ok(match inner.as_rule() {
        Rule::eq_op => CompareOp::Eq,
        Rule::ne_op => CompareOp::Ne,
        Rule::le_op => CompareOp::Le,
        Rule::ge_op => CompareOp::Ge,
        Rule::lt_op => CompareOp::Lt,
        Rule::gt_op => CompareOp::Gt,
        Rule::match_op => CompareOp::Match,
        Rule::in_op => CompareOp::In,
        Rule::not_in_op => CompareOp::NotIn,
        rule => {
            return Err(Error::syntax_at(
                format!("unknown comparison operator: {rule:?}"),
                offset,
            ));
        }
    })
}

fn parse_operand(pair: Pair<'_>, offset: usize) -> Result<Operand, Error> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| Error::syntax_at("expected an operand", offset))?;
    match inner.as_rule() {
        Rule::length_fn => {
            let argument = inner
                .into_inner()
                .find(|p| p.as_rule() == Rule::operand)
                .ok_or_else(|| Error::syntax_at("len() requires an argument", offset))?;
            let argument = parse_operand(argument, offset)?;
            if matches!(argument, Operand::Regex(_)) {
                return Err(Error::syntax_at(
                    "len() cannot take a regex literal",
                    offset,
                ));
            }
            Ok(Operand::Length(Box::new(argument)))
        }
        Rule::number => parse_number(inner.as_str(), offset),
        Rule::string => {
            let quoted = inner
                .into_inner()
                .next()
                .ok_or_else(|| Error::syntax_at("expected a string literal", offset))?;
            Ok(Operand::Literal(Value::String(unquote(quoted.as_str()))))
        }
        Rule::boolean => Ok(Operand::Literal(Value::Bool(inner.as_str() == "true"))),
        Rule::null => Ok(Operand::Literal(Value::Null)),
        Rule::regex => parse_regex(inner, offset),
        Rule::subpath => parse_subpath(inner, offset),
        rule => Err(Error::syntax_at(
            format!("unexpected operand: {rule:?}"),
            offset,
        )),
    }
}

fn parse_number(text: &str, offset: usize) -> Result<Operand, Error> {
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Operand::Literal(Value::from(n)));
        }
    }
    let f: f64 = text
        .parse()
        .map_err(|_| Error::syntax_at(format!("invalid number literal '{text}'"), offset))?;
    if !f.is_finite() {
        return Err(Error::syntax_at(
            format!("number literal '{text}' out of range"),
            offset,
        ));
    }
    Ok(Operand::Literal(Value::from(f)))
}

fn parse_regex(pair: Pair<'_>, offset: usize) -> Result<Operand, Error> {
    let mut body = "";
    let mut flags = "";
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::regex_body => body = inner.as_str(),
            Rule::regex_flags => flags = inner.as_str(),
            _ => {}
        }
    }

    for flag in flags.chars() {
        if !"imsxU".contains(flag) {
            return Err(Error::syntax_at(
                format!("unsupported regex flag '{flag}'"),
                offset,
            ));
        }
    }

    // the delimiter is the only escape the literal itself introduces
    let pattern = body.replace("\\/", "/");
    let full = if flags.is_empty() {
        pattern
    } else {
        format!("(?{flags}){pattern}")
    };
    let regex = Regex::new(&full)
        .map_err(|e| Error::syntax_at(format!("invalid regex literal: {e}"), offset))?;

    Ok(Operand::Regex(FilterRegex {
        literal: format!("/{body}/{flags}"),
        regex,
    }))
}

fn parse_subpath(pair: Pair<'_>, offset: usize) -> Result<Operand, Error> {
    let mut anchor = Anchor::Current;
    let mut locators = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::anchor => {
                anchor = if inner.as_str() == "$" {
                    Anchor::Root
                } else {
                    Anchor::Current
                };
            }
            Rule::sub_step => {
                let step = inner
                    .into_inner()
                    .next()
                    .ok_or_else(|| Error::syntax_at("expected a sub-path step", offset))?;
                match step.as_rule() {
                    Rule::dot_step => {
                        let member = step
                            .into_inner()
                            .next()
                            .and_then(|m| m.into_inner().next())
                            .ok_or_else(|| {
                                Error::syntax_at("expected a sub-path member", offset)
                            })?;
                        locators.push(Locator::Key(member_key(&member)));
                    }
                    Rule::bracket_step => {
                        let key = step
                            .into_inner()
                            .next()
                            .and_then(|k| k.into_inner().next())
                            .ok_or_else(|| {
                                Error::syntax_at("expected a sub-path key", offset)
                            })?;
                        match key.as_rule() {
                            Rule::index => {
                                let idx = key.as_str().parse::<usize>().map_err(|_| {
                                    Error::syntax_at(
                                        format!("invalid sub-path index '{}'", key.as_str()),
                                        offset,
                                    )
                                })?;
                                locators.push(Locator::Index(idx));
                            }
                            _ => locators.push(Locator::Key(member_key(&key))),
                        }
                    }
                    rule => {
                        return Err(Error::syntax_at(
                            format!("unexpected sub-path step: {rule:?}"),
                            offset,
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    Ok(Operand::Path { anchor, locators })
}

/// Extract the key text of a sub-path member: identifiers verbatim, quoted
/// strings unquoted and unescaped.
fn member_key(pair: &Pair<'_>) -> String {
    match pair.as_rule() {
        Rule::sq_string | Rule::dq_string => unquote(pair.as_str()),
        _ => pair.as_str().to_string(),
    }
}

/// Strip the surrounding quotes from a quoted literal and process escapes.
fn unquote(quoted: &str) -> String {
    unescape(&quoted[1..quoted.len() - 1])
}

/* Evaluation */

fn eval_expr(expr: &FilterExpr, current: &Value, root: &Value) -> bool {
    match expr {
        FilterExpr::Or(terms) => terms.iter().any(|t| eval_expr(t, current, root)),
        FilterExpr::And(terms) => terms.iter().all(|t| eval_expr(t, current, root)),
        FilterExpr::Not(inner) => !eval_expr(inner, current, root),
        FilterExpr::Truthy(operand) => truthy(resolve(operand, current, root).as_deref()),
        FilterExpr::Compare { lhs, op, rhs } => eval_compare(lhs, *op, rhs, current, root),
    }
}

/// Resolve an operand to at most one value. `None` is the *absent* state:
/// a sub-path that found nothing, or `len()` of an uncountable value.
fn resolve<'a>(
    operand: &'a Operand,
    current: &'a Value,
    root: &'a Value,
) -> Option<std::borrow::Cow<'a, Value>> {
    use std::borrow::Cow;
    match operand {
        Operand::Literal(value) => Some(Cow::Borrowed(value)),
        // regexes never resolve to a value; they are handled by `=~`
        Operand::Regex(_) => None,
        Operand::Path { anchor, locators } => {
            let base = match anchor {
                Anchor::Current => current,
                Anchor::Root => root,
            };
            walk(base, locators).map(Cow::Borrowed)
        }
        Operand::Length(inner) => {
            let value = resolve(inner, current, root)?;
            let count = match value.as_ref() {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                _ => return None,
            };
            Some(Cow::Owned(Value::from(count as u64)))
        }
    }
}

fn eval_compare(
    lhs: &Operand,
    op: CompareOp,
    rhs: &Operand,
    current: &Value,
    root: &Value,
) -> bool {
    if op == CompareOp::Match {
        let Operand::Regex(regex) = rhs else {
            return false;
        };
        return resolve(lhs, current, root)
            .as_deref()
            .and_then(Value::as_str)
            .map(|s| regex.is_match(s))
            .unwrap_or(false);
    }

    let lhs = resolve(lhs, current, root);
    let rhs = resolve(rhs, current, root);
    match (lhs, rhs) {
        (Some(l), Some(r)) => compare_present(l.as_ref(), op, r.as_ref()),
        (None, None) => false,
        // one absent side: only `!=` against a present value holds
        _ => op == CompareOp::Ne,
    }
}

fn compare_present(lhs: &Value, op: CompareOp, rhs: &Value) -> bool {
    match op {
        CompareOp::Eq => value_eq(lhs, rhs),
        CompareOp::Ne => !value_eq(lhs, rhs),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            match order_values(lhs, rhs) {
                Some(ord) => match op {
                    CompareOp::Lt => ord == Ordering::Less,
                    CompareOp::Le => ord != Ordering::Greater,
                    CompareOp::Gt => ord == Ordering::Greater,
                    CompareOp::Ge => ord != Ordering::Less,
                    _ => unreachable!(),
                },
                // cross-type ordering is undefined
                None => false,
            }
        }
        CompareOp::In => contains(rhs, lhs),
        CompareOp::NotIn => !contains(rhs, lhs),
        CompareOp::Match => false, // handled before resolution
    }
}

/// Equality with Int/Float promotion at the top level.
fn value_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => number_cmp(a, b) == Some(Ordering::Equal),
        _ => lhs == rhs,
    }
}

/// Ordering for numbers (with promotion) and strings (codepoint order).
/// Other pairs are unordered.
fn order_values(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => number_cmp(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn number_cmp(a: &serde_json::Number, b: &serde_json::Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Membership: array element, object key, or substring.
fn contains(container: &Value, item: &Value) -> bool {
    match container {
        Value::Array(items) => items.iter().any(|el| value_eq(el, item)),
        Value::Object(map) => item.as_str().map(|k| map.contains_key(k)).unwrap_or(false),
        Value::String(s) => item.as_str().map(|sub| s.contains(sub)).unwrap_or(false),
        _ => false,
    }
}

/// Dynamic truthiness of a resolved operand: absent, null, false, zero,
/// and empty strings/collections are false.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}
