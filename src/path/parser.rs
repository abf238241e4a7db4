/*!
# Path Parser

Classifies raw expression segments into [`Step`]s, producing a
[`CompiledPath`].

## Examples

This module exposes [`parse_path`], which [`CompiledPath::compile`] and the
`FromStr` impl delegate to:

```rust
use jsonpick::path::{parser, Step};

let path = parser::parse_path("$.store.book[0:2]").expect("invalid path");
assert!(matches!(path.steps()[1], Step::Child(_)));
assert!(matches!(path.steps()[3], Step::Slice { .. }));
```

## Errors

Malformed expressions fail fast with [`Error::Syntax`] carrying the byte
offset of the offending segment:

```rust
use jsonpick::path::parser::parse_path;
use jsonpick::error::Error;

let result = parse_path("$.book[1:2:0]");
assert!(matches!(result, Err(Error::Syntax { .. })));
```
*/
use crate::error::Error;
use crate::path::ast::{CompiledPath, ExtractKey, SortKey, Step};
use crate::path::filter::compile_predicate;
use crate::path::segment::{segment, Segment, SegmentKind};

/// Parse an expression string into a [`CompiledPath`].
///
/// # Errors
///
/// Returns [`Error::Syntax`] describing how the parse failed.
pub fn parse_path(input: &str) -> Result<CompiledPath, Error> {
    let segments = segment(input)?;

    let mut steps = vec![Step::Root];
    for seg in &segments {
        let step = match seg.kind {
            SegmentKind::Descent => Step::Descent,
            SegmentKind::DotChild => classify_dot_child(seg)?,
            SegmentKind::Extractor => Step::Extract(parse_extract_keys(&seg.text, seg.offset)?),
            SegmentKind::Bracket => classify_bracket(seg)?,
        };
        steps.push(step);
    }

    Ok(CompiledPath::from_parts(steps, input.to_string()))
}

/// Classify a dot-child segment: `*`, a quoted literal, or a plain key.
fn classify_dot_child(seg: &Segment) -> Result<Step, Error> {
    let text = seg.text.as_str();
    if text == "*" {
        return Ok(Step::Wildcard);
    }
    Ok(Step::Child(vec![read_key(text)]))
}

/// Classify a bracketed segment by its leading characters and overall
/// shape.
fn classify_bracket(seg: &Segment) -> Result<Step, Error> {
    let text = seg.text.trim();
    let offset = seg.offset;

    if let Some(rest) = text.strip_prefix("?(") {
        let body = rest
            .strip_suffix(')')
            .ok_or_else(|| Error::syntax_at("malformed filter segment", offset))?;
        return Ok(Step::Filter(compile_predicate(body, offset)?));
    }

    if let Some(rest) = text.strip_prefix("/(") {
        let body = rest
            .strip_suffix(')')
            .ok_or_else(|| Error::syntax_at("malformed sorter segment", offset))?;
        return Ok(Step::Sort(parse_sort_keys(body, offset)?));
    }

    if let Some(rest) = text.strip_prefix('(') {
        let body = rest
            .strip_suffix(')')
            .ok_or_else(|| Error::syntax_at("malformed extractor segment", offset))?;
        return Ok(Step::Extract(parse_extract_keys(body, offset)?));
    }

    if text == "*" {
        return Ok(Step::Wildcard);
    }

    if has_top_level_colon(text) {
        return parse_slice(text, offset);
    }

    if is_index_list(text) {
        return parse_index_list(text, offset);
    }

    parse_child_keys(text, offset)
}

/// Returns `true` if the segment interior contains a `:` outside quoted
/// runs, which makes it a slice.
fn has_top_level_colon(text: &str) -> bool {
    let mut quote: Option<u8> = None;
    let mut bytes = text.bytes();
    while let Some(byte) = bytes.next() {
        match byte {
            b'\\' if quote.is_some() => {
                let _ = bytes.next();
            }
            b'\'' | b'"' => match quote {
                None => quote = Some(byte),
                Some(q) if q == byte => quote = None,
                _ => {}
            },
            b':' if quote.is_none() => return true,
            _ => {}
        }
    }
    false
}

/// Returns `true` if the interior can only be an index list: digits,
/// signs, commas, and spaces with at least one digit.
fn is_index_list(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | ',' | ' '))
}

fn parse_slice(text: &str, offset: usize) -> Result<Step, Error> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return Err(Error::syntax_at("slice takes at most three parts", offset));
    }

    let bound = |part: &str| -> Result<Option<i64>, Error> {
        let part = part.trim();
        if part.is_empty() {
            return Ok(None);
        }
        part.parse::<i64>().map(Some).map_err(|_| {
            Error::syntax_at(format!("invalid slice bound '{part}'"), offset)
        })
    };

    let start = bound(parts[0])?;
    let end = bound(parts.get(1).copied().unwrap_or(""))?;
    let step = bound(parts.get(2).copied().unwrap_or(""))?;

    if step == Some(0) {
        return Err(Error::syntax_at("slice step cannot be zero", offset));
    }

    Ok(Step::Slice { start, end, step })
}

fn parse_index_list(text: &str, offset: usize) -> Result<Step, Error> {
    let mut indices = Vec::new();
    for part in text.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(Error::syntax_at("empty index in list", offset));
        }
        let index = part
            .parse::<i64>()
            .map_err(|_| Error::syntax_at(format!("invalid index '{part}'"), offset))?;
        indices.push(index);
    }
    Ok(Step::IndexList(indices))
}

fn parse_child_keys(text: &str, offset: usize) -> Result<Step, Error> {
    let mut keys = Vec::new();
    for part in split_top_level_commas(text) {
        let part = part.trim();
        if part.is_empty() {
            return Err(Error::syntax_at("empty key in list", offset));
        }
        keys.push(read_key(part));
    }
    Ok(Step::Child(keys))
}

fn parse_sort_keys(body: &str, offset: usize) -> Result<Vec<SortKey>, Error> {
    let mut keys = Vec::new();
    for part in split_top_level_commas(body) {
        let part = part.trim();
        if part.is_empty() {
            return Err(Error::syntax_at("empty sort key", offset));
        }
        let (descending, text) = match part.strip_prefix('~') {
            Some(rest) => (true, rest.trim()),
            None => (false, part),
        };
        let path = dotted_components(text)
            .ok_or_else(|| Error::syntax_at(format!("invalid sort key '{part}'"), offset))?;
        keys.push(SortKey { path, descending });
    }
    Ok(keys)
}

fn parse_extract_keys(body: &str, offset: usize) -> Result<Vec<ExtractKey>, Error> {
    let mut keys = Vec::new();
    for part in split_top_level_commas(body) {
        let part = part.trim();
        if part.is_empty() {
            return Err(Error::syntax_at("empty extractor key", offset));
        }
        let path = dotted_components(part)
            .ok_or_else(|| Error::syntax_at(format!("invalid extractor key '{part}'"), offset))?;
        keys.push(ExtractKey {
            label: part.to_string(),
            path,
        });
    }
    Ok(keys)
}

/// Split a dotted key into its components; `None` if any component is
/// empty.
fn dotted_components(text: &str) -> Option<Vec<String>> {
    if text.is_empty() {
        return None;
    }
    let components: Vec<String> = text.split('.').map(str::to_string).collect();
    if components.iter().any(String::is_empty) {
        return None;
    }
    Some(components)
}

/// Read a single child key, stripping matching quotes and processing
/// escapes when present.
fn read_key(part: &str) -> String {
    let bytes = part.as_bytes();
    if part.len() >= 2 {
        let (first, last) = (bytes[0], bytes[part.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return unescape(&part[1..part.len() - 1]);
        }
    }
    part.to_string()
}

/// Split on commas outside quoted runs.
fn split_top_level_commas(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote.is_some() => i += 1,
            b'\'' | b'"' => match quote {
                None => quote = Some(bytes[i]),
                Some(q) if q == bytes[i] => quote = None,
                _ => {}
            },
            b',' if quote.is_none() => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
}

/// Process backslash escapes in a quoted run: the JSON escapes plus the
/// quote characters themselves. Unknown escapes keep the escaped byte.
pub(crate) fn unescape(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
