//! # Expression Segmenter
//!
//! Splits a raw JSONPath expression into an ordered list of segments, one
//! per navigation step, in a single left-to-right scan over the input
//! bytes. The scanner is balancing-aware: nested brackets, parentheses and
//! braces, single- and double-quoted runs, and `/.../` regex literals
//! (inside filter bodies only) never split a segment.
use crate::error::Error;

/// Kind-hint attached to each raw segment, decided by the delimiter that
/// introduced it. Final classification happens in the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// A `..` recursive-descent marker.
    Descent,
    /// A dot-introduced child segment, e.g. `.name` or `.'a.b c'`.
    DotChild,
    /// The interior of a balanced `[...]` segment.
    Bracket,
    /// The interior of a dot-introduced `(...)` field extractor.
    Extractor,
}

/// One raw navigation segment plus the byte offset where it started, used
/// for error reporting downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub kind: SegmentKind,
    pub text: String,
    pub offset: usize,
}

/// A scanner over the raw bytes of an expression string.
struct Scanner<'a> {
    /// The full expression, kept as `str` for boundary-safe slicing.
    source: &'a str,
    /// The input byte sequence under examination.
    input: &'a [u8],
    /// Byte offset of the current byte.
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            input: source.as_bytes(),
            position: 0,
        }
    }

    /// Returns the byte at the current position, if any.
    fn current(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    /// Returns the byte after the current position, if any.
    fn peek(&self) -> Option<u8> {
        self.input.get(self.position + 1).copied()
    }

    /// Consume the current byte.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Slice the source between two byte offsets. Both offsets always fall
    /// on ASCII delimiters, so the cut is char-boundary safe.
    fn slice(&self, start: usize, end: usize) -> String {
        self.source[start..end].to_string()
    }

    fn scan(&mut self) -> Result<Vec<Segment>, Error> {
        if self.current() != Some(b'$') {
            return Err(Error::syntax_at("expression must start with '$'", 0));
        }
        self.advance();

        let mut segments = Vec::new();
        let mut after_descent = false;

        while let Some(byte) = self.current() {
            match byte {
                b'.' if self.peek() == Some(b'.') => {
                    segments.push(Segment {
                        kind: SegmentKind::Descent,
                        text: "..".to_string(),
                        offset: self.position,
                    });
                    self.advance();
                    self.advance();
                    if self.current().is_none() {
                        return Err(Error::syntax_at(
                            "recursive descent must be followed by a step",
                            self.position,
                        ));
                    }
                    // the step after `..` follows with no separator, e.g.
                    // `$..price` or `$..['store']`
                    after_descent = true;
                    continue;
                }
                b'.' => {
                    let dot = self.position;
                    self.advance();
                    match self.current() {
                        None => {
                            return Err(Error::syntax_at("trailing '.'", dot));
                        }
                        // `.[` normalises to `[`; picked up next iteration
                        Some(b'[') => {}
                        Some(b'(') => segments.push(self.read_extractor()?),
                        Some(_) => segments.push(self.read_dot_child()?),
                    }
                }
                b'[' => segments.push(self.read_bracket()?),
                b'(' if after_descent => {
                    segments.push(self.read_extractor()?);
                }
                _ if after_descent => {
                    segments.push(self.read_dot_child()?);
                }
                _ => {
                    return Err(Error::syntax_at(
                        format!("unexpected character '{}'", byte as char),
                        self.position,
                    ));
                }
            }
            after_descent = false;
        }

        Ok(segments)
    }

    /// Read a dot-child segment starting at the current byte. The segment
    /// runs to the next top-level `.` or `[`; a single-quoted run inside it
    /// forms one literal key that may contain dots and spaces.
    fn read_dot_child(&mut self) -> Result<Segment, Error> {
        let start = self.position;
        loop {
            match self.current() {
                None | Some(b'.') | Some(b'[') => break,
                Some(b'\'') => self.skip_quoted(b'\'')?,
                Some(_) => self.advance(),
            }
        }
        let text = self.slice(start, self.position);
        if text.is_empty() {
            return Err(Error::syntax_at("empty path segment", start));
        }
        Ok(Segment {
            kind: SegmentKind::DotChild,
            text,
            offset: start,
        })
    }

    /// Read a balanced `[...]` segment starting at the opening bracket and
    /// return its interior.
    fn read_bracket(&mut self) -> Result<Segment, Error> {
        let open = self.position;
        self.advance();
        let inner_start = self.position;
        // regex literals only occur inside filter bodies
        let is_filter = self.input[inner_start..].starts_with(b"?(");

        let mut brackets: usize = 1;
        let mut parens: i32 = 0;
        let mut braces: i32 = 0;

        while let Some(byte) = self.current() {
            match byte {
                b'\'' | b'"' => self.skip_quoted(byte)?,
                b'/' if is_filter && self.position >= inner_start + 2 => {
                    self.skip_regex()?;
                }
                b'[' => {
                    brackets += 1;
                    self.advance();
                }
                b']' => {
                    brackets -= 1;
                    if brackets == 0 {
                        if parens != 0 || braces != 0 {
                            return Err(Error::syntax_at(
                                "unbalanced delimiter inside segment",
                                open,
                            ));
                        }
                        let text = self.slice(inner_start, self.position);
                        self.advance();
                        if text.is_empty() {
                            return Err(Error::syntax_at("empty bracket segment", open));
                        }
                        return Ok(Segment {
                            kind: SegmentKind::Bracket,
                            text,
                            offset: open,
                        });
                    }
                    self.advance();
                }
                b'(' => {
                    parens += 1;
                    self.advance();
                }
                b')' => {
                    parens -= 1;
                    if parens < 0 {
                        return Err(Error::syntax_at("unbalanced ')'", self.position));
                    }
                    self.advance();
                }
                b'{' => {
                    braces += 1;
                    self.advance();
                }
                b'}' => {
                    braces -= 1;
                    if braces < 0 {
                        return Err(Error::syntax_at("unbalanced '}'", self.position));
                    }
                    self.advance();
                }
                _ => self.advance(),
            }
        }

        Err(Error::syntax_at("unbalanced '['", open))
    }

    /// Read a dot-introduced `(...)` field-extractor segment starting at the
    /// opening parenthesis and return its interior.
    fn read_extractor(&mut self) -> Result<Segment, Error> {
        let open = self.position;
        self.advance();
        let inner_start = self.position;
        let mut depth: usize = 1;

        while let Some(byte) = self.current() {
            match byte {
                b'\'' | b'"' => self.skip_quoted(byte)?,
                b'(' => {
                    depth += 1;
                    self.advance();
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        let text = self.slice(inner_start, self.position);
                        self.advance();
                        if text.is_empty() {
                            return Err(Error::syntax_at("empty field extractor", open));
                        }
                        return Ok(Segment {
                            kind: SegmentKind::Extractor,
                            text,
                            offset: open,
                        });
                    }
                    self.advance();
                }
                _ => self.advance(),
            }
        }

        Err(Error::syntax_at("unbalanced '('", open))
    }

    /// Skip a quoted run starting at the opening quote. A backslash escapes
    /// the byte that follows it.
    fn skip_quoted(&mut self, quote: u8) -> Result<(), Error> {
        let start = self.position;
        self.advance();
        while let Some(byte) = self.current() {
            match byte {
                b'\\' => {
                    self.advance();
                    if self.current().is_some() {
                        self.advance();
                    }
                }
                _ if byte == quote => {
                    self.advance();
                    return Ok(());
                }
                _ => self.advance(),
            }
        }
        Err(Error::syntax_at("unterminated quote", start))
    }

    /// Skip a `/.../` regex literal starting at the opening slash. Trailing
    /// flag characters need no special handling here; they carry no
    /// delimiters.
    fn skip_regex(&mut self) -> Result<(), Error> {
        let start = self.position;
        self.advance();
        while let Some(byte) = self.current() {
            match byte {
                b'\\' => {
                    self.advance();
                    if self.current().is_some() {
                        self.advance();
                    }
                }
                b'/' => {
                    self.advance();
                    return Ok(());
                }
                _ => self.advance(),
            }
        }
        Err(Error::syntax_at("unterminated regex literal", start))
    }
}

/// Split a raw expression into segments, returning both kind-hints and the
/// byte offset each segment started at.
pub(crate) fn segment(expr: &str) -> Result<Vec<Segment>, Error> {
    Scanner::new(expr).scan()
}
