/*!
# Errors

Defines the error taxonomy surfaced by expression compilation and
evaluation. Compilation failures are always [`Error::Syntax`] and carry the
byte offset into the expression where the problem was detected, when one is
known. Evaluation is deliberately forgiving (missing keys and type
mismatches are skipped, never raised); the one exception is sorting across
incompatible types, which surfaces as [`Error::Type`].
*/
use std::error::Error as StdError;
use std::fmt;

/// Represents errors that can occur while compiling or evaluating a
/// JSONPath expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed expression syntax: unbalanced delimiters, unterminated
    /// quotes, unknown operators, empty comma-lists, a zero slice step, or
    /// an uncompilable regex literal.
    Syntax {
        /// Human-readable description of the problem.
        message: String,
        /// Byte offset into the expression, when known.
        offset: Option<usize>,
    },
    /// A sort was asked to order values it cannot compare, e.g. numbers
    /// against strings under the same sort key.
    Type(String),
    /// Reserved for pathological index configurations.
    Index(String),
    /// An argument outside the accepted domain.
    Value(String),
}

impl Error {
    /// Construct a syntax error with a known byte offset.
    pub(crate) fn syntax_at(message: impl Into<String>, offset: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Construct a syntax error with no usable offset (e.g. from a
    /// sub-language parser that reports positions relative to its own
    /// fragment).
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
            offset: None,
        }
    }
}

impl StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax {
                message,
                offset: Some(offset),
            } => {
                write!(f, "syntax error at byte {offset}: {message}")
            }
            Self::Syntax {
                message,
                offset: None,
            } => write!(f, "syntax error: {message}"),
            Self::Type(message) => write!(f, "type error: {message}"),
            Self::Index(message) => write!(f, "index error: {message}"),
            Self::Value(message) => write!(f, "value error: {message}"),
        }
    }
}
