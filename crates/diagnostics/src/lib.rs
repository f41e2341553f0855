//! Diagnostics for posarg.
//!
//! Provides [`Diagnostic`], [`Severity`], and [`Span`] types used to report
//! errors, warnings, and informational messages from slot table construction,
//! schema loading, and token allocation. Diagnostic codes are defined in the
//! [`codes`] module.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// The command line cannot be bound.
    Error,
    /// The command line binds, but probably not as intended.
    Warn,
    /// Informational note.
    Info,
}

/// Range of command-line tokens a diagnostic points at.
///
/// Positions are **token indices**, not byte offsets: `Span::new(1, 3)`
/// covers the second and third positional words.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Index of the first token (0-based).
    pub start: usize,
    /// Index one past the last token.
    pub end: usize,
}

impl Span {
    /// Create a span covering tokens `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given token position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Number of tokens covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no token at all.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A diagnostic message produced while building slots or allocating tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic code (e.g., `"PA1001"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Optional token span this diagnostic relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    /// Absent when no context is applicable. Serialized only when present.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, span)
    }

    /// Shorthand for an `Info` diagnostic.
    pub fn info(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Info, message, span)
    }

    /// Attach machine-readable context metadata (builder pattern).
    ///
    /// Keys are short descriptors like `"slot"`, `"token"`, `"minimum"`.
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    match id {
        codes::REQUIRED_MISSING => Some(
            "One or more positional arguments did not receive the minimum number of \
             words they require. The message lists every slot, from the first failing \
             one onward, that is still short.",
        ),
        codes::TOO_MANY => Some(
            "The last positional argument accepts a bounded number of words and is \
             already full, yet words remain on the command line. Remove the extra words \
             or raise the slot's maximum.",
        ),
        codes::CONVERSION_FAILED => Some(
            "A word was assigned to a positional argument but could not be converted \
             to that argument's type (for example, a non-numeric word for an integer).",
        ),
        codes::INVALID_RANGE => Some(
            "A positional argument declares a malformed `required` range. Use `N` for \
             a minimum or `N-M` for a minimum and maximum, both non-negative integers.",
        ),
        codes::UNBOUNDED_NOT_LAST => Some(
            "Only the last positional argument may accept an unbounded number of words. \
             Give earlier list arguments an explicit maximum or move them last.",
        ),
        codes::MIN_EXCEEDS_MAX => Some(
            "A positional argument's `required` range has a minimum above its maximum.",
        ),
        codes::SCHEMA_INVALID => Some(
            "The positional schema document is missing a required field, has an empty \
             or duplicate slot name, or declares no slots at all.",
        ),
        _ => None,
    }
}
