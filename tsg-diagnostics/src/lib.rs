//! Source positions, spans and the diagnostic list shared by every
//! compilation phase.
//!
//! Diagnostics are append-only: a phase collects them in source order and the
//! driver prints them as `line:column: message`. No phase ever mutates or
//! reorders another phase's diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A source position, 1-based in both line and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A half-open source range from `begin` to `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub begin: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(begin: Pos, end: Pos) -> Self {
        Self { begin, end }
    }

    /// A zero-width span at a single position.
    pub fn point(pos: Pos) -> Self {
        Self { begin: pos, end: pos }
    }

    /// The range covering `self` through `other`.
    pub fn to(self, other: Span) -> Self {
        Self {
            begin: self.begin,
            end: other.end,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.begin.line, self.begin.column)
    }
}

/// One reported problem: where, and what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

/// Append-only list of diagnostics produced by one phase.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    list: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.list.push(Diagnostic {
            span,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.list.iter()
    }

    /// True when some diagnostic message contains `needle`.
    pub fn any_contains(&self, needle: &str) -> bool {
        self.list.iter().any(|d| d.message.contains(needle))
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}
