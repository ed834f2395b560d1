//! Source location tracking.
//!
//! Spans are byte ranges tagged with the index of the file they belong to.
//! Line and column numbers are not stored; they are derived on demand from a
//! [`LineIndex`] built over the source text.

use serde::{Deserialize, Serialize};

/// A byte range in one source file.
///
/// # Examples
///
/// ```rust
/// use cminor_parsing::span::Span;
/// let span = Span::new(0, 3, 7);
/// assert_eq!(span.len(), 4);
/// assert!(span.contains(5));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub file_index: u32,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(file_index: u32, start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} after end {end}");
        Self {
            file_index,
            start,
            end,
        }
    }

    /// Zero-width span at `offset`.
    pub fn at(file_index: u32, offset: usize) -> Self {
        Self::new(file_index, offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Moves the end of the span forward. Never shrinks it.
    pub fn extend_to(&mut self, end: usize) {
        if end > self.end {
            self.end = end;
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            file_index: self.file_index,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Text covered by this span, if it lies within `source` on char boundaries.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::from(span.start..span.end)
    }
}

/// 1-based line and column. Columns count chars, not bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

/// Offsets of every line start in a source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line and column.
    ///
    /// Offsets past the end of `source` are clamped to its length.
    pub fn line_col(&self, source: &str, offset: usize) -> LineCol {
        let offset = offset.min(source.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = source
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        LineCol {
            line: line_idx + 1,
            column: column + 1,
        }
    }

    /// Text of the 1-based `line`, without its line terminator.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(source.len());
        source
            .get(start..end)
            .map(|text| text.strip_suffix('\r').unwrap_or(text))
    }
}
