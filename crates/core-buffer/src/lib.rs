//! Line-oriented text buffer and document positions.
//!
//! The buffer stores the document as an ordered sequence of newline-free
//! lines; the full text is the lines joined by `\n`. The sequence is never
//! empty: an empty document is one empty line. All mutation goes through the
//! position-taking primitives below, which validate their arguments and fail
//! with [`BufferError`] instead of clamping: a position the buffer did not
//! itself produce is a caller defect, and silently repairing it has a history
//! of corrupting documents in this domain.
//!
//! Representation note: the line array keeps single-line edits O(line length)
//! and whole-document operations O(total length), which is adequate for
//! interactive, mostly character-at-a-time editing. Very large documents
//! would want a rope or piece table behind the same operation contract; the
//! contract is the stable surface, not the `Vec<String>`.
//!
//! Unicode: positions carry UTF-8 byte offsets that are always on `char`
//! boundaries. User-perceived "one character" steps (backward delete, cursor
//! motion in higher layers) operate on grapheme cluster boundaries via the
//! [`grapheme`] helpers.

use thiserror::Error;

/// A document coordinate: line index plus byte offset within that line.
///
/// `ch` is always on a `char` boundary and satisfies `0 <= ch <= line length`
/// for positions the buffer produced. Positions are immutable values; every
/// operation that "moves" one returns a new value. The derived ordering is
/// document order (line, then offset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }

    pub fn origin() -> Self {
        Self { line: 0, ch: 0 }
    }
}

/// Position validation failures. These indicate caller bugs, not runtime
/// conditions to recover from.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("line {line} out of range (buffer has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },
    #[error("offset {ch} past end of line {line} (line length {len})")]
    ColumnOutOfRange { line: usize, ch: usize, len: usize },
    #[error("offset {ch} is not a char boundary on line {line}")]
    NotCharBoundary { line: usize, ch: usize },
    #[error("range start {start:?} is after end {end:?}")]
    ReversedRange { start: Position, end: Position },
}

/// What a backward delete removed: a grapheme cluster, or the line boundary
/// when the delete merged two lines. Undo needs the distinction to know
/// whether to re-insert text or a newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deleted {
    Newline,
    Text(String),
}

/// The document content: an ordered, never-empty sequence of newline-free
/// lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    /// An empty document: one empty line.
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }

    /// Construct from an initial text blob, split on `\n`. An empty blob
    /// yields one empty line.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_owned).collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Byte length of a line, or `None` when the index is out of range.
    pub fn line_len(&self, idx: usize) -> Option<usize> {
        self.lines.get(idx).map(String::len)
    }

    /// Read-only view of the line sequence, for renderers and search.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The whole document as one string.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Replace the entire line sequence. The only operation that may change
    /// the line count without taking a position.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_owned).collect();
    }

    /// Check that `pos` names an existing line, does not exceed its length,
    /// and sits on a `char` boundary.
    pub fn validate(&self, pos: Position) -> Result<(), BufferError> {
        let Some(line) = self.lines.get(pos.line) else {
            return Err(BufferError::LineOutOfRange {
                line: pos.line,
                line_count: self.lines.len(),
            });
        };
        if pos.ch > line.len() {
            return Err(BufferError::ColumnOutOfRange {
                line: pos.line,
                ch: pos.ch,
                len: line.len(),
            });
        }
        if !line.is_char_boundary(pos.ch) {
            return Err(BufferError::NotCharBoundary {
                line: pos.line,
                ch: pos.ch,
            });
        }
        Ok(())
    }

    fn validate_range(&self, start: Position, end: Position) -> Result<(), BufferError> {
        self.validate(start)?;
        self.validate(end)?;
        if start > end {
            return Err(BufferError::ReversedRange { start, end });
        }
        Ok(())
    }

    /// Insert `text` at `pos` and return the position just after it.
    ///
    /// Intended for a single typed character, but the argument is a string:
    /// a multi-character or multi-line string routes through [`insert_text`]
    /// and behaves identically.
    ///
    /// [`insert_text`]: TextBuffer::insert_text
    pub fn insert_char(&mut self, pos: Position, text: &str) -> Result<Position, BufferError> {
        if text.contains('\n') {
            return self.insert_text(pos, text);
        }
        self.validate(pos)?;
        self.lines[pos.line].insert_str(pos.ch, text);
        Ok(Position::new(pos.line, pos.ch + text.len()))
    }

    /// Split the line at `pos`, introducing a new line boundary. The returned
    /// position is the start of the new line.
    pub fn insert_newline(&mut self, pos: Position) -> Result<Position, BufferError> {
        self.validate(pos)?;
        let rest = self.lines[pos.line].split_off(pos.ch);
        self.lines.insert(pos.line + 1, rest);
        Ok(Position::new(pos.line + 1, 0))
    }

    /// Insert arbitrary (possibly multi-line) text at `pos`. Middle segments
    /// become whole new lines between the head (prefix + first segment) and
    /// tail (last segment + suffix). Returns the position just after the
    /// inserted text.
    pub fn insert_text(&mut self, pos: Position, text: &str) -> Result<Position, BufferError> {
        self.validate(pos)?;
        let segments: Vec<&str> = text.split('\n').collect();
        if segments.len() == 1 {
            self.lines[pos.line].insert_str(pos.ch, text);
            return Ok(Position::new(pos.line, pos.ch + text.len()));
        }
        let tail = self.lines[pos.line].split_off(pos.ch);
        self.lines[pos.line].push_str(segments[0]);
        let last_len = segments[segments.len() - 1].len();
        let mut new_lines: Vec<String> = segments[1..].iter().map(|s| (*s).to_owned()).collect();
        new_lines
            .last_mut()
            .expect("split produced at least two segments")
            .push_str(&tail);
        let at = pos.line + 1;
        self.lines.splice(at..at, new_lines);
        Ok(Position::new(pos.line + segments.len() - 1, last_len))
    }

    /// Delete one unit before `pos`, like backspace.
    ///
    /// Mid-line this removes the grapheme cluster ending at `pos.ch`. At the
    /// start of a line it merges the line into the previous one and reports
    /// [`Deleted::Newline`]. At the document origin it is a no-op returning
    /// `Ok(None)`. On success the returned position is where the cursor
    /// lands.
    pub fn delete_backward(
        &mut self,
        pos: Position,
    ) -> Result<Option<(Deleted, Position)>, BufferError> {
        self.validate(pos)?;
        if pos.ch == 0 {
            if pos.line == 0 {
                return Ok(None);
            }
            let current = self.lines.remove(pos.line);
            let prev = &mut self.lines[pos.line - 1];
            let join = prev.len();
            prev.push_str(&current);
            return Ok(Some((Deleted::Newline, Position::new(pos.line - 1, join))));
        }
        let line = &mut self.lines[pos.line];
        let start = grapheme::prev_boundary(line, pos.ch);
        let removed = line[start..pos.ch].to_owned();
        line.replace_range(start..pos.ch, "");
        Ok(Some((Deleted::Text(removed), Position::new(pos.line, start))))
    }

    /// Remove everything strictly between `start` and `end` (document order)
    /// and return the removed text. When the range spans lines, the prefix of
    /// `start`'s line and the suffix of `end`'s line are spliced into one
    /// line. The cursor contract is that the caller lands at `start`.
    pub fn delete_range(&mut self, start: Position, end: Position) -> Result<String, BufferError> {
        self.validate_range(start, end)?;
        let removed = self.slice_text(start, end)?;
        if start.line == end.line {
            self.lines[start.line].replace_range(start.ch..end.ch, "");
        } else {
            let tail = self.lines[end.line][end.ch..].to_owned();
            self.lines[start.line].truncate(start.ch);
            self.lines[start.line].push_str(&tail);
            self.lines.drain(start.line + 1..=end.line);
        }
        Ok(removed)
    }

    /// Read-only extraction of the text between two ordered positions.
    /// Partial first/last lines and whole intervening lines are joined with
    /// `\n`.
    pub fn slice_text(&self, start: Position, end: Position) -> Result<String, BufferError> {
        self.validate_range(start, end)?;
        if start.line == end.line {
            return Ok(self.lines[start.line][start.ch..end.ch].to_owned());
        }
        let mut out = String::new();
        out.push_str(&self.lines[start.line][start.ch..]);
        for line in &self.lines[start.line + 1..end.line] {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        out.push_str(&self.lines[end.line][..end.ch]);
        Ok(out)
    }
}

/// Grapheme cluster boundary helpers operating on a single line.
pub mod grapheme {
    use unicode_segmentation::UnicodeSegmentation;

    /// Previous grapheme boundary before `ch` (0 if already at or before the
    /// first boundary).
    pub fn prev_boundary(line: &str, ch: usize) -> usize {
        if ch == 0 || ch > line.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx >= ch {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next grapheme boundary after `ch` (`line.len()` if at or beyond the
    /// end).
    pub fn next_boundary(line: &str, ch: usize) -> usize {
        if ch >= line.len() {
            return line.len();
        }
        for (idx, _) in line.grapheme_indices(true) {
            if idx > ch {
                return idx;
            }
        }
        line.len()
    }

    /// Largest grapheme boundary at or below `ch`, used to clamp a carried
    /// column onto a shorter or differently-segmented line.
    pub fn floor_boundary(line: &str, ch: usize) -> usize {
        if ch >= line.len() {
            return line.len();
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx > ch {
                break;
            }
            last = idx;
        }
        last
    }
}
