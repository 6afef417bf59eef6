//! Cursor and selection model over a [`TextBuffer`].
//!
//! The model owns one cursor plus an optional anchor/active selection pair.
//! Anchor order is preserved separately from normalized document order:
//! shift-extension and redo need to know which end is the moving one, while
//! consumers of a selection want `start <= end`.
//!
//! Invariants the public API maintains:
//! * A stored selection is never degenerate: `anchor == active` collapses to
//!   no selection at the [`set_selection`] boundary.
//! * `set_selection` never moves the cursor. Programmatic cursor moves must
//!   not fabricate selections, and selection updates that should carry the
//!   cursor (extension) do so explicitly.
//!
//! Movement steps by grapheme cluster horizontally, wrapping across line
//! boundaries, and clamps the byte offset on vertical moves. There is no
//! sticky goal column: moving up through a short line then back down lands
//! wherever the intermediate clamp left the offset.
//!
//! [`set_selection`]: SelectionModel::set_selection

use core_buffer::{Position, TextBuffer, grapheme};
use thiserror::Error;

/// Requested a normalized selection when none is active. A caller bug.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no active selection")]
pub struct NoSelection;

/// A single cursor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// A raw selection pair. `anchor` is the fixed end (the original click or
/// extension origin); `active` is the moving end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub anchor: Position,
    pub active: Position,
}

impl Span {
    pub fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    /// The pair reordered into document order `(start, end)`.
    pub fn normalized(&self) -> (Position, Position) {
        if self.anchor <= self.active {
            (self.anchor, self.active)
        } else {
            (self.active, self.anchor)
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.anchor == self.active
    }
}

/// Cursor position plus optional selection over one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    pub cursor: Position,
    selection: Option<Span>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self {
            cursor: Position::origin(),
            selection: None,
        }
    }

    pub fn set_cursor(&mut self, pos: Position) {
        self.cursor = pos;
    }

    /// Store a selection pair; a degenerate pair stores no selection. The
    /// cursor is left untouched either way.
    pub fn set_selection(&mut self, anchor: Position, active: Position) {
        self.selection = if anchor == active {
            None
        } else {
            Some(Span::new(anchor, active))
        };
    }

    /// Drop the selection, cursor untouched.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn selection(&self) -> Option<Span> {
        self.selection
    }

    /// The active selection in document order.
    pub fn normalize(&self) -> Result<(Position, Position), NoSelection> {
        self.selection
            .map(|s| s.normalized())
            .ok_or(NoSelection)
    }

    /// Collapse the selection to its document-order start: cursor moves
    /// there, selection clears. No-op without a selection. This is the
    /// plain-ArrowLeft-with-selection contract, not a character step.
    pub fn move_cursor_to_selection_start(&mut self) {
        if let Ok((start, _)) = self.normalize() {
            self.cursor = start;
            self.selection = None;
        }
    }

    /// Collapse the selection to its document-order end.
    pub fn move_cursor_to_selection_end(&mut self) {
        if let Ok((_, end)) = self.normalize() {
            self.cursor = end;
            self.selection = None;
        }
    }

    /// Unconditional single cursor step, independent of any selection.
    pub fn move_cursor(&mut self, dir: Direction, buf: &TextBuffer) {
        self.cursor = step(self.cursor, dir, buf);
    }

    /// Grow or shrink the selection by one step of its active end.
    ///
    /// Without a selection, one is anchored at the cursor first. The active
    /// end then moves by the same boundary rules as [`move_cursor`], and the
    /// cursor follows it. If the active end returns exactly to the anchor the
    /// selection collapses, so extension is symmetric and reversible
    /// keystroke-by-keystroke.
    ///
    /// [`move_cursor`]: SelectionModel::move_cursor
    pub fn extend(&mut self, dir: Direction, buf: &TextBuffer) {
        let span = self
            .selection
            .unwrap_or(Span::new(self.cursor, self.cursor));
        let next = step(span.active, dir, buf);
        self.cursor = next;
        self.selection = if next == span.anchor {
            None
        } else {
            Some(Span::new(span.anchor, next))
        };
    }
}

/// One cursor step from `pos` in `dir`.
///
/// Left at a line start wraps to the previous line end; right at a line end
/// wraps to the next line start; up/down clamp the offset to the target line
/// (snapping down to a grapheme boundary) and do nothing on the first/last
/// line.
fn step(pos: Position, dir: Direction, buf: &TextBuffer) -> Position {
    match dir {
        Direction::Left => {
            if pos.ch > 0 {
                let line = buf.line(pos.line).unwrap_or("");
                Position::new(pos.line, grapheme::prev_boundary(line, pos.ch))
            } else if pos.line > 0 {
                Position::new(pos.line - 1, buf.line_len(pos.line - 1).unwrap_or(0))
            } else {
                pos
            }
        }
        Direction::Right => {
            let line = buf.line(pos.line).unwrap_or("");
            if pos.ch < line.len() {
                Position::new(pos.line, grapheme::next_boundary(line, pos.ch))
            } else if pos.line + 1 < buf.line_count() {
                Position::new(pos.line + 1, 0)
            } else {
                pos
            }
        }
        Direction::Up => {
            if pos.line == 0 {
                pos
            } else {
                clamp_to_line(pos.line - 1, pos.ch, buf)
            }
        }
        Direction::Down => {
            if pos.line + 1 >= buf.line_count() {
                pos
            } else {
                clamp_to_line(pos.line + 1, pos.ch, buf)
            }
        }
    }
}

fn clamp_to_line(line: usize, ch: usize, buf: &TextBuffer) -> Position {
    let content = buf.line(line).unwrap_or("");
    Position::new(line, grapheme::floor_boundary(content, ch))
}
