//! Reversible edit commands.
//!
//! A [`Command`] is plain data: its kind, the pre-mutation positions and
//! content needed to replay it, and one `after` field captured when it is
//! first applied. Commands hold no reference to the engine; a pair of
//! interpreter functions, [`apply`] and [`invert`], dispatch on the kind and
//! mutate the buffer and selection together. This keeps commands trivially
//! clonable, comparable in tests, and serializable should a history log ever
//! want to persist them.
//!
//! Contract: `apply` on a fresh command captures whatever after-state its
//! inverse needs; `invert` restores buffer and cursor to exactly the state
//! before that `apply`, provided commands are inverted in reverse application
//! order (later commands may depend on positions produced by earlier ones).
//! Re-applying an already-recorded command (redo replay) uses the recorded
//! positions rather than the live cursor, so a replayed sequence reproduces
//! the original one bit for bit. Inverting a command that was never applied
//! fails with [`EditError::NotApplied`].

use core_buffer::{BufferError, Deleted, Position, TextBuffer};
use core_selection::{NoSelection, SelectionModel, Span};
use thiserror::Error;
use tracing::trace;

/// Failures surfaced by the command interpreters. All of these are caller
/// defects to fix, not runtime conditions to handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    NoSelection(#[from] NoSelection),
    #[error("command has not been applied")]
    NotApplied,
}

/// One reversible mutation of buffer + selection.
///
/// The `after` field (and `removed`/`text` snapshots where present) start out
/// empty and are filled in by the first [`apply`]; everything else is fixed at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert `text` at `pos`. Built for a single typed character, but any
    /// string works; a multi-line string splices like an `InsertText`.
    InsertChar {
        pos: Position,
        text: String,
        after: Option<Position>,
    },
    /// Split the line at `pos`.
    InsertNewline { pos: Position, after: Option<Position> },
    /// Backward-delete one unit at `pos`, recording what was removed (a
    /// grapheme cluster or the line-merge newline sentinel).
    DeleteChar {
        pos: Position,
        removed: Option<Deleted>,
        after: Option<Position>,
    },
    /// Delete the text covered by `span`, snapshotting the covered text and
    /// the raw anchor/active pair so undo can restore both.
    DeleteSelection {
        span: Span,
        text: Option<String>,
        after: Option<Position>,
    },
    /// Insert arbitrary text at the cursor, replacing any active selection
    /// first. The pre-insert position is captured at first apply.
    InsertText {
        text: String,
        pos: Option<Position>,
        after: Option<Position>,
    },
}

impl Command {
    pub fn insert_char(pos: Position, text: impl Into<String>) -> Self {
        Self::InsertChar {
            pos,
            text: text.into(),
            after: None,
        }
    }

    pub fn insert_newline(pos: Position) -> Self {
        Self::InsertNewline { pos, after: None }
    }

    pub fn delete_char(pos: Position) -> Self {
        Self::DeleteChar {
            pos,
            removed: None,
            after: None,
        }
    }

    pub fn delete_selection(span: Span) -> Self {
        Self::DeleteSelection {
            span,
            text: None,
            after: None,
        }
    }

    pub fn insert_text(text: impl Into<String>) -> Self {
        Self::InsertText {
            text: text.into(),
            pos: None,
            after: None,
        }
    }
}

/// Execute a command against buffer + selection, capturing after-state on
/// first application. On a replay (after-state already captured) the recorded
/// positions drive the mutation.
pub fn apply(
    cmd: &mut Command,
    buf: &mut TextBuffer,
    sel: &mut SelectionModel,
) -> Result<(), EditError> {
    match cmd {
        Command::InsertChar { pos, text, after } => {
            sel.set_cursor(*pos);
            let end = buf.insert_char(*pos, text)?;
            sel.set_cursor(end);
            *after = Some(end);
            trace!(target: "commands", op = "insert_char", line = pos.line, ch = pos.ch, "apply");
        }
        Command::InsertNewline { pos, after } => {
            let end = buf.insert_newline(*pos)?;
            sel.set_cursor(end);
            *after = Some(end);
            trace!(target: "commands", op = "insert_newline", line = pos.line, ch = pos.ch, "apply");
        }
        Command::DeleteChar {
            pos,
            removed,
            after,
        } => {
            sel.set_cursor(*pos);
            match buf.delete_backward(*pos)? {
                Some((deleted, end)) => {
                    *removed = Some(deleted);
                    sel.set_cursor(end);
                    *after = Some(end);
                }
                None => {
                    // Backspace at the document origin: nothing to record.
                    *removed = None;
                    *after = Some(*pos);
                }
            }
            trace!(target: "commands", op = "delete_char", line = pos.line, ch = pos.ch, "apply");
        }
        Command::DeleteSelection { span, text, after } => {
            let (start, end) = span.normalized();
            *text = Some(buf.delete_range(start, end)?);
            sel.set_cursor(start);
            sel.clear_selection();
            *after = Some(start);
            trace!(
                target: "commands",
                op = "delete_selection",
                from_line = start.line,
                to_line = end.line,
                "apply"
            );
        }
        Command::InsertText { text, pos, after } => {
            if pos.is_none() && sel.has_selection() {
                // Replace the active selection. Note this deletion is not
                // part of the recorded command; callers that need it undone
                // must record an explicit DeleteSelection first.
                let (start, end) = sel.normalize()?;
                buf.delete_range(start, end)?;
                sel.set_cursor(start);
                sel.clear_selection();
            }
            let at = pos.unwrap_or(sel.cursor);
            *pos = Some(at);
            let end = buf.insert_text(at, text)?;
            sel.set_cursor(end);
            *after = Some(end);
            trace!(target: "commands", op = "insert_text", line = at.line, ch = at.ch, bytes = text.len(), "apply");
        }
    }
    Ok(())
}

/// Invert an applied command, restoring buffer and cursor to the state
/// immediately before its `apply`.
pub fn invert(
    cmd: &Command,
    buf: &mut TextBuffer,
    sel: &mut SelectionModel,
) -> Result<(), EditError> {
    match cmd {
        Command::InsertChar { pos, after, .. } => {
            let after = after.ok_or(EditError::NotApplied)?;
            buf.delete_range(*pos, after)?;
            sel.set_cursor(*pos);
            trace!(target: "commands", op = "insert_char", line = pos.line, ch = pos.ch, "invert");
        }
        Command::InsertNewline { pos, after } => {
            let after = after.ok_or(EditError::NotApplied)?;
            sel.set_cursor(after);
            if let Some((_, end)) = buf.delete_backward(after)? {
                sel.set_cursor(end);
            }
            trace!(target: "commands", op = "insert_newline", line = pos.line, ch = pos.ch, "invert");
        }
        Command::DeleteChar {
            pos,
            removed,
            after,
        } => {
            let after = after.ok_or(EditError::NotApplied)?;
            sel.set_cursor(after);
            match removed {
                None => {}
                Some(Deleted::Newline) => {
                    let end = buf.insert_newline(after)?;
                    sel.set_cursor(end);
                }
                Some(Deleted::Text(s)) => {
                    let end = buf.insert_char(after, s)?;
                    sel.set_cursor(end);
                }
            }
            trace!(target: "commands", op = "delete_char", line = pos.line, ch = pos.ch, "invert");
        }
        Command::DeleteSelection { span, text, after } => {
            let after = after.ok_or(EditError::NotApplied)?;
            let text = text.as_ref().ok_or(EditError::NotApplied)?;
            buf.insert_text(after, text)?;
            sel.set_selection(span.anchor, span.active);
            sel.set_cursor(span.active);
            trace!(target: "commands", op = "delete_selection", "invert");
        }
        Command::InsertText { pos, after, .. } => {
            let pos = pos.ok_or(EditError::NotApplied)?;
            let after = after.ok_or(EditError::NotApplied)?;
            buf.delete_range(pos, after)?;
            sel.set_cursor(pos);
            trace!(target: "commands", op = "insert_text", line = pos.line, ch = pos.ch, "invert");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(text: &str, cursor: Position) -> (TextBuffer, SelectionModel) {
        let buf = TextBuffer::from_text(text);
        let mut sel = SelectionModel::new();
        sel.set_cursor(cursor);
        (buf, sel)
    }

    fn round_trip(cmd: &mut Command, buf: &mut TextBuffer, sel: &mut SelectionModel) {
        let text_before = buf.text();
        let cursor_before = sel.cursor;
        apply(cmd, buf, sel).unwrap();
        invert(cmd, buf, sel).unwrap();
        assert_eq!(buf.text(), text_before);
        assert_eq!(sel.cursor, cursor_before);
    }

    #[test]
    fn insert_char_round_trip() {
        let (mut buf, mut sel) = fixture("hello", Position::new(0, 2));
        let mut cmd = Command::insert_char(Position::new(0, 2), "x");
        round_trip(&mut cmd, &mut buf, &mut sel);
    }

    #[test]
    fn insert_char_applies_and_moves_cursor() {
        let (mut buf, mut sel) = fixture("hello", Position::origin());
        let mut cmd = Command::insert_char(Position::new(0, 2), "x");
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.text(), "hexllo");
        assert_eq!(sel.cursor, Position::new(0, 3));
    }

    #[test]
    fn insert_newline_round_trip() {
        let (mut buf, mut sel) = fixture("abcd", Position::new(0, 2));
        let mut cmd = Command::insert_newline(Position::new(0, 2));
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.lines(), ["ab", "cd"]);
        assert_eq!(sel.cursor, Position::new(1, 0));
        invert(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.text(), "abcd");
        assert_eq!(sel.cursor, Position::new(0, 2));
    }

    #[test]
    fn delete_char_round_trip() {
        let (mut buf, mut sel) = fixture("hello", Position::new(0, 3));
        let mut cmd = Command::delete_char(Position::new(0, 3));
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.text(), "helo");
        assert_eq!(sel.cursor, Position::new(0, 2));
        invert(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.text(), "hello");
        assert_eq!(sel.cursor, Position::new(0, 3));
    }

    #[test]
    fn delete_char_line_merge_round_trip() {
        let (mut buf, mut sel) = fixture("ab\ncd", Position::new(1, 0));
        let mut cmd = Command::delete_char(Position::new(1, 0));
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.lines(), ["abcd"]);
        assert_eq!(sel.cursor, Position::new(0, 2));
        match &cmd {
            Command::DeleteChar { removed, .. } => {
                assert_eq!(removed, &Some(Deleted::Newline));
            }
            _ => unreachable!(),
        }
        invert(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.lines(), ["ab", "cd"]);
        assert_eq!(sel.cursor, Position::new(1, 0));
    }

    #[test]
    fn delete_char_at_origin_records_noop() {
        let (mut buf, mut sel) = fixture("ab", Position::origin());
        let mut cmd = Command::delete_char(Position::origin());
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.text(), "ab");
        invert(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.text(), "ab");
        assert_eq!(sel.cursor, Position::origin());
    }

    #[test]
    fn delete_selection_multi_line_round_trip() {
        let (mut buf, mut sel) = fixture("abc\ndef\nghi", Position::new(2, 2));
        let span = Span::new(Position::new(0, 1), Position::new(2, 2));
        sel.set_selection(span.anchor, span.active);
        let mut cmd = Command::delete_selection(span);
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.lines(), ["ai"]);
        assert_eq!(sel.cursor, Position::new(0, 1));
        assert!(!sel.has_selection());
        invert(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.lines(), ["abc", "def", "ghi"]);
        let restored = sel.selection().unwrap();
        assert_eq!(restored, span);
        assert_eq!(sel.cursor, span.active);
    }

    #[test]
    fn delete_selection_preserves_anchor_order_on_undo() {
        // Selection dragged upward: anchor after active.
        let (mut buf, mut sel) = fixture("abc\ndef", Position::new(0, 1));
        let span = Span::new(Position::new(1, 2), Position::new(0, 1));
        sel.set_selection(span.anchor, span.active);
        let mut cmd = Command::delete_selection(span);
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.lines(), ["af"]);
        invert(&mut cmd, &mut buf, &mut sel).unwrap();
        let restored = sel.selection().unwrap();
        assert_eq!(restored.anchor, Position::new(1, 2));
        assert_eq!(restored.active, Position::new(0, 1));
    }

    #[test]
    fn insert_text_multi_line_round_trip() {
        let (mut buf, mut sel) = fixture("head tail", Position::new(0, 5));
        let mut cmd = Command::insert_text("one\ntwo\nthree ");
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.lines(), ["head one", "two", "three tail"]);
        assert_eq!(sel.cursor, Position::new(2, 6));
        invert(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.text(), "head tail");
        assert_eq!(sel.cursor, Position::new(0, 5));
    }

    #[test]
    fn insert_text_replay_uses_recorded_position() {
        let (mut buf, mut sel) = fixture("xy", Position::new(0, 1));
        let mut cmd = Command::insert_text("ab");
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        invert(&mut cmd, &mut buf, &mut sel).unwrap();
        // Move the live cursor somewhere else; replay must ignore it.
        sel.set_cursor(Position::origin());
        apply(&mut cmd, &mut buf, &mut sel).unwrap();
        assert_eq!(buf.text(), "xaby");
        assert_eq!(sel.cursor, Position::new(0, 3));
    }

    #[test]
    fn invert_before_apply_fails() {
        let (mut buf, mut sel) = fixture("ab", Position::origin());
        let cmd = Command::insert_char(Position::origin(), "x");
        assert_eq!(
            invert(&cmd, &mut buf, &mut sel),
            Err(EditError::NotApplied)
        );
    }

    #[test]
    fn apply_rejects_stale_positions() {
        let (mut buf, mut sel) = fixture("ab", Position::origin());
        let mut cmd = Command::insert_char(Position::new(5, 0), "x");
        assert!(matches!(
            apply(&mut cmd, &mut buf, &mut sel),
            Err(EditError::Buffer(BufferError::LineOutOfRange { .. }))
        ));
    }
}
