//! The edit engine facade.
//!
//! [`EditEngine`] owns the buffer, the selection, the undo history, and the
//! search index, and exposes the operations a frontend binds keys and UI
//! events to. Every mutation routes through the history layer so it lands in
//! an undo batch; every mutation also refreshes the search index when a
//! search is active, so match offsets never go stale against the buffer.
//!
//! The engine is deliberately frontend-agnostic. It knows nothing about
//! rendering, key maps, or the clipboard: `paste` and `cut` move strings, and
//! what those strings came from or go to is the caller's business.

use core_buffer::{BufferError, Position, TextBuffer};
use core_commands::{Command, EditError};
use core_config::EngineConfig;
use core_history::{Clock, HistoryManager};
use core_search::{Match, SearchIndex};
use core_selection::{Direction, SelectionModel, Span};
use tracing::{debug, trace};

pub use core_buffer::Deleted;
pub use core_commands::EditError as EngineError;

/// Cursor and selection state in one restorable unit, as persisted alongside
/// document content between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub cursor: Position,
    pub selection: Option<Span>,
}

pub struct EditEngine {
    buffer: TextBuffer,
    selection: SelectionModel,
    history: HistoryManager,
    search: SearchIndex,
}

impl EditEngine {
    /// Engine over `text` with default history settings.
    pub fn new(text: &str) -> Self {
        Self::with_config(text, &EngineConfig::default())
    }

    pub fn with_config(text: &str, cfg: &EngineConfig) -> Self {
        Self {
            buffer: TextBuffer::from_text(text),
            selection: SelectionModel::new(),
            history: HistoryManager::with_settings(cfg.idle_window(), cfg.max_depth()),
            search: SearchIndex::new(),
        }
    }

    /// Engine with an injected clock, used by tests to drive the idle window
    /// deterministically.
    pub fn with_clock(text: &str, cfg: &EngineConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            buffer: TextBuffer::from_text(text),
            selection: SelectionModel::new(),
            history: HistoryManager::with_clock(cfg.idle_window(), cfg.max_depth(), clock),
            search: SearchIndex::new(),
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn cursor(&self) -> Position {
        self.selection.cursor
    }

    pub fn selection(&self) -> Option<Span> {
        self.selection.selection()
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Type `text` at the cursor. With an active selection the typed text
    /// replaces it, and both steps form a single undo batch.
    pub fn type_char(&mut self, text: &str) -> Result<(), EditError> {
        if self.selection.has_selection() {
            return self.paste(text);
        }
        let cursor = self.selection.cursor;
        self.history
            .apply(Command::insert_char(cursor, text), &mut self.buffer, &mut self.selection)?;
        self.after_edit();
        Ok(())
    }

    /// Split the cursor's line at the cursor. With an active selection the
    /// selection is replaced by the newline, as one undo batch.
    pub fn insert_newline(&mut self) -> Result<(), EditError> {
        if self.selection.has_selection() {
            return self.paste("\n");
        }
        let cursor = self.selection.cursor;
        self.history
            .apply(Command::insert_newline(cursor), &mut self.buffer, &mut self.selection)?;
        self.after_edit();
        Ok(())
    }

    /// Backspace: delete the active selection if any, otherwise the grapheme
    /// before the cursor (merging lines at a line start). At the document
    /// origin this is a no-op and records nothing.
    pub fn delete_backward(&mut self) -> Result<(), EditError> {
        if self.selection.has_selection() {
            return self.delete_selection();
        }
        let cursor = self.selection.cursor;
        if cursor == Position::origin() {
            return Ok(());
        }
        self.history
            .apply(Command::delete_char(cursor), &mut self.buffer, &mut self.selection)?;
        self.after_edit();
        Ok(())
    }

    /// Delete the active selection. No-op without one.
    pub fn delete_selection(&mut self) -> Result<(), EditError> {
        let Some(span) = self.selection.selection() else {
            return Ok(());
        };
        self.history
            .apply(Command::delete_selection(span), &mut self.buffer, &mut self.selection)?;
        self.after_edit();
        Ok(())
    }

    /// Insert `text` at the cursor, replacing the active selection if any.
    /// The whole operation is one undo batch, closed on both sides so it
    /// never merges with surrounding typing. Empty `text` is a no-op.
    pub fn paste(&mut self, text: &str) -> Result<(), EditError> {
        if text.is_empty() {
            return Ok(());
        }
        self.history.end_batch();
        self.history.begin_batch();
        if let Some(span) = self.selection.selection() {
            self.history
                .apply(Command::delete_selection(span), &mut self.buffer, &mut self.selection)?;
        }
        self.history
            .apply(Command::insert_text(text), &mut self.buffer, &mut self.selection)?;
        self.history.end_batch();
        debug!(target: "engine", bytes = text.len(), "paste");
        self.after_edit();
        Ok(())
    }

    /// Text covered by the active selection, or `None` without one.
    pub fn selected_text(&self) -> Result<Option<String>, EditError> {
        match self.selection.normalize() {
            Ok((start, end)) => Ok(Some(self.buffer.slice_text(start, end)?)),
            Err(_) => Ok(None),
        }
    }

    /// Text covered by the active selection, read without mutating anything.
    /// The clipboard adapter's copy operation.
    pub fn copy(&self) -> Result<Option<String>, EditError> {
        self.selected_text()
    }

    /// Remove and return the active selection's text as its own undo batch.
    /// Returns `None` (and changes nothing) without a selection.
    pub fn cut(&mut self) -> Result<Option<String>, EditError> {
        let Some(text) = self.selected_text()? else {
            return Ok(None);
        };
        self.history.end_batch();
        self.history.begin_batch();
        self.delete_selection()?;
        self.history.end_batch();
        debug!(target: "engine", bytes = text.len(), "cut");
        Ok(Some(text))
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Revert the most recent undo batch. Returns `false` when the history
    /// is empty.
    pub fn undo(&mut self) -> Result<bool, EditError> {
        let changed = self.history.undo(&mut self.buffer, &mut self.selection)?;
        if changed {
            self.refresh_search();
        }
        Ok(changed)
    }

    /// Re-apply the most recent undone batch.
    pub fn redo(&mut self) -> Result<bool, EditError> {
        let changed = self.history.redo(&mut self.buffer, &mut self.selection)?;
        if changed {
            self.refresh_search();
        }
        Ok(changed)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Open an explicit batch: subsequent edits form one undo step until
    /// [`end_batch`] regardless of timing.
    ///
    /// [`end_batch`]: EditEngine::end_batch
    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    // ------------------------------------------------------------------
    // Cursor and selection
    // ------------------------------------------------------------------

    /// Move the cursor one step. With an active selection, left collapses to
    /// the selection start and right to its end without a step; up and down
    /// clear the selection and move from the cursor.
    pub fn move_cursor(&mut self, dir: Direction) {
        if self.selection.has_selection() {
            match dir {
                Direction::Left => {
                    self.selection.move_cursor_to_selection_start();
                    return;
                }
                Direction::Right => {
                    self.selection.move_cursor_to_selection_end();
                    return;
                }
                Direction::Up | Direction::Down => self.selection.clear_selection(),
            }
        }
        self.selection.move_cursor(dir, &self.buffer);
    }

    /// Extend (or shrink) the selection by one step of its active end.
    pub fn extend_selection(&mut self, dir: Direction) {
        self.selection.extend(dir, &self.buffer);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear_selection();
    }

    /// Set an explicit selection, as from a pointer drag. Both ends are
    /// validated against the buffer and the cursor lands at the active end.
    pub fn select(&mut self, anchor: Position, active: Position) -> Result<(), BufferError> {
        self.buffer.validate(anchor)?;
        self.buffer.validate(active)?;
        self.selection.set_selection(anchor, active);
        self.selection.set_cursor(active);
        Ok(())
    }

    /// Place the cursor, clearing any selection. The position is validated
    /// against the buffer.
    pub fn set_cursor(&mut self, pos: Position) -> Result<(), BufferError> {
        self.buffer.validate(pos)?;
        self.selection.clear_selection();
        self.selection.set_cursor(pos);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Document lifecycle
    // ------------------------------------------------------------------

    /// Replace the whole document. The cursor returns to the origin, and the
    /// history and search index reset: edits to the previous document must
    /// not be undoable into the new one.
    pub fn load(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.selection = SelectionModel::new();
        self.history.clear();
        self.search.clear();
        debug!(target: "engine", lines = self.buffer.line_count(), "load");
    }

    /// Snapshot cursor and selection for persistence.
    pub fn caret(&self) -> Caret {
        Caret {
            cursor: self.selection.cursor,
            selection: self.selection.selection(),
        }
    }

    /// Restore a persisted caret. Positions are validated against the
    /// current buffer: a stale snapshot is rejected rather than clamped.
    pub fn restore_caret(&mut self, caret: Caret) -> Result<(), BufferError> {
        self.buffer.validate(caret.cursor)?;
        if let Some(span) = caret.selection {
            self.buffer.validate(span.anchor)?;
            self.buffer.validate(span.active)?;
        }
        self.selection.set_cursor(caret.cursor);
        match caret.selection {
            Some(span) => self.selection.set_selection(span.anchor, span.active),
            None => self.selection.clear_selection(),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Set the search term and move the cursor to the start of the first
    /// match, if any. An empty term clears the search.
    pub fn search(&mut self, term: &str) {
        self.search.search(&self.buffer, term);
        self.follow_current_match();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    /// Advance to the next match cyclically, moving the cursor to it.
    pub fn next_match(&mut self) -> Option<Match> {
        let m = self.search.next();
        self.follow_current_match();
        m
    }

    /// Retreat to the previous match cyclically, moving the cursor to it.
    pub fn prev_match(&mut self) -> Option<Match> {
        let m = self.search.prev();
        self.follow_current_match();
        m
    }

    pub fn matches(&self) -> &[Match] {
        self.search.matches()
    }

    pub fn current_match(&self) -> Option<Match> {
        self.search.current()
    }

    pub fn current_match_index(&self) -> Option<usize> {
        self.search.current_index()
    }

    fn follow_current_match(&mut self) {
        if let Some(m) = self.search.current() {
            self.selection.clear_selection();
            self.selection.set_cursor(Position::new(m.line, m.start));
            trace!(target: "engine", line = m.line, ch = m.start, "cursor_to_match");
        }
    }

    fn after_edit(&mut self) {
        self.refresh_search();
    }

    fn refresh_search(&mut self) {
        if self.search.is_active() {
            self.search.refresh(&self.buffer);
        }
    }
}
