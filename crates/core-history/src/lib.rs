//! Batched undo/redo history with idle coalescing.
//!
//! The history records [`Command`]s in *batches*: ordered, non-empty command
//! lists that undo and redo as one atomic user-perceived step. A batch is
//! open while commands accumulate and closed either explicitly
//! ([`end_batch`]) or when the gap between consecutive commands reaches the
//! idle window: rapid keystrokes coalesce into one undo step while a
//! deliberate pause starts a new one.
//!
//! Time is injected through the [`Clock`] trait rather than read from the
//! wall, so tests drive coalescing deterministically with [`ManualClock`].
//! The elapsed-gap check runs at the next [`apply`], which on the engine's
//! single logical thread is observably equivalent to a deferred timer
//! callback firing between operations.
//!
//! Ordering guarantees: commands apply in the exact order they were recorded;
//! [`undo`] inverts a batch strictly in reverse because later commands may
//! depend on positions produced by earlier ones (delete-selection-then-insert
//! during paste); [`redo`] replays in original order. The redo stack is
//! cleared whenever a command is recorded outside a redo replay, never by
//! `undo`/`redo` themselves.
//!
//! The undo stack is bounded; when it exceeds the configured depth the oldest
//! batch is dropped.
//!
//! [`apply`]: HistoryManager::apply
//! [`end_batch`]: HistoryManager::end_batch
//! [`undo`]: HistoryManager::undo
//! [`redo`]: HistoryManager::redo

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use core_buffer::TextBuffer;
use core_commands::{Command, EditError};
use core_selection::SelectionModel;
use tracing::trace;

/// Gap of user inactivity after which the open batch closes.
pub const DEFAULT_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Maximum number of closed batches retained on the undo stack.
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Source of the current instant, injected so coalescing is testable.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock advanced by hand. Clones share the same underlying instant, so a
/// test can keep a handle while the history owns the clock.
#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<Instant>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(Instant::now())))
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

/// An ordered list of commands that undoes and redoes atomically.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// Undo/redo stacks plus the currently open batch.
pub struct HistoryManager {
    undo_stack: Vec<Batch>,
    redo_stack: Vec<Batch>,
    open: Option<Batch>,
    last_add: Option<Instant>,
    idle_window: Duration,
    max_depth: usize,
    clock: Box<dyn Clock>,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_IDLE_WINDOW, DEFAULT_MAX_DEPTH, Box::new(SystemClock))
    }

    pub fn with_settings(idle_window: Duration, max_depth: usize) -> Self {
        Self::with_clock(idle_window, max_depth, Box::new(SystemClock))
    }

    pub fn with_clock(idle_window: Duration, max_depth: usize, clock: Box<dyn Clock>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open: None,
            last_add: None,
            idle_window,
            max_depth,
            clock,
        }
    }

    /// Execute a command and record it in the open batch, opening one if
    /// needed. If the idle window has elapsed since the previous command, the
    /// open batch closes first so this command starts a new undo step.
    ///
    /// On failure nothing is recorded and the stacks are untouched.
    pub fn apply(
        &mut self,
        mut cmd: Command,
        buf: &mut TextBuffer,
        sel: &mut SelectionModel,
    ) -> Result<(), EditError> {
        let now = self.clock.now();
        if self.open.is_some()
            && let Some(last) = self.last_add
            && now.duration_since(last) >= self.idle_window
        {
            trace!(target: "history", "idle_window_elapsed");
            self.end_batch();
        }
        core_commands::apply(&mut cmd, buf, sel)?;
        self.redo_stack.clear();
        self.open.get_or_insert_with(Batch::default).push(cmd);
        self.last_add = Some(now);
        trace!(
            target: "history",
            open_len = self.open.as_ref().map(Batch::len).unwrap_or(0),
            undo_depth = self.undo_stack.len(),
            "command_recorded"
        );
        Ok(())
    }

    /// Explicitly open a batch so the following commands form one undo step
    /// regardless of timing. No-op when a batch is already open.
    pub fn begin_batch(&mut self) {
        if self.open.is_none() {
            self.open = Some(Batch::default());
        }
    }

    /// Close the open batch and push it onto the undo stack. Empty or absent
    /// open batches are discarded silently. Closing is permanent for that
    /// batch instance.
    pub fn end_batch(&mut self) {
        self.last_add = None;
        if let Some(batch) = self.open.take()
            && !batch.is_empty()
        {
            self.undo_stack.push(batch);
            if self.undo_stack.len() > self.max_depth {
                self.undo_stack.remove(0);
                trace!(target: "history", "undo_stack_trimmed");
            }
            trace!(target: "history", undo_depth = self.undo_stack.len(), "batch_closed");
        }
    }

    /// Invert the most recent batch, commands in reverse order, and move it
    /// to the redo stack. Closes any open batch first. Returns `false` when
    /// there is nothing to undo.
    pub fn undo(
        &mut self,
        buf: &mut TextBuffer,
        sel: &mut SelectionModel,
    ) -> Result<bool, EditError> {
        self.end_batch();
        let Some(batch) = self.undo_stack.pop() else {
            return Ok(false);
        };
        for cmd in batch.commands.iter().rev() {
            core_commands::invert(cmd, buf, sel)?;
        }
        trace!(
            target: "history",
            undo_depth = self.undo_stack.len(),
            redo_depth = self.redo_stack.len() + 1,
            commands = batch.len(),
            "undo"
        );
        self.redo_stack.push(batch);
        Ok(true)
    }

    /// Re-execute the most recent undone batch, commands in original order,
    /// and move it back to the undo stack. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(
        &mut self,
        buf: &mut TextBuffer,
        sel: &mut SelectionModel,
    ) -> Result<bool, EditError> {
        let Some(mut batch) = self.redo_stack.pop() else {
            return Ok(false);
        };
        for cmd in batch.commands.iter_mut() {
            core_commands::apply(cmd, buf, sel)?;
        }
        trace!(
            target: "history",
            undo_depth = self.undo_stack.len() + 1,
            redo_depth = self.redo_stack.len(),
            commands = batch.len(),
            "redo"
        );
        self.undo_stack.push(batch);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || self.open.as_ref().is_some_and(|b| !b.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget all history, including any open batch. Used when a new
    /// document replaces the buffer: recorded positions would not survive
    /// the swap.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open = None;
        self.last_add = None;
        trace!(target: "history", "cleared");
    }
}
