//! Literal substring search over a text buffer.
//!
//! The index holds the ordered match list for one active term plus a cyclic
//! current-match pointer. Matching is case-sensitive, literal (no pattern
//! syntax), and non-overlapping: each line is scanned by repeated forward
//! substring search resuming after the previous match.
//!
//! Re-running [`search`] fully replaces the match list. No incremental
//! diffing is attempted: recomputation is linear in document size and only
//! triggered by explicit, user-paced actions (keystrokes in a search field or
//! an edit made while a search is active).
//!
//! [`search`]: SearchIndex::search

use core_buffer::TextBuffer;
use tracing::trace;

/// One occurrence of the active term: line index plus byte offsets within
/// that line (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// Ordered matches for the active term plus the cyclic current pointer.
#[derive(Debug, Default, Clone)]
pub struct SearchIndex {
    term: String,
    matches: Vec<Match>,
    current: Option<usize>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// True once a non-empty term has been set.
    pub fn is_active(&self) -> bool {
        !self.term.is_empty()
    }

    /// Matches in line-then-column order.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<Match> {
        self.current.map(|i| self.matches[i])
    }

    /// Replace the active term and rescan. An empty term clears everything.
    /// The current pointer resets to the first match, if any.
    pub fn search(&mut self, buf: &TextBuffer, term: &str) {
        self.term.clear();
        self.term.push_str(term);
        self.scan(buf);
        self.current = if self.matches.is_empty() { None } else { Some(0) };
        trace!(target: "search", term = %self.term, count = self.matches.len(), "search");
    }

    /// Drop the term, the matches, and the pointer.
    pub fn clear(&mut self) {
        self.term.clear();
        self.matches.clear();
        self.current = None;
    }

    /// Rescan the buffer for the unchanged term after the buffer mutated.
    /// The current pointer is retained while still in range, otherwise it
    /// falls back to the first match.
    pub fn refresh(&mut self, buf: &TextBuffer) {
        if !self.is_active() {
            return;
        }
        self.scan(buf);
        self.current = match self.current {
            Some(i) if i < self.matches.len() => Some(i),
            _ if self.matches.is_empty() => None,
            _ => Some(0),
        };
        trace!(target: "search", count = self.matches.len(), "refresh");
    }

    fn scan(&mut self, buf: &TextBuffer) {
        self.matches.clear();
        if self.term.is_empty() {
            return;
        }
        for (line_idx, line) in buf.lines().iter().enumerate() {
            let mut from = 0;
            while let Some(found) = line[from..].find(&self.term) {
                let start = from + found;
                let end = start + self.term.len();
                self.matches.push(Match {
                    line: line_idx,
                    start,
                    end,
                });
                from = end;
            }
        }
    }

    /// Advance the current pointer cyclically and return the new current
    /// match. No-op when there are no matches.
    pub fn next(&mut self) -> Option<Match> {
        self.step(1)
    }

    /// Retreat the current pointer cyclically.
    pub fn prev(&mut self) -> Option<Match> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Option<Match> {
        let len = self.matches.len();
        let i = self.current?;
        let next = (i as isize + delta).rem_euclid(len as isize) as usize;
        self.current = Some(next);
        Some(self.matches[next])
    }
}
