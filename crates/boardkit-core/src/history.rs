//! Snapshot-based undo/redo.
//!
//! `stack[0]` is the state immediately before the most recent committed
//! action, `stack[1]` the state before the one prior, and so on. The cursor
//! is `None` while the view shows the live document and `Some(k)` once the
//! view has been undone `k + 1` steps. The live document is saved lazily the
//! first time the cursor leaves it, so redo can return there.

use crate::document::now_millis;
use std::collections::VecDeque;

/// Label of the synthetic entry handed out when redo returns to live.
pub const LIVE_ENTRY_LABEL: &str = "Current state";

/// One recorded state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<T> {
    /// Monotonic id; 0 is reserved for the synthetic live entry.
    pub id: u64,
    pub label: String,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
    pub snapshot: T,
}

/// Linear undo/redo over whole snapshots of `T`.
#[derive(Debug, Clone)]
pub struct HistoryManager<T> {
    stack: VecDeque<HistoryEntry<T>>,
    current_index: Option<usize>,
    live_snapshot: Option<T>,
    max_size: usize,
    next_id: u64,
}

impl<T: Clone> HistoryManager<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            stack: VecDeque::new(),
            current_index: None,
            live_snapshot: None,
            max_size: max_size.max(1),
            next_id: 1,
        }
    }

    /// Record `snapshot` as the state before a new action. Returns the entry id.
    ///
    /// Any redo future is discarded.
    pub fn push_state(&mut self, label: impl Into<String>, snapshot: T) -> u64 {
        if let Some(index) = self.current_index.take() {
            self.stack.drain(..index);
        }
        self.live_snapshot = None;

        let id = self.next_id;
        self.next_id += 1;
        self.stack.push_front(HistoryEntry { id, label: label.into(), timestamp: now_millis(), snapshot });
        self.stack.truncate(self.max_size);
        id
    }

    /// Step back. `current` is saved as the live state on the first step away.
    pub fn undo(&mut self, current: &T) -> Option<HistoryEntry<T>> {
        if !self.can_undo() {
            return None;
        }
        let next = match self.current_index {
            None => {
                self.live_snapshot = Some(current.clone());
                0
            }
            Some(index) => index + 1,
        };
        self.current_index = Some(next);
        self.stack.get(next).cloned()
    }

    /// Step forward. Reaching live hands back the saved live state.
    pub fn redo(&mut self) -> Option<HistoryEntry<T>> {
        let index = self.current_index?;
        if index == 0 {
            self.current_index = None;
            return self.take_live_entry();
        }
        self.current_index = Some(index - 1);
        self.stack.get(index - 1).cloned()
    }

    /// Jump straight to the entry with `id`.
    pub fn go_to_entry(&mut self, id: u64, current: &T) -> Option<HistoryEntry<T>> {
        let index = self.stack.iter().position(|e| e.id == id)?;
        if self.current_index.is_none() {
            self.live_snapshot = Some(current.clone());
        }
        self.current_index = Some(index);
        self.stack.get(index).cloned()
    }

    /// Jump back to the live state, if the view has left it.
    pub fn go_to_live(&mut self) -> Option<HistoryEntry<T>> {
        self.current_index.take()?;
        self.take_live_entry()
    }

    fn take_live_entry(&mut self) -> Option<HistoryEntry<T>> {
        self.live_snapshot.take().map(|snapshot| HistoryEntry {
            id: 0,
            label: LIVE_ENTRY_LABEL.to_string(),
            timestamp: now_millis(),
            snapshot,
        })
    }

    pub fn can_undo(&self) -> bool {
        self.current_index.map_or(0, |i| i + 1) < self.stack.len()
    }

    pub fn can_redo(&self) -> bool {
        self.current_index.is_some()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn is_at_live(&self) -> bool {
        self.current_index.is_none()
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry<T>> {
        self.stack.iter()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.current_index = None;
        self.live_snapshot = None;
    }
}
