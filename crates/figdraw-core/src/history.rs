//! Bounded undo/redo history of executed commands.
//!
//! Commands live in a fixed-capacity ring buffer. Slots `0..cursor`
//! (counted from the oldest entry) are applied and undoable; slots
//! `cursor..len` are the redo branch, discarded by the next `record`.
//! When the buffer is full the oldest command is evicted in O(1); its
//! effect stays in the document but can never be undone again.

use tracing::{debug, warn};

use crate::command::{Command, CommandError};
use crate::document::Document;

pub const DEFAULT_MAX_SIZE: usize = 50;

/// Ring buffer of executed commands
#[derive(Debug, Clone)]
pub struct History {
    slots: Vec<Option<Command>>,
    /// Physical index of the oldest entry
    head: usize,
    len: usize,
    /// Number of entries currently applied (current index + 1)
    cursor: usize,
}

impl History {
    /// Create an empty history holding at most `max_size` commands (minimum 1)
    pub fn new(max_size: usize) -> Self {
        let capacity = max_size.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            cursor: 0,
        }
    }

    fn slot(&self, logical: usize) -> usize {
        (self.head + logical) % self.slots.len()
    }

    /// Occupied entry at a logical index below `len`
    fn entry_mut(&mut self, logical: usize) -> Result<&mut Command, CommandError> {
        let idx = self.slot(logical);
        self.slots[idx]
            .as_mut()
            .ok_or(CommandError::MissingHistoryEntry(logical))
    }

    /// Append an executed command, discarding the redo branch.
    ///
    /// Returns the command evicted to stay within capacity, if any.
    pub fn record(&mut self, command: Command) -> Option<Command> {
        for logical in self.cursor..self.len {
            let idx = self.slot(logical);
            self.slots[idx] = None;
        }
        if self.len > self.cursor {
            debug!(discarded = self.len - self.cursor, "discarded redo branch");
        }
        self.len = self.cursor;

        let mut evicted = None;
        if self.len == self.slots.len() {
            evicted = self.slots[self.head].take();
            self.head = (self.head + 1) % self.slots.len();
            self.len -= 1;
            self.cursor -= 1;
            if let Some(old) = &evicted {
                warn!(command = %old.id(), kind = %old.command_type(), "history full, oldest command can no longer be undone");
            }
        }

        let idx = self.slot(self.len);
        self.slots[idx] = Some(command);
        self.len += 1;
        self.cursor = self.len;
        evicted
    }

    /// Undo the most recent applied command.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. On error the
    /// history position is unchanged.
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool, CommandError> {
        if self.cursor == 0 {
            return Ok(false);
        }
        self.entry_mut(self.cursor - 1)?.undo(doc)?;
        self.cursor -= 1;
        Ok(true)
    }

    /// Redo the next command in the redo branch.
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool, CommandError> {
        if self.cursor == self.len {
            return Ok(false);
        }
        self.entry_mut(self.cursor)?.redo(doc)?;
        self.cursor += 1;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.len
    }

    /// Index of the last applied command, `None` when nothing is applied
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_size(&self) -> usize {
        self.slots.len()
    }

    /// Command at logical index (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&Command> {
        if index >= self.len {
            return None;
        }
        self.slots[self.slot(index)].as_ref()
    }

    /// Iterate commands from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Number of commands that can be undone
    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    /// Number of commands that can be redone
    pub fn redo_count(&self) -> usize {
        self.len - self.cursor
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
        self.cursor = 0;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}
