//! Session snapshots for undo.
//!
//! The frontend pushes a [`Snapshot`] before each user action; `undo` pops
//! the most recent one. The ring keeps at most `capacity` entries and drops
//! the oldest when full.

use crate::config::ConfigState;
use crate::control::{ControlLines, DataBus};
use crate::cursor::Cursor;
use crate::ddram::Ddram;
use crate::viewport::Viewport;

/// Default number of undo steps kept.
pub const DEFAULT_CAPACITY: usize = 64;

/// A frozen copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub ddram: Ddram,
    pub cursor: Cursor,
    pub viewport: Viewport,
    pub config: ConfigState,
    pub lines: ControlLines,
    pub bus: DataBus,
    pub backlight: bool,
}

/// Ring buffer of snapshots.
pub struct History {
    buf: Vec<Option<Snapshot>>,
    /// Next slot to overwrite
    write_pos: usize,
    count: usize,
}

impl History {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        History {
            buf: vec![None; capacity.max(1)],
            write_pos: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, snap: Snapshot) {
        self.buf[self.write_pos] = Some(snap);
        self.write_pos = (self.write_pos + 1) % self.buf.len();
        if self.count < self.buf.len() {
            self.count += 1;
        }
    }

    /// Most recent snapshot, or None when there is nothing to undo.
    pub fn pop(&mut self) -> Option<Snapshot> {
        if self.count == 0 {
            return None;
        }
        self.write_pos = self.write_pos.checked_sub(1).unwrap_or(self.buf.len() - 1);
        self.count -= 1;
        self.buf[self.write_pos].take()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.buf.iter_mut().for_each(|slot| *slot = None);
        self.count = 0;
        self.write_pos = 0;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
