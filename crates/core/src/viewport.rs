//! Visible window over the 40-column DDRAM.
//!
//! The panel shows 16 columns starting at `offset`. After any operation
//! that moves the cursor the window slides the minimum amount needed to
//! keep the cursor column on screen.

use serde::{Deserialize, Serialize};

use crate::{DDRAM_WIDTH, VISIBLE_COLS};

/// Largest valid window offset (40 - 16).
pub const MAX_OFFSET: u8 = (DDRAM_WIDTH - VISIBLE_COLS) as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    offset: u8,
}

impl Viewport {
    pub fn new() -> Self {
        Viewport { offset: 0 }
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Slide the window so `column` is visible.
    pub fn follow(&mut self, column: u8) {
        self.offset = auto_scroll(column, self.offset);
    }

    /// Display shift left: content moves left, window start moves right.
    pub fn shift_left(&mut self) {
        if self.offset < MAX_OFFSET {
            self.offset += 1;
        }
    }

    /// Display shift right: window start moves back towards column 0.
    pub fn shift_right(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    /// Whether `column` falls inside the window.
    pub fn contains(&self, column: u8) -> bool {
        column >= self.offset && column < self.offset + VISIBLE_COLS as u8
    }

    pub(crate) fn from_offset(offset: u8) -> Self {
        Viewport { offset: offset.min(MAX_OFFSET) }
    }
}

/// New window offset that reveals `cursor_column`, clamped to [0, 24].
pub fn auto_scroll(cursor_column: u8, current_offset: u8) -> u8 {
    let width = VISIBLE_COLS as u8;
    let new_offset = if cursor_column >= current_offset.saturating_add(width) {
        cursor_column - (width - 1)
    } else if cursor_column < current_offset {
        cursor_column
    } else {
        current_offset
    };
    new_offset.min(MAX_OFFSET)
}
