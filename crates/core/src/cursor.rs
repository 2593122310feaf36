//! Address counter / cursor engine.
//!
//! The controller addresses DDRAM with a 7-bit counter where row 0 spans
//! 0x00–0x27 and row 1 spans 0x40–0x67. The cursor keeps the row plus a
//! normalized 0–39 column; stepping is done in raw address space so the
//! 0x28–0x3F gap can be detected and clamped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LcdError, DDRAM_WIDTH, ROW1_OFFSET};

const LAST_COL: u8 = (DDRAM_WIDTH - 1) as u8;

/// Direction the address counter moves after each data write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryDirection {
    #[default]
    Increment,
    Decrement,
}

impl EntryDirection {
    /// Entry Mode Set command for this direction (no display shift).
    pub fn command(self) -> u8 {
        match self {
            EntryDirection::Increment => 0x06,
            EntryDirection::Decrement => 0x04,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryDirection::Increment => "Left to Right (Inc)",
            EntryDirection::Decrement => "Right to Left (Dec)",
        }
    }
}

impl fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntryDirection {
    type Err = LcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s.contains("inc") || s == "ltr" || s == "+" {
            Ok(EntryDirection::Increment)
        } else if s.contains("dec") || s == "rtl" || s == "-" {
            Ok(EntryDirection::Decrement)
        } else {
            Err(LcdError::InvalidValue { field: "entry mode", value: s })
        }
    }
}

/// Cursor position: row 0/1 and internal column 0–39.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub row: u8,
    pub column: u8,
}

impl Cursor {
    pub fn new() -> Self {
        Cursor { row: 0, column: 0 }
    }

    /// Back to (0, 0).
    pub fn home(&mut self) {
        *self = Cursor::new();
    }

    /// Load the address counter from a 7-bit DDRAM address.
    ///
    /// Addresses below 0x40 select row 0, the rest row 1. Addresses that
    /// point into the unbacked tail of a row (0x28–0x3F, 0x68–0x7F) pin
    /// the column to 39.
    pub fn set_address(&mut self, raw: u8) {
        let raw = raw & 0x7F;
        let offset = ROW1_OFFSET as u8;
        let (row, column) = if raw < offset { (0, raw) } else { (1, raw - offset) };
        self.row = row;
        self.column = column.min(LAST_COL);
    }

    /// Raw DDRAM address the cursor currently points at.
    pub fn address(&self) -> u8 {
        if self.row == 0 {
            self.column
        } else {
            ROW1_OFFSET as u8 + self.column
        }
    }

    /// Step once in `direction`, as after a data write or a cursor shift.
    pub fn advance(&mut self, direction: EntryDirection) {
        let addr = self.address() as i16;
        let next = match direction {
            EntryDirection::Increment => addr + 1,
            EntryDirection::Decrement => addr - 1,
        };
        self.settle(next);
    }

    /// Apply the boundary policy to a stepped raw address.
    fn settle(&mut self, addr: i16) {
        let width = DDRAM_WIDTH as i16;
        let offset = ROW1_OFFSET as i16;
        if addr < 0 {
            self.column = 0;
        } else if addr < width {
            self.row = 0;
            self.column = addr as u8;
        } else if addr < offset {
            // gap between the rows: park on row 0's last cell
            self.row = 0;
            self.column = LAST_COL;
        } else {
            self.row = 1;
            self.column = ((addr - offset) as u8).min(LAST_COL);
        }
    }
}

/// Set DDRAM Address command selecting (row, column); column is capped at 39.
pub fn ddram_address_command(row: u8, column: u8) -> u8 {
    let base = if row == 0 { 0x00 } else { ROW1_OFFSET as u8 };
    0x80 | base | column.min(LAST_COL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_address_row0() {
        let mut c = Cursor::new();
        c.set_address(0x0F);
        assert_eq!(c, Cursor { row: 0, column: 15 });
    }

    #[test]
    fn test_set_address_row1() {
        let mut c = Cursor::new();
        c.set_address(0xCF & 0x7F);
        assert_eq!(c, Cursor { row: 1, column: 15 });
        assert_eq!(c.address(), 0x4F);
    }

    #[test]
    fn test_set_address_in_gap_is_capped() {
        let mut c = Cursor::new();
        c.set_address(0x30);
        assert_eq!(c, Cursor { row: 0, column: 39 });
        c.set_address(0x7F);
        assert_eq!(c, Cursor { row: 1, column: 39 });
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut c = Cursor::new();
        c.advance(EntryDirection::Increment);
        assert_eq!(c, Cursor { row: 0, column: 1 });

        let mut c = Cursor { row: 0, column: 5 };
        c.advance(EntryDirection::Decrement);
        assert_eq!(c, Cursor { row: 0, column: 4 });
    }

    #[test]
    fn test_decrement_at_origin_clamps() {
        let mut c = Cursor::new();
        c.advance(EntryDirection::Decrement);
        assert_eq!(c, Cursor { row: 0, column: 0 });
    }

    #[test]
    fn test_increment_into_gap_stays_on_row0() {
        let mut c = Cursor { row: 0, column: 39 };
        c.advance(EntryDirection::Increment);
        assert_eq!(c, Cursor { row: 0, column: 39 });
    }

    #[test]
    fn test_row1_increment_clamps_at_end() {
        let mut c = Cursor { row: 1, column: 39 };
        c.advance(EntryDirection::Increment);
        assert_eq!(c, Cursor { row: 1, column: 39 });
    }

    #[test]
    fn test_row1_decrement_from_start_enters_gap() {
        // 0x40 - 1 = 0x3F lands in the gap, which resolves to row 0
        let mut c = Cursor { row: 1, column: 0 };
        c.advance(EntryDirection::Decrement);
        assert_eq!(c, Cursor { row: 0, column: 39 });
    }

    #[test]
    fn test_row1_steps_stay_on_row1() {
        let mut c = Cursor { row: 1, column: 10 };
        c.advance(EntryDirection::Increment);
        assert_eq!(c, Cursor { row: 1, column: 11 });
        c.advance(EntryDirection::Decrement);
        c.advance(EntryDirection::Decrement);
        assert_eq!(c, Cursor { row: 1, column: 9 });
    }

    #[test]
    fn test_ddram_address_command() {
        assert_eq!(ddram_address_command(0, 0), 0x80);
        assert_eq!(ddram_address_command(1, 15), 0xCF);
        assert_eq!(ddram_address_command(0, 60), 0x80 | 39);
    }

    #[test]
    fn test_entry_direction_parse() {
        assert_eq!("Left to Right (Inc)".parse::<EntryDirection>().unwrap(), EntryDirection::Increment);
        assert_eq!("dec".parse::<EntryDirection>().unwrap(), EntryDirection::Decrement);
        assert!("sideways".parse::<EntryDirection>().is_err());
    }

    proptest! {
        #[test]
        fn prop_column_always_in_range(
            start in 0u8..0x80,
            steps in proptest::collection::vec(any::<bool>(), 0..200),
        ) {
            let mut c = Cursor::new();
            c.set_address(start);
            prop_assert!(c.column <= 39);
            for inc in steps {
                let dir = if inc { EntryDirection::Increment } else { EntryDirection::Decrement };
                c.advance(dir);
                prop_assert!(c.column <= 39);
                prop_assert!(c.row <= 1);
            }
        }
    }
}
