//! Display Data RAM (DDRAM) model.
//!
//! Two rows of 40 character codes each. Row 0 answers to DDRAM addresses
//! 0x00–0x27 and row 1 to 0x40–0x67; the address gap between them is not
//! backed by memory. Columns here are always the normalized 0–39 index.

use crate::{LcdError, Result, DDRAM_WIDTH, ROWS, SPACE};

/// Character memory for a 2-line controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ddram {
    rows: [[u8; DDRAM_WIDTH]; ROWS],
}

impl Ddram {
    pub fn new() -> Self {
        Ddram { rows: [[SPACE; DDRAM_WIDTH]; ROWS] }
    }

    /// Replace both rows with space codes.
    pub fn clear(&mut self) {
        self.rows = [[SPACE; DDRAM_WIDTH]; ROWS];
    }

    /// Store `code` at (row, column). Out-of-range targets leave memory untouched.
    pub fn write(&mut self, row: u8, column: u8, code: u8) -> Result<()> {
        let (r, c) = (row as usize, column as usize);
        if r >= ROWS || c >= DDRAM_WIDTH {
            return Err(LcdError::AddressOutOfRange { row, column });
        }
        self.rows[r][c] = code;
        Ok(())
    }

    /// Stored code, or a space for addresses outside the array.
    pub fn read(&self, row: u8, column: u8) -> u8 {
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(column as usize))
            .copied()
            .unwrap_or(SPACE)
    }

    /// Full 40-cell row. Row indices above 1 map to row 1.
    pub fn row(&self, row: u8) -> &[u8; DDRAM_WIDTH] {
        &self.rows[(row as usize).min(ROWS - 1)]
    }

    pub(crate) fn rows(&self) -> &[[u8; DDRAM_WIDTH]; ROWS] {
        &self.rows
    }

    pub(crate) fn from_rows(rows: [[u8; DDRAM_WIDTH]; ROWS]) -> Self {
        Ddram { rows }
    }

    /// Hex dump of both rows, ten cells per group.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (r, row) in self.rows.iter().enumerate() {
            let base = if r == 0 { 0x00 } else { 0x40 };
            for (chunk_idx, chunk) in row.chunks(10).enumerate() {
                out.push_str(&format!("{:02X}:", base + chunk_idx * 10));
                for b in chunk {
                    out.push_str(&format!(" {:02X}", b));
                }
                out.push('\n');
            }
        }
        out
    }
}

impl Default for Ddram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_all_spaces() {
        let ram = Ddram::new();
        assert!(ram.row(0).iter().all(|&b| b == SPACE));
        assert!(ram.row(1).iter().all(|&b| b == SPACE));
    }

    #[test]
    fn test_write_and_read() {
        let mut ram = Ddram::new();
        ram.write(1, 39, 0x41).unwrap();
        assert_eq!(ram.read(1, 39), 0x41);
        assert_eq!(ram.read(0, 39), SPACE);
    }

    #[test]
    fn test_out_of_range_write_is_rejected() {
        let mut ram = Ddram::new();
        let before = ram.clone();
        assert!(matches!(
            ram.write(0, 40, 0x41),
            Err(LcdError::AddressOutOfRange { row: 0, column: 40 })
        ));
        assert!(ram.write(2, 0, 0x41).is_err());
        assert_eq!(ram, before);
    }

    #[test]
    fn test_out_of_range_read_is_space() {
        let ram = Ddram::new();
        assert_eq!(ram.read(0, 200), SPACE);
        assert_eq!(ram.read(5, 0), SPACE);
    }

    #[test]
    fn test_clear_restores_spaces() {
        let mut ram = Ddram::new();
        for c in 0..40 {
            ram.write(0, c, b'x').unwrap();
            ram.write(1, c, b'y').unwrap();
        }
        ram.clear();
        assert_eq!(ram, Ddram::new());
    }

    #[test]
    fn test_dump_addresses() {
        let mut ram = Ddram::new();
        ram.write(1, 0, 0x41).unwrap();
        let dump = ram.dump();
        assert!(dump.starts_with("00: 20"));
        assert!(dump.contains("40: 41 20"));
    }
}
