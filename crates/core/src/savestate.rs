//! Save state (quick save / quick load) for a display session.
//!
//! Captures the full controller state to a file using bincode serialization
//! with deflate compression.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "LCDS"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```
//!
//! Loading re-checks every session invariant, so a hand-edited or corrupt
//! file can never put the cursor in the address gap or break the
//! display/cursor coupling.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ConfigState;
use crate::control::{ControlLines, DataBus};
use crate::cursor::Cursor;
use crate::viewport::MAX_OFFSET;
use crate::{LcdError, Result, DDRAM_WIDTH, ROWS};

/// Magic bytes identifying an lcdsim save state file.
const MAGIC: &[u8; 4] = b"LCDS";
/// Current save state format version.
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

/// Everything needed to rebuild an [`crate::Lcd`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    /// Row 0 followed by row 1, 40 codes each
    pub ddram: Vec<u8>,
    pub cursor: Cursor,
    pub offset: u8,
    pub config: ConfigState,
    pub lines: ControlLines,
    pub bus: DataBus,
    pub backlight: bool,
}

impl SaveState {
    pub fn validate(&self) -> Result<()> {
        if self.ddram.len() != DDRAM_WIDTH * ROWS {
            return Err(LcdError::SaveState(format!(
                "DDRAM holds {} bytes (expected {})",
                self.ddram.len(),
                DDRAM_WIDTH * ROWS
            )));
        }
        if self.cursor.row as usize >= ROWS || self.cursor.column as usize >= DDRAM_WIDTH {
            return Err(LcdError::SaveState(format!(
                "cursor R{}, C{} outside DDRAM",
                self.cursor.row, self.cursor.column
            )));
        }
        if self.offset > MAX_OFFSET {
            return Err(LcdError::SaveState(format!(
                "viewport offset {} exceeds {}",
                self.offset, MAX_OFFSET
            )));
        }
        if !self.config.is_consistent() {
            return Err(LcdError::SaveState(format!(
                "{} with cursor {} is not a valid configuration",
                self.config.display_power, self.config.cursor_style
            )));
        }
        Ok(())
    }
}

/// Encode a save state into the on-disk byte layout.
pub fn to_bytes(state: &SaveState) -> Result<Vec<u8>> {
    let payload = bincode::serialize(state)
        .map_err(|e| LcdError::SaveState(format!("serialize: {}", e)))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Decode and validate the on-disk byte layout.
pub fn from_bytes(data: &[u8]) -> Result<SaveState> {
    if data.len() < HEADER_LEN {
        return Err(LcdError::SaveState("file too small".into()));
    }
    if &data[0..4] != MAGIC {
        return Err(LcdError::SaveState("bad magic".into()));
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(LcdError::SaveState(format!(
            "unsupported version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[HEADER_LEN..])
        .map_err(|e| LcdError::SaveState(format!("decompress: {:?}", e)))?;

    let state: SaveState = bincode::deserialize(&decompressed)
        .map_err(|e| LcdError::SaveState(format!("deserialize: {}", e)))?;
    state.validate()?;
    Ok(state)
}

pub fn save_to_file(state: &SaveState, path: &Path) -> Result<()> {
    let bytes = to_bytes(state)?;
    std::fs::write(path, bytes)?;
    log::info!("saved state to {}", path.display());
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<SaveState> {
    let data = std::fs::read(path)?;
    from_bytes(&data)
}
