//! Control wires (RS, R/W, E) and the manually toggled 8-bit data bus.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Register-select, read/write and enable lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlLines {
    /// RS: true selects the data register, false the instruction register
    pub register_select: bool,
    /// R/W: true is read, false is write
    pub read_write: bool,
    /// E: a High→Low transition latches the bus
    pub enable: bool,
}

impl ControlLines {
    pub fn new() -> Self {
        ControlLines { register_select: true, read_write: false, enable: false }
    }

    /// RS=1, R/W=0: a strobe writes data.
    pub fn is_data_write(&self) -> bool {
        self.register_select && !self.read_write
    }

    /// Update E and report whether this was a falling edge.
    pub fn set_enable(&mut self, level: bool) -> bool {
        let falling = self.enable && !level;
        self.enable = level;
        falling
    }
}

impl Default for ControlLines {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ControlLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RS={} RW={} EN={}",
            self.register_select as u8, self.read_write as u8, self.enable as u8
        )
    }
}

/// D7..D0 as individual switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBus {
    value: u8,
}

impl DataBus {
    pub fn new() -> Self {
        // power-on switch positions: 0000_1100
        DataBus { value: 0x0C }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    pub fn line(&self, index: u8) -> bool {
        index < 8 && self.value & (1 << index) != 0
    }

    /// Flip D`index`. Indices above 7 are ignored.
    pub fn toggle(&mut self, index: u8) {
        if index < 8 {
            self.value ^= 1 << index;
        }
    }

    /// Read an MSB-first string of eight `0`/`1` characters.
    pub fn from_bit_string(bits: &str) -> Option<Self> {
        let bits = bits.trim();
        if bits.len() != 8 {
            return None;
        }
        let mut value = 0u8;
        for c in bits.chars() {
            value = (value << 1)
                | match c {
                    '0' => 0,
                    '1' => 1,
                    _ => return None,
                };
        }
        Some(DataBus { value })
    }

    /// MSB-first bit string, D7 first.
    pub fn bit_string(&self) -> String {
        format!("{:08b}", self.value)
    }
}

impl Default for DataBus {
    fn default() -> Self {
        Self::new()
    }
}
