//! Instruction-register byte decoding.
//!
//! The HD44780 identifies an instruction by its highest set bit:
//!
//! | Byte         | Instruction                 |
//! |--------------|-----------------------------|
//! | `0000_0001`  | Clear display               |
//! | `0000_001x`  | Return home                 |
//! | `0000_01IS`  | Entry mode set              |
//! | `0000_1DCB`  | Display on/off control      |
//! | `0001_SRxx`  | Cursor / display shift      |
//! | `001D_Nxxx`  | Function set                |
//! | `01AA_AAAA`  | Set CGRAM address           |
//! | `1AAA_AAAA`  | Set DDRAM address           |

use std::fmt;

use crate::config::{BusWidth, ConfigState, CursorStyle, DisplayPower, LineCount};
use crate::cursor::EntryDirection;

/// What a cursor/display shift moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftTarget {
    Cursor,
    Display,
}

/// A decoded instruction byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Clear,
    ReturnHome,
    EntryModeSet { direction: EntryDirection, shift: bool },
    DisplayControl { display: bool, cursor: bool, blink: bool },
    Shift { target: ShiftTarget, right: bool },
    FunctionSet { bus: BusWidth, lines: LineCount },
    SetCgramAddress(u8),
    SetDdramAddress(u8),
    Unknown(u8),
}

impl Instruction {
    pub fn decode(byte: u8) -> Self {
        if byte & 0x80 != 0 {
            Instruction::SetDdramAddress(byte & 0x7F)
        } else if byte & 0x40 != 0 {
            Instruction::SetCgramAddress(byte & 0x3F)
        } else if byte & 0x20 != 0 {
            Instruction::FunctionSet {
                bus: if byte & 0x10 != 0 { BusWidth::EightBit } else { BusWidth::FourBit },
                lines: if byte & 0x08 != 0 { LineCount::Two } else { LineCount::One },
            }
        } else if byte & 0x10 != 0 {
            Instruction::Shift {
                target: if byte & 0x08 != 0 { ShiftTarget::Display } else { ShiftTarget::Cursor },
                right: byte & 0x04 != 0,
            }
        } else if byte & 0x08 != 0 {
            Instruction::DisplayControl {
                display: byte & 0x04 != 0,
                cursor: byte & 0x02 != 0,
                blink: byte & 0x01 != 0,
            }
        } else if byte & 0x04 != 0 {
            Instruction::EntryModeSet {
                direction: if byte & 0x02 != 0 {
                    EntryDirection::Increment
                } else {
                    EntryDirection::Decrement
                },
                shift: byte & 0x01 != 0,
            }
        } else if byte & 0x02 != 0 {
            Instruction::ReturnHome
        } else if byte == 0x01 {
            Instruction::Clear
        } else {
            Instruction::Unknown(byte)
        }
    }

    /// Configuration a config-class instruction asks for, starting from
    /// `current`. `None` for every other instruction.
    ///
    /// D=0 hides the cursor regardless of the C and B bits.
    pub fn requested_config(&self, current: &ConfigState) -> Option<ConfigState> {
        let mut next = *current;
        match *self {
            Instruction::EntryModeSet { direction, .. } => next.entry = direction,
            Instruction::FunctionSet { bus, lines } => {
                next.bus_width = bus;
                next.line_count = lines;
            }
            Instruction::DisplayControl { display: false, .. } => {
                next.display_power = DisplayPower::Off;
                next.cursor_style = CursorStyle::Hidden;
            }
            Instruction::DisplayControl { display: true, cursor, blink } => {
                next.display_power = DisplayPower::On;
                next.cursor_style = if blink {
                    CursorStyle::BlinkingBlock
                } else if cursor {
                    CursorStyle::Underline
                } else {
                    CursorStyle::Hidden
                };
            }
            _ => return None,
        }
        Some(next)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Clear => write!(f, "Clear Display"),
            Instruction::ReturnHome => write!(f, "Return Home"),
            Instruction::EntryModeSet { direction, shift } => {
                write!(f, "Entry Mode: {}{}", direction, if *shift { " + shift" } else { "" })
            }
            Instruction::DisplayControl { display, cursor, blink } => write!(
                f,
                "Display Control: display={} cursor={} blink={}",
                on_off(*display),
                on_off(*cursor),
                on_off(*blink)
            ),
            Instruction::Shift { target, right } => {
                let what = match target {
                    ShiftTarget::Cursor => "Move Cursor",
                    ShiftTarget::Display => "Shift Screen",
                };
                write!(f, "{} {}", what, if *right { "Right" } else { "Left" })
            }
            Instruction::FunctionSet { bus, lines } => write!(f, "Function Set: {} + {}", bus, lines),
            Instruction::SetCgramAddress(a) => write!(f, "Set CGRAM Address 0x{:02X}", a),
            Instruction::SetDdramAddress(a) => write!(f, "Set DDRAM Address 0x{:02X}", a),
            Instruction::Unknown(b) => write!(f, "Unknown 0x{:02X}", b),
        }
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}
