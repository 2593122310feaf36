//! Log-worthy events emitted by the controller.
//!
//! The core never decides how many lines are kept or how they are shown;
//! it queues [`Event`]s and a [`LogSink`] collaborator consumes them.

use std::fmt;

use crate::config::{BusWidth, LineCount};
use crate::control::ControlLines;
use crate::input::{to_hex_str, InputFormat};
use crate::instruction::Instruction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CommandSent(u8),
    ConfigCommand(Instruction),
    UnknownCommand(u8),
    CgramIgnored(u8),
    DataSent { format: InputFormat, text: String },
    ParseError { format: InputFormat, input: String },
    InvalidCommand(String),
    WriteOutOfRange { row: u8, column: u8 },
    CursorSet { row: u8, column: u8 },
    FunctionSet { bus: BusWidth, lines: LineCount },
    CursorForcedHidden,
    DisplayForcedOn,
    EnableLevel(bool),
    Pulse,
    Latched(u8),
    NonOperativePulse(ControlLines),
    ReadIgnored(ControlLines),
    Backlight(bool),
}

impl Event {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Event::ParseError { .. } | Event::InvalidCommand(_) | Event::WriteOutOfRange { .. }
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::CommandSent(b) => write!(f, "Sending Command: {}", to_hex_str(*b)),
            Event::ConfigCommand(i) => write!(f, "{}", i),
            Event::UnknownCommand(b) => write!(f, "Unrecognized command {} ignored", to_hex_str(*b)),
            Event::CgramIgnored(a) => write!(f, "CGRAM address 0x{:02X} not emulated", a),
            Event::DataSent { format, text } => write!(f, "Sending {}: '{}'...", format, text),
            Event::ParseError { format, input } => {
                write!(f, "Error: '{}' is not valid {} input", input, format)
            }
            Event::InvalidCommand(text) => write!(f, "Error: invalid command '{}'", text),
            Event::WriteOutOfRange { row, column } => {
                write!(f, "Error: write to R{}, C{} outside DDRAM ignored", row, column)
            }
            Event::CursorSet { row, column } => {
                write!(f, "Cursor set to: R{}, C{} (Internal DDRAM Address)", row, column)
            }
            Event::FunctionSet { bus, lines } => {
                write!(f, "Function Set determined by: {} + {}", bus, lines)
            }
            Event::CursorForcedHidden => write!(f, "Display OFF requires cursor Hidden"),
            Event::DisplayForcedOn => write!(f, "Visible cursor requires Display ON"),
            Event::EnableLevel(high) => {
                write!(f, "EN Line set to {}", if *high { "HIGH" } else { "LOW" })
            }
            Event::Pulse => write!(f, "Pulse: EN (High -> Low)"),
            Event::Latched(b) => write!(f, "Data bus latched: {} ({:08b})", to_hex_str(*b), b),
            Event::NonOperativePulse(lines) => {
                write!(f, "Pulse with {} selects no data write", lines)
            }
            Event::ReadIgnored(lines) => write!(f, "Read mode ({}): nothing written", lines),
            Event::Backlight(on) => {
                write!(f, "Backlight turned {}", if *on { "ON" } else { "OFF" })
            }
        }
    }
}

/// Consumer of controller events.
pub trait LogSink {
    fn log(&mut self, event: &Event);
}

impl LogSink for Vec<String> {
    fn log(&mut self, event: &Event) {
        self.push(event.to_string());
    }
}

impl LogSink for Vec<Event> {
    fn log(&mut self, event: &Event) {
        self.push(event.clone());
    }
}
