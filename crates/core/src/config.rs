//! Controller configuration and the constraint engine that keeps it coherent.
//!
//! The five settings look independent but two are coupled: a dark display
//! cannot show a cursor, and a visible cursor needs the display on. All
//! changes go through [`apply_change`], which resolves the coupling and
//! returns the ordered command bytes the controller must receive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cursor::EntryDirection;
use crate::LcdError;

/// Data bus width selected by Function Set (DL bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BusWidth {
    #[default]
    FourBit,
    EightBit,
}

/// Number of display lines selected by Function Set (N bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCount {
    One,
    #[default]
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayPower {
    On,
    #[default]
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorStyle {
    #[default]
    Hidden,
    Underline,
    BlinkingBlock,
}

impl BusWidth {
    pub fn label(self) -> &'static str {
        match self {
            BusWidth::FourBit => "4-Bit Mode",
            BusWidth::EightBit => "8-Bit Mode",
        }
    }
}

impl LineCount {
    pub fn label(self) -> &'static str {
        match self {
            LineCount::One => "1 Line (16x1)",
            LineCount::Two => "2 Lines (16x2)",
        }
    }
}

impl DisplayPower {
    pub fn label(self) -> &'static str {
        match self {
            DisplayPower::On => "Display ON",
            DisplayPower::Off => "Display OFF",
        }
    }

    /// Display Control byte sent when the user picks this power state.
    pub fn command(self) -> u8 {
        match self {
            DisplayPower::On => 0x0C,
            DisplayPower::Off => 0x08,
        }
    }
}

impl CursorStyle {
    pub fn label(self) -> &'static str {
        match self {
            CursorStyle::Hidden => "Hidden",
            CursorStyle::Underline => "Underline",
            CursorStyle::BlinkingBlock => "Blinking Block",
        }
    }

    /// Display Control byte sent when the user picks this cursor style.
    pub fn command(self) -> u8 {
        match self {
            CursorStyle::Hidden => 0x0C,
            CursorStyle::Underline => 0x0E,
            CursorStyle::BlinkingBlock => 0x0F,
        }
    }

    pub fn is_visible(self) -> bool {
        self != CursorStyle::Hidden
    }
}

macro_rules! label_display {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

label_display!(BusWidth, LineCount, DisplayPower, CursorStyle);

fn invalid(field: &'static str, value: &str) -> LcdError {
    LcdError::InvalidValue { field, value: value.to_string() }
}

impl FromStr for BusWidth {
    type Err = LcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_ascii_lowercase();
        if v.starts_with('8') || v == "eight" {
            Ok(BusWidth::EightBit)
        } else if v.starts_with('4') || v == "four" {
            Ok(BusWidth::FourBit)
        } else {
            Err(invalid("bus width", s))
        }
    }
}

impl FromStr for LineCount {
    type Err = LcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_ascii_lowercase();
        if v.starts_with('2') || v == "two" {
            Ok(LineCount::Two)
        } else if v.starts_with('1') || v == "one" {
            Ok(LineCount::One)
        } else {
            Err(invalid("line count", s))
        }
    }
}

impl FromStr for DisplayPower {
    type Err = LcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_ascii_lowercase();
        let v = v.strip_prefix("display").unwrap_or(&v).trim();
        match v {
            "on" | "1" | "true" => Ok(DisplayPower::On),
            "off" | "0" | "false" => Ok(DisplayPower::Off),
            _ => Err(invalid("display power", s)),
        }
    }
}

impl FromStr for CursorStyle {
    type Err = LcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_ascii_lowercase();
        match v.as_str() {
            "hidden" | "off" | "none" => Ok(CursorStyle::Hidden),
            "underline" | "line" | "_" => Ok(CursorStyle::Underline),
            "blinking block" | "blink" | "block" => Ok(CursorStyle::BlinkingBlock),
            _ => Err(invalid("cursor style", s)),
        }
    }
}

/// Function Set byte for a bus width / line count pair.
pub fn function_set_command(bus: BusWidth, lines: LineCount) -> u8 {
    match (bus, lines) {
        (BusWidth::EightBit, LineCount::Two) => 0x38,
        (BusWidth::EightBit, LineCount::One) => 0x30,
        (BusWidth::FourBit, LineCount::Two) => 0x28,
        (BusWidth::FourBit, LineCount::One) => 0x20,
    }
}

/// The five controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigState {
    pub bus_width: BusWidth,
    pub line_count: LineCount,
    pub entry: EntryDirection,
    pub display_power: DisplayPower,
    pub cursor_style: CursorStyle,
}

impl ConfigState {
    /// Power/cursor coupling holds.
    pub fn is_consistent(&self) -> bool {
        !(self.display_power == DisplayPower::Off && self.cursor_style.is_visible())
    }

    pub fn function_set(&self) -> u8 {
        function_set_command(self.bus_width, self.line_count)
    }
}

/// A single user-requested setting change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    BusWidth(BusWidth),
    LineCount(LineCount),
    EntryMode(EntryDirection),
    DisplayPower(DisplayPower),
    CursorStyle(CursorStyle),
}

impl ConfigChange {
    /// Build a change from a field name and value text, e.g. `("cursor", "blink")`.
    pub fn parse(field: &str, value: &str) -> Result<Self, LcdError> {
        match field.trim().to_ascii_lowercase().as_str() {
            "bus" | "width" | "buswidth" => Ok(ConfigChange::BusWidth(value.parse()?)),
            "lines" | "line" | "linecount" => Ok(ConfigChange::LineCount(value.parse()?)),
            "entry" | "entrymode" => Ok(ConfigChange::EntryMode(value.parse()?)),
            "display" | "power" => Ok(ConfigChange::DisplayPower(value.parse()?)),
            "cursor" | "cursorstyle" => Ok(ConfigChange::CursorStyle(value.parse()?)),
            _ => Err(invalid("config field", field)),
        }
    }
}

/// Result of a change: the resolved configuration and bytes to send, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOutcome {
    pub config: ConfigState,
    pub commands: Vec<u8>,
}

/// Resolve `change` against `config`.
///
/// Display-off forces the cursor hidden and a visible cursor forces the
/// display on; the forced byte is emitted before the user's own byte.
/// Bus width and line count changes always emit a freshly computed
/// Function Set instead of a per-field byte.
pub fn apply_change(config: &ConfigState, change: ConfigChange) -> ConfigOutcome {
    let mut next = *config;
    let mut commands = Vec::with_capacity(2);

    match change {
        ConfigChange::DisplayPower(power) => {
            if power == DisplayPower::Off && next.cursor_style.is_visible() {
                next.cursor_style = CursorStyle::Hidden;
                commands.push(CursorStyle::Hidden.command());
            }
            next.display_power = power;
        }
        ConfigChange::CursorStyle(style) => {
            if style.is_visible() && next.display_power == DisplayPower::Off {
                next.display_power = DisplayPower::On;
                commands.push(DisplayPower::On.command());
            }
            next.cursor_style = style;
        }
        ConfigChange::EntryMode(dir) => next.entry = dir,
        ConfigChange::BusWidth(bus) => next.bus_width = bus,
        ConfigChange::LineCount(lines) => next.line_count = lines,
    }

    let own = match change {
        ConfigChange::DisplayPower(p) => p.command(),
        ConfigChange::CursorStyle(s) => s.command(),
        ConfigChange::EntryMode(d) => d.command(),
        ConfigChange::BusWidth(_) | ConfigChange::LineCount(_) => next.function_set(),
    };
    commands.push(own);

    ConfigOutcome { config: next, commands }
}

/// Resolve a configuration-class instruction byte typed by the user.
///
/// `requested` is the state `byte` asks for. A cursor that is visible when
/// the display goes off is hidden first; the typed byte follows, exactly once.
pub fn apply_command(config: &ConfigState, requested: ConfigState, byte: u8) -> ConfigOutcome {
    let mut next = requested;
    let mut commands = Vec::with_capacity(2);

    if next.display_power == DisplayPower::Off {
        if config.cursor_style.is_visible() {
            commands.push(CursorStyle::Hidden.command());
        }
        next.cursor_style = CursorStyle::Hidden;
    }
    commands.push(byte);

    ConfigOutcome { config: next, commands }
}
