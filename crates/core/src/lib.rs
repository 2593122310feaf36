//! # lcdsim-core
//!
//! Behavioural model of an HD44780-style 16x2 character LCD controller.
//!
//! The controller owns 2 × 40 bytes of display data RAM (DDRAM) of which a
//! 16-column window is visible. Bytes arrive either as typed text (hex,
//! decimal, binary or ASCII), as typed command bytes, or from eight manual
//! data-bus switches latched on a falling edge of the enable line.
//!
//! ## Architecture
//!
//! - [`Lcd`]: session struct that owns every piece of state and interprets bytes
//! - [`ddram::Ddram`]: the 2 × 40 character memory
//! - [`cursor`]: DDRAM address counter with the split-row boundary policy
//! - [`viewport`]: 16-column visible window and auto-scroll
//! - [`config`]: controller configuration and the constraint engine
//! - [`control`]: RS / RW / E lines and the manual data bus
//! - [`instruction`]: instruction byte decoding
//! - [`input`]: text to byte parsing
//! - [`event`]: activity-log events and the [`LogSink`] trait
//! - [`snapshot`]: bounded undo history
//! - [`savestate`]: on-disk session format
//!
//! ## Address space
//!
//! Row 0 occupies DDRAM addresses 0x00–0x27 and row 1 starts at 0x40. The
//! cursor never rests in the unbacked 0x28–0x3F gap; see [`cursor::Cursor::advance`].

pub mod input;
pub mod ddram;
pub mod cursor;
pub mod viewport;
pub mod config;
pub mod control;
pub mod instruction;
pub mod event;
pub mod snapshot;
pub mod savestate;

pub use config::{ConfigChange, ConfigOutcome, ConfigState};
pub use control::{ControlLines, DataBus};
pub use cursor::{Cursor, EntryDirection};
pub use ddram::Ddram;
pub use event::{Event, LogSink};
pub use input::InputFormat;
pub use instruction::Instruction;
pub use viewport::Viewport;

use config::{CursorStyle, DisplayPower, LineCount};
use instruction::ShiftTarget;

/// Cells per DDRAM row
pub const DDRAM_WIDTH: usize = 40;
/// Number of DDRAM rows
pub const ROWS: usize = 2;
/// Columns visible through the window
pub const VISIBLE_COLS: usize = 16;
/// DDRAM address of row 1, column 0
pub const ROW1_OFFSET: usize = 0x40;
/// Fill code for cleared memory
pub const SPACE: u8 = 32;

/// Errors surfaced by the core.
///
/// Inside a session these are recovered and turned into [`Event`]s; only
/// save-state I/O hands them back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum LcdError {
    #[error("'{input}' is not valid {format} input")]
    Parse { format: InputFormat, input: String },

    #[error("invalid command '{0}'")]
    InvalidCommand(String),

    #[error("invalid {field} '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("DDRAM address R{row}, C{column} out of range")]
    AddressOutOfRange { row: u8, column: u8 },

    #[error("save state: {0}")]
    SaveState(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LcdError>;

/// A single simulated display and everything wired to it.
#[derive(Debug, Clone)]
pub struct Lcd {
    ddram: Ddram,
    cursor: Cursor,
    viewport: Viewport,
    config: ConfigState,
    lines: ControlLines,
    bus: DataBus,
    backlight: bool,
    /// Events not yet drained by the frontend
    events: Vec<Event>,
}

impl Lcd {
    /// Power-on state: blank memory, cursor home, default configuration.
    pub fn new() -> Self {
        Lcd {
            ddram: Ddram::new(),
            cursor: Cursor::new(),
            viewport: Viewport::new(),
            config: ConfigState::default(),
            lines: ControlLines::new(),
            bus: DataBus::new(),
            backlight: true,
            events: Vec::new(),
        }
    }

    // ─── Command path ───────────────────────────────────────────────────

    /// Feed one byte into the instruction register.
    pub fn send_command(&mut self, byte: u8) {
        self.emit(Event::CommandSent(byte));
        self.execute(byte);
    }

    /// A command byte typed by the user.
    ///
    /// Configuration-class bytes are resolved by the constraint engine so the
    /// configuration invariants keep holding. The typed byte itself is sent
    /// once; everything else goes straight to the interpreter.
    pub fn execute_user_command(&mut self, byte: u8) {
        if self.lines.read_write {
            self.emit(Event::ReadIgnored(self.lines));
            return;
        }
        let Some(requested) = Instruction::decode(byte).requested_config(&self.config) else {
            self.send_command(byte);
            return;
        };
        let before = self.config;
        let outcome = config::apply_command(&before, requested, byte);
        if outcome.config.display_power == DisplayPower::Off && before.cursor_style.is_visible() {
            self.emit(Event::CursorForcedHidden);
        }
        self.send_outcome(&outcome);
    }

    /// Parse `0xNN` / `NN` and run it as a user command.
    pub fn send_command_text(&mut self, text: &str) {
        match input::parse_command(text) {
            Ok(byte) => self.execute_user_command(byte),
            Err(e) => {
                log::warn!("{}", e);
                self.emit(Event::InvalidCommand(text.to_string()));
            }
        }
    }

    fn execute(&mut self, byte: u8) {
        let instr = Instruction::decode(byte);
        log::debug!("execute 0x{:02X}: {}", byte, instr);
        match instr {
            Instruction::Clear => self.clear(),
            Instruction::ReturnHome => {
                self.cursor.home();
                self.viewport.reset();
            }
            Instruction::SetDdramAddress(addr) => self.set_address(addr),
            Instruction::Shift { target: ShiftTarget::Cursor, right } => {
                let dir = if right { EntryDirection::Increment } else { EntryDirection::Decrement };
                self.cursor.advance(dir);
                self.viewport.follow(self.cursor.column);
            }
            Instruction::Shift { target: ShiftTarget::Display, right } => {
                if right {
                    self.viewport.shift_right();
                } else {
                    self.viewport.shift_left();
                }
            }
            Instruction::EntryModeSet { .. }
            | Instruction::DisplayControl { .. }
            | Instruction::FunctionSet { .. } => self.emit(Event::ConfigCommand(instr)),
            Instruction::SetCgramAddress(addr) => self.emit(Event::CgramIgnored(addr)),
            Instruction::Unknown(b) => self.emit(Event::UnknownCommand(b)),
        }
    }

    /// Bus byte latched with RS=1, RW=0.
    ///
    /// 0x01 and bytes with the high bit set keep their instruction meaning
    /// here; everything else is a character code.
    pub fn dispatch(&mut self, byte: u8) {
        if byte == 0x01 {
            self.clear();
        } else if byte & 0x80 != 0 {
            self.set_address(byte & 0x7F);
        } else {
            self.write_data(byte);
        }
    }

    fn clear(&mut self) {
        self.ddram.clear();
        self.cursor.home();
        self.viewport.reset();
    }

    fn set_address(&mut self, addr: u8) {
        self.cursor.set_address(addr);
        self.viewport.follow(self.cursor.column);
    }

    // ─── Data path ──────────────────────────────────────────────────────

    /// Store `code` at the cursor, step the cursor and re-scroll.
    pub fn write_data(&mut self, code: u8) {
        let (row, column) = (self.cursor.row, self.cursor.column);
        if let Err(e) = self.ddram.write(row, column, code) {
            log::warn!("{}", e);
            self.emit(Event::WriteOutOfRange { row, column });
            return;
        }
        log::debug!("data 0x{:02X} -> R{} C{}", code, row, column);
        self.cursor.advance(self.config.entry);
        self.viewport.follow(self.cursor.column);
    }

    /// Parse `text` and write every resulting byte in order.
    ///
    /// Returns the number of bytes written. Malformed text writes nothing.
    pub fn send_text(&mut self, text: &str, format: InputFormat) -> usize {
        if text.is_empty() {
            return 0;
        }
        if self.lines.read_write {
            self.emit(Event::ReadIgnored(self.lines));
            return 0;
        }
        self.emit(Event::DataSent { format, text: text.to_string() });
        match input::parse(text, format) {
            Ok(bytes) => {
                for &b in &bytes {
                    self.write_data(b);
                }
                bytes.len()
            }
            Err(e) => {
                log::warn!("{}", e);
                self.emit(Event::ParseError { format, input: text.to_string() });
                0
            }
        }
    }

    // ─── Configuration ──────────────────────────────────────────────────

    /// Apply one configuration change through the constraint engine and
    /// send the resulting bytes.
    pub fn apply_config(&mut self, change: ConfigChange) -> ConfigOutcome {
        let before = self.config;
        let outcome = config::apply_change(&before, change);

        match change {
            ConfigChange::DisplayPower(DisplayPower::Off) if before.cursor_style.is_visible() => {
                self.emit(Event::CursorForcedHidden)
            }
            ConfigChange::CursorStyle(style)
                if style.is_visible() && before.display_power == DisplayPower::Off =>
            {
                self.emit(Event::DisplayForcedOn)
            }
            _ => {}
        }
        if matches!(change, ConfigChange::BusWidth(_) | ConfigChange::LineCount(_)) {
            self.emit(Event::FunctionSet {
                bus: outcome.config.bus_width,
                lines: outcome.config.line_count,
            });
        }

        self.send_outcome(&outcome);
        outcome
    }

    fn send_outcome(&mut self, outcome: &ConfigOutcome) {
        self.config = outcome.config;
        for &byte in &outcome.commands {
            self.send_command(byte);
        }
    }

    // ─── Control lines / data bus ───────────────────────────────────────

    pub fn set_register_select(&mut self, level: bool) {
        self.lines.register_select = level;
    }

    pub fn set_read_write(&mut self, level: bool) {
        self.lines.read_write = level;
    }

    /// Drive E manually. A High→Low transition strobes the bus.
    pub fn set_enable(&mut self, level: bool) {
        self.emit(Event::EnableLevel(level));
        if self.lines.set_enable(level) {
            self.strobe();
        }
    }

    /// Start an enable pulse. The latch happens now; the frontend calls
    /// [`Lcd::release_enable`] once its pulse timer expires.
    pub fn pulse_enable(&mut self) {
        self.emit(Event::Pulse);
        self.lines.enable = true;
        self.strobe();
    }

    /// End of an enable pulse. Only the line level changes.
    pub fn release_enable(&mut self) {
        self.lines.enable = false;
    }

    fn strobe(&mut self) {
        if !self.lines.is_data_write() {
            let event = if self.lines.read_write {
                Event::ReadIgnored(self.lines)
            } else {
                Event::NonOperativePulse(self.lines)
            };
            self.emit(event);
            return;
        }
        let byte = self.bus.value();
        self.emit(Event::Latched(byte));
        self.dispatch(byte);
    }

    pub fn toggle_bus_line(&mut self, index: u8) {
        self.bus.toggle(index);
    }

    pub fn set_bus(&mut self, value: u8) {
        self.bus.set_value(value);
    }

    // ─── Presentation ───────────────────────────────────────────────────

    pub fn set_backlight(&mut self, on: bool) {
        self.backlight = on;
        self.emit(Event::Backlight(on));
    }

    /// Move the cursor to a cell clicked in the visible window.
    pub fn select_cell(&mut self, row: u8, visible_column: u8) {
        let row = row.min(ROWS as u8 - 1);
        let column = self
            .viewport
            .offset()
            .saturating_add(visible_column)
            .min(DDRAM_WIDTH as u8 - 1);
        self.emit(Event::CursorSet { row, column });
        self.send_command(cursor::ddram_address_command(row, column));
    }

    /// The 16 codes currently inside the window on `row`.
    pub fn visible_row(&self, row: u8) -> [u8; VISIBLE_COLS] {
        let start = self.viewport.offset() as usize;
        let mut out = [SPACE; VISIBLE_COLS];
        out.copy_from_slice(&self.ddram.row(row)[start..start + VISIBLE_COLS]);
        out
    }

    pub fn row(&self, row: u8) -> &[u8; DDRAM_WIDTH] {
        self.ddram.row(row)
    }

    /// Cursor position inside the window, if it is visible at all.
    pub fn cursor_visible_column(&self) -> Option<u8> {
        if self.viewport.contains(self.cursor.column) {
            Some(self.cursor.column - self.viewport.offset())
        } else {
            None
        }
    }

    pub fn ddram(&self) -> &Ddram {
        &self.ddram
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn offset(&self) -> u8 {
        self.viewport.offset()
    }

    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    pub fn cursor_style(&self) -> CursorStyle {
        self.config.cursor_style
    }

    pub fn display_power(&self) -> DisplayPower {
        self.config.display_power
    }

    pub fn line_count(&self) -> LineCount {
        self.config.line_count
    }

    pub fn lines(&self) -> ControlLines {
        self.lines
    }

    pub fn bus(&self) -> DataBus {
        self.bus
    }

    pub fn backlight(&self) -> bool {
        self.backlight
    }

    // ─── Events ─────────────────────────────────────────────────────────

    fn emit(&mut self, event: Event) {
        if event.is_error() {
            log::warn!("{}", event);
        } else {
            log::debug!("{}", event);
        }
        self.events.push(event);
    }

    /// Drain pending events in emission order.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn flush_events<S: LogSink + ?Sized>(&mut self, sink: &mut S) {
        for event in self.events.drain(..) {
            sink.log(&event);
        }
    }

    // ─── Snapshots ──────────────────────────────────────────────────────

    pub fn save_snapshot(&self) -> snapshot::Snapshot {
        snapshot::Snapshot {
            ddram: self.ddram.clone(),
            cursor: self.cursor,
            viewport: self.viewport,
            config: self.config,
            lines: self.lines,
            bus: self.bus,
            backlight: self.backlight,
        }
    }

    /// Roll state back. Pending events are kept.
    pub fn restore_snapshot(&mut self, snap: &snapshot::Snapshot) {
        self.ddram = snap.ddram.clone();
        self.cursor = snap.cursor;
        self.viewport = snap.viewport;
        self.config = snap.config;
        self.lines = snap.lines;
        self.bus = snap.bus;
        self.backlight = snap.backlight;
    }

    // ─── Save states ────────────────────────────────────────────────────

    pub fn save_state(&self) -> savestate::SaveState {
        savestate::SaveState {
            ddram: self.ddram.rows().iter().flat_map(|r| r.iter().copied()).collect(),
            cursor: self.cursor,
            offset: self.viewport.offset(),
            config: self.config,
            lines: self.lines,
            bus: self.bus,
            backlight: self.backlight,
        }
    }

    /// Replace the session with a decoded save state after re-checking
    /// every invariant. On error nothing changes.
    pub fn load_state(&mut self, state: &savestate::SaveState) -> Result<()> {
        state.validate()?;
        let mut rows = [[SPACE; DDRAM_WIDTH]; ROWS];
        for (dst, src) in rows.iter_mut().zip(state.ddram.chunks_exact(DDRAM_WIDTH)) {
            dst.copy_from_slice(src);
        }
        self.ddram = Ddram::from_rows(rows);
        self.cursor = state.cursor;
        self.viewport = Viewport::from_offset(state.offset);
        self.config = state.config;
        self.lines = state.lines;
        self.bus = state.bus;
        self.backlight = state.backlight;
        Ok(())
    }
}

impl Default for Lcd {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::BusWidth;
    use proptest::prelude::*;

    fn powered() -> Lcd {
        let mut lcd = Lcd::new();
        lcd.apply_config(ConfigChange::DisplayPower(DisplayPower::On));
        lcd.take_events();
        lcd
    }

    #[test]
    fn test_lcd_creation() {
        let lcd = Lcd::new();
        assert_eq!(lcd.cursor(), Cursor { row: 0, column: 0 });
        assert_eq!(lcd.offset(), 0);
        assert!(lcd.row(0).iter().all(|&b| b == SPACE));
        assert_eq!(lcd.display_power(), DisplayPower::Off);
        assert_eq!(lcd.cursor_style(), CursorStyle::Hidden);
        assert!(lcd.config().is_consistent());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut lcd = powered();
        lcd.send_text("Hello, world! 0123456789", InputFormat::Ascii);
        lcd.send_command(0xC5);
        lcd.send_command(0x01);
        assert_eq!(lcd.ddram(), &Ddram::new());
        assert_eq!(lcd.cursor(), Cursor { row: 0, column: 0 });
        assert_eq!(lcd.offset(), 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut a = powered();
        a.send_text("abc", InputFormat::Ascii);
        let mut b = a.clone();
        a.send_command(0x01);
        b.send_command(0x01);
        b.send_command(0x01);
        assert_eq!(a.ddram(), b.ddram());
        assert_eq!(a.cursor(), b.cursor());
        assert_eq!(a.offset(), b.offset());
    }

    #[test]
    fn test_write_increment() {
        let mut lcd = powered();
        lcd.write_data(65);
        assert_eq!(lcd.row(0)[0], 65);
        assert_eq!(lcd.cursor(), Cursor { row: 0, column: 1 });
    }

    #[test]
    fn test_write_decrement() {
        let mut lcd = powered();
        lcd.apply_config(ConfigChange::EntryMode(EntryDirection::Decrement));
        lcd.send_command(0x85);
        lcd.write_data(65);
        assert_eq!(lcd.row(0)[5], 65);
        assert_eq!(lcd.cursor(), Cursor { row: 0, column: 4 });
    }

    #[test]
    fn test_advance_past_row0_clamps() {
        let mut lcd = powered();
        lcd.send_command(0x80 | 39);
        lcd.write_data(b'x');
        lcd.write_data(b'y');
        assert_eq!(lcd.cursor(), Cursor { row: 0, column: 39 });
        assert_eq!(lcd.row(0)[39], b'y');
        assert!(lcd.row(1).iter().all(|&b| b == SPACE));
    }

    #[test]
    fn test_set_address_rows() {
        let mut lcd = powered();
        lcd.send_command(0x80 | 0x0F);
        assert_eq!(lcd.cursor(), Cursor { row: 0, column: 15 });
        lcd.send_command(0xCF);
        assert_eq!(lcd.cursor(), Cursor { row: 1, column: 15 });
    }

    #[test]
    fn test_viewport_follows_writes() {
        let mut lcd = powered();
        lcd.send_command(0x80 | 20);
        assert_eq!(lcd.offset(), 5);
        lcd.send_command(0x80 | 2);
        assert_eq!(lcd.offset(), 2);
    }

    #[test]
    fn test_long_text_scrolls_window() {
        let mut lcd = powered();
        let written = lcd.send_text("ABCDEFGHIJKLMNOPQRST", InputFormat::Ascii);
        assert_eq!(written, 20);
        assert_eq!(lcd.cursor().column, 20);
        assert_eq!(lcd.offset(), 5);
        assert_eq!(&lcd.visible_row(0), b"FGHIJKLMNOPQRST ");
        assert_eq!(lcd.cursor_visible_column(), Some(15));
    }

    #[test]
    fn test_all_formats_write_same_code() {
        for (text, format) in [
            ("4A", InputFormat::Hex),
            ("74", InputFormat::Decimal),
            ("01001010", InputFormat::Binary),
            ("J", InputFormat::Ascii),
        ] {
            let mut lcd = powered();
            assert_eq!(lcd.send_text(text, format), 1);
            assert_eq!(lcd.row(0)[0], b'J');
        }
    }

    #[test]
    fn test_malformed_text_changes_nothing() {
        let mut lcd = powered();
        let before = lcd.save_snapshot();
        assert_eq!(lcd.send_text("zz", InputFormat::Hex), 0);
        assert_eq!(lcd.ddram(), &before.ddram);
        assert_eq!(lcd.cursor(), before.cursor);
        let events = lcd.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::ParseError { .. })));
    }

    #[test]
    fn test_unknown_command_is_noop() {
        let mut lcd = powered();
        lcd.send_text("hi", InputFormat::Ascii);
        let before = lcd.save_snapshot();
        lcd.take_events();
        lcd.send_command(0x00);
        lcd.send_command(0x45);
        assert_eq!(lcd.ddram(), &before.ddram);
        assert_eq!(lcd.cursor(), before.cursor);
        let events = lcd.take_events();
        assert!(events.contains(&Event::UnknownCommand(0x00)));
        assert!(events.contains(&Event::CgramIgnored(0x05)));
    }

    #[test]
    fn test_return_home_keeps_memory() {
        let mut lcd = powered();
        lcd.send_text("ABCDEFGHIJKLMNOPQRST", InputFormat::Ascii);
        lcd.send_command(0x02);
        assert_eq!(lcd.cursor(), Cursor { row: 0, column: 0 });
        assert_eq!(lcd.offset(), 0);
        assert_eq!(lcd.row(0)[0], b'A');
    }

    #[test]
    fn test_cursor_and_display_shift() {
        let mut lcd = powered();
        lcd.send_command(0x14);
        lcd.send_command(0x14);
        assert_eq!(lcd.cursor().column, 2);
        lcd.send_command(0x10);
        assert_eq!(lcd.cursor().column, 1);

        lcd.send_command(0x18);
        assert_eq!(lcd.offset(), 1);
        lcd.send_command(0x1C);
        lcd.send_command(0x1C);
        assert_eq!(lcd.offset(), 0);
        for _ in 0..40 {
            lcd.send_command(0x18);
        }
        assert_eq!(lcd.offset(), viewport::MAX_OFFSET);
    }

    #[test]
    fn test_config_display_off_hides_cursor() {
        let mut lcd = powered();
        lcd.apply_config(ConfigChange::CursorStyle(CursorStyle::Underline));
        lcd.take_events();
        let outcome = lcd.apply_config(ConfigChange::DisplayPower(DisplayPower::Off));
        assert_eq!(outcome.commands, vec![0x0C, 0x08]);
        assert_eq!(lcd.cursor_style(), CursorStyle::Hidden);
        assert_eq!(
            lcd.take_events(),
            vec![
                Event::CursorForcedHidden,
                Event::CommandSent(0x0C),
                Event::ConfigCommand(Instruction::decode(0x0C)),
                Event::CommandSent(0x08),
                Event::ConfigCommand(Instruction::decode(0x08)),
            ]
        );
    }

    #[test]
    fn test_config_cursor_forces_display_on() {
        let mut lcd = Lcd::new();
        let outcome = lcd.apply_config(ConfigChange::CursorStyle(CursorStyle::Underline));
        assert_eq!(outcome.commands, vec![0x0C, 0x0E]);
        assert_eq!(lcd.display_power(), DisplayPower::On);
        assert!(lcd.take_events().contains(&Event::DisplayForcedOn));
    }

    #[test]
    fn test_function_set_emitted() {
        let mut lcd = Lcd::new();
        let outcome = lcd.apply_config(ConfigChange::BusWidth(BusWidth::EightBit));
        assert_eq!(outcome.commands, vec![0x38]);
        let events = lcd.take_events();
        assert_eq!(
            events[0],
            Event::FunctionSet { bus: BusWidth::EightBit, lines: LineCount::Two }
        );
    }

    #[test]
    fn test_user_command_goes_through_engine() {
        let mut lcd = Lcd::new();
        lcd.execute_user_command(0x0F);
        assert_eq!(lcd.display_power(), DisplayPower::On);
        assert_eq!(lcd.cursor_style(), CursorStyle::BlinkingBlock);
        lcd.execute_user_command(0x08);
        assert_eq!(lcd.display_power(), DisplayPower::Off);
        assert_eq!(lcd.cursor_style(), CursorStyle::Hidden);
        assert!(lcd.config().is_consistent());

        lcd.execute_user_command(0x04);
        assert_eq!(lcd.config().entry, EntryDirection::Decrement);
        lcd.execute_user_command(0x30);
        assert_eq!(lcd.config().bus_width, BusWidth::EightBit);
        assert_eq!(lcd.line_count(), LineCount::One);
    }

    fn sent_commands(events: &[Event]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::CommandSent(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_typed_config_byte_sent_once() {
        let mut lcd = Lcd::new();
        for byte in [0x30, 0x0C, 0x0E, 0x07] {
            lcd.take_events();
            lcd.execute_user_command(byte);
            assert_eq!(sent_commands(&lcd.take_events()), vec![byte]);
        }
        assert_eq!(lcd.config().bus_width, BusWidth::EightBit);
        assert_eq!(lcd.cursor_style(), CursorStyle::Underline);
        assert_eq!(lcd.config().entry, EntryDirection::Increment);
    }

    #[test]
    fn test_typed_display_off_forces_hidden_cursor() {
        let mut lcd = Lcd::new();
        lcd.execute_user_command(0x0F);
        lcd.take_events();
        lcd.execute_user_command(0x08);
        let events = lcd.take_events();
        assert_eq!(events[0], Event::CursorForcedHidden);
        assert_eq!(sent_commands(&events), vec![0x0C, 0x08]);
        assert_eq!(lcd.cursor_style(), CursorStyle::Hidden);
    }

    #[test]
    fn test_command_text() {
        let mut lcd = powered();
        lcd.send_text("ab", InputFormat::Ascii);
        lcd.send_command_text("0x01");
        assert_eq!(lcd.row(0)[0], SPACE);
        lcd.take_events();
        lcd.send_command_text("nope");
        assert_eq!(lcd.take_events(), vec![Event::InvalidCommand("nope".into())]);
    }

    #[test]
    fn test_pulse_latches_bus() {
        let mut lcd = powered();
        lcd.set_bus(0x41);
        lcd.pulse_enable();
        assert!(lcd.lines().enable);
        assert_eq!(lcd.row(0)[0], 0x41);
        assert_eq!(lcd.cursor().column, 1);
        lcd.release_enable();
        assert!(!lcd.lines().enable);
        assert_eq!(lcd.row(0)[0], 0x41);
        // stale release after a second pulse
        lcd.pulse_enable();
        lcd.release_enable();
        lcd.release_enable();
        assert_eq!(lcd.row(0)[1], 0x41);
    }

    #[test]
    fn test_pulse_bus_clear_and_address() {
        let mut lcd = powered();
        lcd.send_text("xyz", InputFormat::Ascii);
        lcd.set_bus(0xC3);
        lcd.pulse_enable();
        assert_eq!(lcd.cursor(), Cursor { row: 1, column: 3 });
        lcd.set_bus(0x01);
        lcd.pulse_enable();
        assert_eq!(lcd.ddram(), &Ddram::new());
    }

    #[test]
    fn test_non_operative_pulses() {
        let mut lcd = powered();
        lcd.set_bus(0x41);
        lcd.set_register_select(false);
        lcd.pulse_enable();
        lcd.set_register_select(true);
        lcd.set_read_write(true);
        lcd.pulse_enable();
        assert_eq!(lcd.row(0)[0], SPACE);
        let events = lcd.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::NonOperativePulse(_))));
        assert!(events.iter().any(|e| matches!(e, Event::ReadIgnored(_))));
    }

    #[test]
    fn test_read_mode_ignores_typed_text() {
        let mut lcd = powered();
        lcd.set_read_write(true);
        assert_eq!(lcd.send_text("A", InputFormat::Ascii), 0);
        lcd.execute_user_command(0x01);
        assert_eq!(lcd.row(0)[0], SPACE);
    }

    #[test]
    fn test_manual_enable_falling_edge() {
        let mut lcd = powered();
        lcd.set_bus(0b0000_0001);
        lcd.toggle_bus_line(6);
        lcd.set_enable(true);
        assert_eq!(lcd.row(0)[0], SPACE);
        lcd.set_enable(false);
        assert_eq!(lcd.row(0)[0], 0x41);
        lcd.set_enable(false);
        assert_eq!(lcd.cursor().column, 1);
    }

    #[test]
    fn test_select_cell_uses_window() {
        let mut lcd = powered();
        lcd.send_command(0x80 | 30);
        assert_eq!(lcd.offset(), 15);
        lcd.take_events();
        lcd.select_cell(1, 3);
        assert_eq!(lcd.cursor(), Cursor { row: 1, column: 18 });
        let events = lcd.take_events();
        assert_eq!(events[0], Event::CursorSet { row: 1, column: 18 });
        assert_eq!(events[1], Event::CommandSent(0xC0 | 18));
    }

    #[test]
    fn test_flush_events_into_sink() {
        let mut lcd = Lcd::new();
        lcd.set_backlight(false);
        let mut sink: Vec<String> = Vec::new();
        lcd.flush_events(&mut sink);
        assert_eq!(sink, vec!["Backlight turned OFF".to_string()]);
        assert!(lcd.take_events().is_empty());
        assert!(!lcd.backlight());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut lcd = powered();
        lcd.send_text("keep", InputFormat::Ascii);
        let snap = lcd.save_snapshot();
        lcd.send_command(0x01);
        lcd.apply_config(ConfigChange::CursorStyle(CursorStyle::BlinkingBlock));
        lcd.restore_snapshot(&snap);
        assert_eq!(&lcd.row(0)[..4], b"keep");
        assert_eq!(lcd.cursor().column, 4);
        assert_eq!(lcd.cursor_style(), CursorStyle::Hidden);
    }

    #[test]
    fn test_save_state_load_state() {
        let mut lcd = powered();
        lcd.send_command(0xC0 | 30);
        lcd.send_text("row one", InputFormat::Ascii);
        let state = lcd.save_state();
        let mut other = Lcd::new();
        other.load_state(&state).unwrap();
        assert_eq!(other.ddram(), lcd.ddram());
        assert_eq!(other.cursor(), lcd.cursor());
        assert_eq!(other.offset(), lcd.offset());
        assert_eq!(other.config(), lcd.config());
    }

    proptest! {
        #[test]
        fn prop_invariants_hold(ops in proptest::collection::vec((0u8..4, any::<u8>()), 0..200)) {
            let mut lcd = Lcd::new();
            for (kind, byte) in ops {
                match kind {
                    0 => lcd.send_command(byte),
                    1 => lcd.write_data(byte),
                    2 => lcd.execute_user_command(byte),
                    _ => {
                        lcd.set_bus(byte);
                        lcd.pulse_enable();
                        lcd.release_enable();
                    }
                }
                prop_assert!((lcd.cursor().column as usize) < DDRAM_WIDTH);
                prop_assert!((lcd.cursor().row as usize) < ROWS);
                prop_assert!(lcd.offset() <= viewport::MAX_OFFSET);
                prop_assert!(lcd.config().is_consistent());
            }
            lcd.send_command(0x01);
            let once = lcd.save_snapshot();
            lcd.send_command(0x01);
            prop_assert_eq!(lcd.save_snapshot(), once);
            prop_assert_eq!(lcd.ddram(), &Ddram::new());
        }
    }
}
