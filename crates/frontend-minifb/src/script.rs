//! Line-oriented command language for headless and interactive runs.
//!
//! One command per line; `#` starts a comment.
//!
//! ```text
//! cmd 0x0C                 send a command byte (typed-command path)
//! data ascii Hello         send text in hex | dec | bin | ascii
//! rs 1 / rw 0 / en 1       drive a control line
//! pulse / release          enable pulse start and end
//! bit 7 / bus 01000001     toggle one data line / set all eight
//! set cursor blink         configuration change
//! goto 1 15                move the cursor to a DDRAM row/column
//! backlight off
//! show / dump / log        print display, DDRAM hex, activity log
//! undo
//! save FILE / load FILE
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use lcdsim_core::control::DataBus;
use lcdsim_core::cursor::ddram_address_command;
use lcdsim_core::snapshot::History;
use lcdsim_core::{savestate, ConfigChange, InputFormat, Lcd, DDRAM_WIDTH};

use crate::activity_log::ActivityLog;
use crate::render;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Cmd(String),
    Data(InputFormat, String),
    Rs(bool),
    Rw(bool),
    En(bool),
    Pulse,
    Release,
    Bit(u8),
    Bus(u8),
    Set(ConfigChange),
    Goto(u8, u8),
    Backlight(bool),
    Show,
    Dump,
    Log,
    Undo,
    Save(PathBuf),
    Load(PathBuf),
}

impl Command {
    /// Commands that leave the session untouched get no undo step.
    fn mutates(&self) -> bool {
        !matches!(
            self,
            Command::Show | Command::Dump | Command::Log | Command::Undo | Command::Save(_)
        )
    }
}

fn parse_level(word: &str) -> Result<bool> {
    match word.to_ascii_lowercase().as_str() {
        "1" | "on" | "high" | "true" => Ok(true),
        "0" | "off" | "low" | "false" => Ok(false),
        _ => bail!("expected 0/1 or on/off, got '{}'", word),
    }
}

fn arg<'a>(rest: &'a str, what: &str) -> Result<&'a str> {
    let rest = rest.trim();
    if rest.is_empty() {
        bail!("missing {}", what);
    }
    Ok(rest)
}

/// Parse one script line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
    .trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();

    let cmd = match word.to_ascii_lowercase().as_str() {
        "cmd" | "command" => Command::Cmd(arg(rest, "command byte")?.to_string()),
        "data" => {
            let (fmt, text) = arg(rest, "input format")?
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("data needs a format and text"))?;
            Command::Data(fmt.parse()?, text.trim_start().to_string())
        }
        "rs" => Command::Rs(parse_level(arg(rest, "level")?)?),
        "rw" => Command::Rw(parse_level(arg(rest, "level")?)?),
        "en" => Command::En(parse_level(arg(rest, "level")?)?),
        "pulse" => Command::Pulse,
        "release" => Command::Release,
        "bit" => {
            let index: u8 = arg(rest, "bit index")?.parse().context("bit index")?;
            if index > 7 {
                bail!("bit index {} out of range 0-7", index);
            }
            Command::Bit(index)
        }
        "bus" => {
            let bits = arg(rest, "bit string")?;
            let bus = DataBus::from_bit_string(bits)
                .ok_or_else(|| anyhow!("'{}' is not eight 0/1 digits", bits))?;
            Command::Bus(bus.value())
        }
        "set" => {
            let (field, value) = arg(rest, "field")?
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("set needs a field and a value"))?;
            Command::Set(ConfigChange::parse(field, value)?)
        }
        "goto" => {
            let mut it = arg(rest, "row and column")?.split_whitespace();
            let row: u8 = it.next().unwrap_or("").parse().context("row")?;
            let col: u8 = it.next().ok_or_else(|| anyhow!("missing column"))?.parse().context("column")?;
            if row > 1 || col as usize >= DDRAM_WIDTH {
                bail!("R{}, C{} is outside DDRAM", row, col);
            }
            Command::Goto(row, col)
        }
        "backlight" => Command::Backlight(parse_level(arg(rest, "level")?)?),
        "show" => Command::Show,
        "dump" => Command::Dump,
        "log" => Command::Log,
        "undo" => Command::Undo,
        "save" => Command::Save(PathBuf::from(arg(rest, "file name")?)),
        "load" => Command::Load(PathBuf::from(arg(rest, "file name")?)),
        other => bail!("unknown command '{}'", other),
    };
    Ok(Some(cmd))
}

/// A controller plus the frontend state around it.
pub struct Session {
    pub lcd: Lcd,
    pub log: ActivityLog,
    history: History,
}

impl Session {
    pub fn new(lcd: Lcd, log_lines: usize) -> Self {
        let mut session = Session { lcd, log: ActivityLog::new(log_lines), history: History::default() };
        session.sync_log();
        session
    }

    /// Record an undo step before a user action.
    pub fn checkpoint(&mut self) {
        self.history.push(self.lcd.save_snapshot());
    }

    /// Move pending controller events into the activity log.
    pub fn sync_log(&mut self) {
        self.lcd.flush_events(&mut self.log);
    }

    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(snap) => {
                self.lcd.restore_snapshot(&snap);
                true
            }
            None => false,
        }
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        savestate::save_to_file(&self.lcd.save_state(), path)
            .with_context(|| format!("saving {}", path.display()))?;
        self.log.push(format!("Saved state to {}", path.display()));
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<()> {
        let state = savestate::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
        self.lcd.load_state(&state)?;
        self.log.push(format!("Loaded state from {}", path.display()));
        Ok(())
    }

    /// Run one command. Returns text to print, if the command produces any.
    pub fn execute(&mut self, cmd: Command) -> Result<Option<String>> {
        if cmd.mutates() {
            self.checkpoint();
        }
        let mut output = None;
        match cmd {
            Command::Cmd(text) => self.lcd.send_command_text(&text),
            Command::Data(format, text) => {
                self.lcd.send_text(&text, format);
            }
            Command::Rs(level) => self.lcd.set_register_select(level),
            Command::Rw(level) => self.lcd.set_read_write(level),
            Command::En(level) => self.lcd.set_enable(level),
            Command::Pulse => self.lcd.pulse_enable(),
            Command::Release => self.lcd.release_enable(),
            Command::Bit(index) => self.lcd.toggle_bus_line(index),
            Command::Bus(value) => self.lcd.set_bus(value),
            Command::Set(change) => {
                self.lcd.apply_config(change);
            }
            Command::Goto(row, col) => self.lcd.send_command(ddram_address_command(row, col)),
            Command::Backlight(on) => self.lcd.set_backlight(on),
            Command::Show => output = Some(render::text_frame(&self.lcd)),
            Command::Dump => output = Some(self.lcd.ddram().dump()),
            Command::Log => {
                let mut text = String::new();
                for line in self.log.lines() {
                    text.push_str(line);
                    text.push('\n');
                }
                output = Some(text);
            }
            Command::Undo => {
                if !self.undo() {
                    output = Some("nothing to undo\n".to_string());
                }
            }
            Command::Save(path) => self.save(&path)?,
            Command::Load(path) => self.load(&path)?,
        }
        self.sync_log();
        Ok(output)
    }

    pub fn run_line(&mut self, line: &str) -> Result<Option<String>> {
        match parse_line(line)? {
            Some(cmd) => self.execute(cmd),
            None => Ok(None),
        }
    }

    /// Run a whole script, stopping at the first failing line.
    pub fn run_script(&mut self, source: &str, mut out: impl FnMut(&str)) -> Result<()> {
        for (n, line) in source.lines().enumerate() {
            let printed = self
                .run_line(line)
                .with_context(|| format!("line {}: {}", n + 1, line.trim()))?;
            if let Some(text) = printed {
                out(&text);
            }
        }
        Ok(())
    }
}
