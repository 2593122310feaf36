//! Text input parsing.
//!
//! Turns what the user typed into byte codes. Four encodings are accepted:
//!
//! | Format  | Groups extracted                     | Example      |
//! |---------|--------------------------------------|--------------|
//! | Hex     | runs of 1–2 hex digits (`0x` skipped) | `4A 0x42`    |
//! | Decimal | runs of digits of any length          | `65,66`      |
//! | Binary  | 8-digit groups of `0`/`1`             | `01000001`   |
//! | ASCII   | one code per character                | `AB`         |
//!
//! Values above 255 are dropped without error. Text with no group at all
//! for the chosen format is a parse error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LcdError, Result};

/// Encoding of a data string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputFormat {
    #[default]
    Hex,
    Decimal,
    Binary,
    Ascii,
}

impl InputFormat {
    pub fn label(self) -> &'static str {
        match self {
            InputFormat::Hex => "Hex",
            InputFormat::Decimal => "Decimal",
            InputFormat::Binary => "Binary",
            InputFormat::Ascii => "ASCII",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InputFormat {
    type Err = LcdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" | "h" => Ok(InputFormat::Hex),
            "decimal" | "dec" | "d" => Ok(InputFormat::Decimal),
            "binary" | "bin" | "b" => Ok(InputFormat::Binary),
            "ascii" | "text" | "a" => Ok(InputFormat::Ascii),
            _ => Err(LcdError::InvalidValue { field: "input format", value: s.to_string() }),
        }
    }
}

/// Parse `text` in `format` into byte codes.
pub fn parse(text: &str, format: InputFormat) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let values = match format {
        InputFormat::Hex => hex_groups(text),
        InputFormat::Decimal => decimal_groups(text),
        InputFormat::Binary => binary_groups(text),
        InputFormat::Ascii => text.chars().map(|c| c as u32).collect(),
    };
    if values.is_empty() {
        return Err(LcdError::Parse { format, input: text.to_string() });
    }
    Ok(values.into_iter().filter_map(|v| u8::try_from(v).ok()).collect())
}

/// Parse a command byte written as `0xNN` or bare `NN` hex.
pub fn parse_command(text: &str) -> Result<u8> {
    let t = text.trim();
    let digits = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    if digits.is_empty() || digits.len() > 2 {
        return Err(LcdError::InvalidCommand(text.to_string()));
    }
    let mut value = 0u8;
    for c in digits.chars() {
        let nibble = hex_char(c).ok_or_else(|| LcdError::InvalidCommand(text.to_string()))?;
        value = (value << 4) | nibble;
    }
    Ok(value)
}

/// Render a byte the way the activity log shows it.
pub fn to_hex_str(value: u8) -> String {
    format!("0x{:02X}", value)
}

fn hex_char(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'a'..='f' => Some(c as u8 - b'a' + 10),
        'A'..='F' => Some(c as u8 - b'A' + 10),
        _ => None,
    }
}

fn hex_groups(text: &str) -> Vec<u32> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        // `0x` prefix in front of a digit is a separator, not a value
        if chars[i] == '0'
            && matches!(chars.get(i + 1), Some('x') | Some('X'))
            && chars.get(i + 2).and_then(|&c| hex_char(c)).is_some()
        {
            i += 2;
            continue;
        }
        match hex_char(chars[i]) {
            Some(hi) => match chars.get(i + 1).and_then(|&c| hex_char(c)) {
                Some(lo) => {
                    out.push(((hi << 4) | lo) as u32);
                    i += 2;
                }
                None => {
                    out.push(hi as u32);
                    i += 1;
                }
            },
            None => i += 1,
        }
    }
    out
}

fn decimal_groups(text: &str) -> Vec<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| {
            run.bytes()
                .fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add((d - b'0') as u32))
        })
        .collect()
}

fn binary_groups(text: &str) -> Vec<u32> {
    let mut out = Vec::new();
    for run in text.split(|c: char| c != '0' && c != '1') {
        for chunk in run.as_bytes().chunks_exact(8) {
            let v = chunk.iter().fold(0u32, |acc, &b| (acc << 1) | (b - b'0') as u32);
            out.push(v);
        }
    }
    out
}
