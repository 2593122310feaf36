//! Pixel and text renderings of the display window.
//!
//! The pixel frame is drawn at 1:1 and scaled by the window loop. Layout:
//!
//! ```text
//! +------------------------------------------+
//! |  16 × 2 character cells (5×8 px each)    |  LCD_H
//! +------------------------------------------+
//! |  RS RW EN  D7 .. D0 indicators           |  STATUS_H
//! +------------------------------------------+
//! ```

use lcdsim_core::config::{CursorStyle, DisplayPower, LineCount};
use lcdsim_core::{Lcd, VISIBLE_COLS};

use crate::font::{self, GLYPH_H, GLYPH_W};

/// Cell height: seven glyph rows plus the cursor row
const CELL_H: usize = GLYPH_H + 1;
const GAP: usize = 1;
const MARGIN: usize = 4;
const LED: usize = 4;

pub const LCD_W: usize = MARGIN * 2 + VISIBLE_COLS * GLYPH_W + (VISIBLE_COLS - 1) * GAP;
pub const LCD_H: usize = MARGIN * 2 + 2 * CELL_H + GAP;
pub const STATUS_H: usize = LED + MARGIN;
pub const FRAME_W: usize = LCD_W;
pub const FRAME_H: usize = LCD_H + STATUS_H;

struct Palette {
    back: u32,
    dot_off: u32,
    dot_on: u32,
}

const LIT: Palette = Palette { back: 0x7FB432, dot_off: 0x74A52C, dot_on: 0x1E2A10 };
const DARK: Palette = Palette { back: 0x2C3A18, dot_off: 0x293616, dot_on: 0x0E1408 };
const PANEL: u32 = 0x202020;
const LED_ON: u32 = 0xE04040;
const LED_OFF: u32 = 0x502020;

/// Draw the whole frame. `blink_on` is the current blink phase.
pub fn render(lcd: &Lcd, blink_on: bool, buf: &mut [u32]) {
    debug_assert!(buf.len() >= FRAME_W * FRAME_H);
    let pal = if lcd.backlight() { &LIT } else { &DARK };
    buf[..LCD_W * LCD_H].fill(pal.back);
    buf[LCD_W * LCD_H..FRAME_W * FRAME_H].fill(PANEL);

    let powered = lcd.display_power() == DisplayPower::On;
    let cursor = lcd.cursor();
    let cursor_col = lcd.cursor_visible_column();

    for row in 0..2u8 {
        let shown = row == 0 || lcd.line_count() == LineCount::Two;
        let codes = lcd.visible_row(row);
        for (col, &code) in codes.iter().enumerate() {
            let at_cursor = powered && cursor.row == row && cursor_col == Some(col as u8);
            let x0 = MARGIN + col * (GLYPH_W + GAP);
            let y0 = MARGIN + row as usize * (CELL_H + GAP);
            for y in 0..CELL_H {
                for x in 0..GLYPH_W {
                    let mut on = powered && shown && font::pixel(code, x, y);
                    if at_cursor {
                        match lcd.cursor_style() {
                            CursorStyle::Underline => on |= y == CELL_H - 1,
                            CursorStyle::BlinkingBlock => on |= blink_on,
                            CursorStyle::Hidden => {}
                        }
                    }
                    buf[(y0 + y) * FRAME_W + x0 + x] = if on { pal.dot_on } else { pal.dot_off };
                }
            }
        }
    }

    let lines = lcd.lines();
    let bus = lcd.bus();
    let leds = [lines.register_select, lines.read_write, lines.enable]
        .into_iter()
        .chain((0..8).rev().map(|i| bus.line(i)));
    for (i, on) in leds.enumerate() {
        // gap between the control lines and the bus
        let x0 = MARGIN + i * (LED + 2) + if i >= 3 { LED } else { 0 };
        fill_rect(buf, x0, LCD_H + MARGIN / 2, LED, LED, if on { LED_ON } else { LED_OFF });
    }
}

fn fill_rect(buf: &mut [u32], x0: usize, y0: usize, w: usize, h: usize, color: u32) {
    for y in y0..(y0 + h).min(FRAME_H) {
        for x in x0..(x0 + w).min(FRAME_W) {
            buf[y * FRAME_W + x] = color;
        }
    }
}

/// Scale the 1:1 frame into a window buffer.
pub fn scale_into(frame: &[u32], scale: usize, out: &mut [u32]) {
    let out_w = FRAME_W * scale;
    for y in 0..FRAME_H {
        for x in 0..FRAME_W {
            let c = frame[y * FRAME_W + x];
            for sy in 0..scale {
                let base = (y * scale + sy) * out_w + x * scale;
                out[base..base + scale].fill(c);
            }
        }
    }
}

/// Map a window position to a (row, visible column) cell.
pub fn cell_at(x: f32, y: f32, scale: usize) -> Option<(u8, u8)> {
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let (px, py) = (x as usize / scale.max(1), y as usize / scale.max(1));
    let col = px.checked_sub(MARGIN)? / (GLYPH_W + GAP);
    let row = py.checked_sub(MARGIN)? / (CELL_H + GAP);
    (col < VISIBLE_COLS && row < 2).then_some((row as u8, col as u8))
}

/// Text rendering of the window for headless and interactive modes.
pub fn text_frame(lcd: &Lcd) -> String {
    let border = format!("+{}+", "-".repeat(VISIBLE_COLS));
    let powered = lcd.display_power() == DisplayPower::On;
    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    for row in 0..2u8 {
        let shown = powered && (row == 0 || lcd.line_count() == LineCount::Two);
        out.push('|');
        for &code in lcd.visible_row(row).iter() {
            out.push(if shown { font::to_char(code) } else { ' ' });
        }
        out.push_str("|\n");
    }
    out.push_str(&border);
    out.push('\n');

    let cursor = lcd.cursor();
    let config = lcd.config();
    out.push_str(&format!(
        "cursor R{} C{}  offset {}  {} | {} | {} | {} | Cursor {}\n",
        cursor.row,
        cursor.column,
        lcd.offset(),
        config.bus_width,
        config.line_count,
        config.entry,
        config.display_power,
        config.cursor_style,
    ));
    out.push_str(&format!(
        "{}  bus {}  backlight {}\n",
        lcd.lines(),
        lcd.bus().bit_string(),
        if lcd.backlight() { "on" } else { "off" }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcdsim_core::{ConfigChange, InputFormat};

    fn powered() -> Lcd {
        let mut lcd = Lcd::new();
        lcd.apply_config(ConfigChange::DisplayPower(DisplayPower::On));
        lcd
    }

    #[test]
    fn test_text_frame_shows_window() {
        let mut lcd = powered();
        lcd.send_text("Hi", InputFormat::Ascii);
        lcd.send_command(0xC0);
        lcd.send_text("there", InputFormat::Ascii);
        let text = text_frame(&lcd);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "|Hi              |");
        assert_eq!(lines[2], "|there           |");
        assert!(lines[4].starts_with("cursor R1 C5  offset 0"));
    }

    #[test]
    fn test_display_off_is_blank() {
        let mut lcd = Lcd::new();
        lcd.send_text("Hi", InputFormat::Ascii);
        assert!(text_frame(&lcd).contains("|                |"));
    }

    #[test]
    fn test_render_underline_cursor() {
        let mut lcd = powered();
        lcd.apply_config(ConfigChange::CursorStyle(CursorStyle::Underline));
        let mut buf = vec![0u32; FRAME_W * FRAME_H];
        render(&lcd, true, &mut buf);
        let y = MARGIN + CELL_H - 1;
        assert_eq!(buf[y * FRAME_W + MARGIN], LIT.dot_on);
        assert_eq!(buf[y * FRAME_W + MARGIN + GLYPH_W + GAP], LIT.dot_off);
    }

    #[test]
    fn test_render_glyph_pixels() {
        let mut lcd = powered();
        lcd.send_text("I", InputFormat::Ascii);
        let mut buf = vec![0u32; FRAME_W * FRAME_H];
        render(&lcd, false, &mut buf);
        let x = MARGIN + 2;
        assert!((0..GLYPH_H).all(|y| buf[(MARGIN + y) * FRAME_W + x] == LIT.dot_on));
    }

    #[test]
    fn test_cell_hit_testing() {
        assert_eq!(cell_at(MARGIN as f32, MARGIN as f32, 1), Some((0, 0)));
        let x = (MARGIN + 3 * (GLYPH_W + GAP)) * 4;
        let y = (MARGIN + CELL_H + GAP) * 4;
        assert_eq!(cell_at(x as f32, y as f32, 4), Some((1, 3)));
        assert_eq!(cell_at(0.0, 0.0, 1), None);
        assert_eq!(cell_at(-1.0, 5.0, 1), None);
    }

    #[test]
    fn test_scale_into() {
        let frame = vec![7u32; FRAME_W * FRAME_H];
        let mut out = vec![0u32; FRAME_W * FRAME_H * 4];
        scale_into(&frame, 2, &mut out);
        assert!(out.iter().all(|&c| c == 7));
    }
}
