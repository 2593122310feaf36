//! lcdsim frontend.
//!
//! Provides three execution modes:
//!
//! - **GUI mode** (default): scaled window with 5×7 glyphs, blinking cursor,
//!   control-line and data-bus indicators. Printable keys write characters.
//! - **Headless mode** (`--headless [--script FILE]`): runs a command script
//!   and prints the display as text.
//! - **Interactive mode** (`--interactive`): stdin REPL over the same command
//!   language.
//!
//! GUI keys:
//!
//! | Key              | Action                                   |
//! |------------------|------------------------------------------|
//! | printable        | write the character                      |
//! | Left / Right     | move cursor (0x10 / 0x14)                |
//! | PgUp / PgDn      | shift display left / right (0x18 / 0x1C) |
//! | F1 / F2          | clear display / return home              |
//! | F3 / F4          | display power / cycle cursor style       |
//! | F6               | toggle entry direction                   |
//! | F7               | pulse EN with the current bus byte       |
//! | F8               | backlight                                |
//! | F10 / F11        | toggle RS / RW                           |
//! | Ctrl+0..7        | toggle data line D0..D7                  |
//! | Ctrl+Z           | undo                                     |
//! | F5 / F9          | save / load state                        |
//! | click            | move cursor to the clicked cell          |
//! | Esc              | quit                                     |

mod activity_log;
mod font;
mod render;
mod script;
mod timers;

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use lcdsim_core::config::{BusWidth, CursorStyle, DisplayPower, LineCount};
use lcdsim_core::{ConfigChange, EntryDirection, InputFormat, Lcd};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use render::{FRAME_H, FRAME_W};
use script::Session;
use timers::{BlinkTimer, PulseTimer};

const TITLE: &str = "lcdsim 16x2";
const DEFAULT_STATE_FILE: &str = "lcdsim.state";

#[derive(Parser, Debug)]
#[command(name = "lcdsim", version, about = "HD44780-style 16x2 character LCD simulator")]
struct Args {
    /// Run without a window.
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Read commands from stdin.
    #[arg(long, default_value_t = false, conflicts_with = "headless")]
    interactive: bool,

    /// Command script to run; implies --headless.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Window scale 1-8.
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(1..=8))]
    scale: u8,

    /// Activity log lines kept.
    #[arg(long, default_value_t = activity_log::DEFAULT_LINES)]
    log_lines: usize,

    /// Debug diagnostics on stderr.
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Trace diagnostics on stderr.
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Restore a saved session at startup.
    #[arg(long, value_name = "FILE")]
    load_state: Option<PathBuf>,

    /// Save file for F5/F9, and where headless runs store the final state.
    #[arg(long, value_name = "FILE")]
    save_state: Option<PathBuf>,

    /// Initial bus width: 4 or 8.
    #[arg(long)]
    bus: Option<BusWidth>,

    /// Initial line count: 1 or 2.
    #[arg(long)]
    lines: Option<LineCount>,

    /// Initial entry direction: inc or dec.
    #[arg(long)]
    entry: Option<EntryDirection>,

    /// Initial display power: on or off.
    #[arg(long)]
    display: Option<DisplayPower>,

    /// Initial cursor: hidden, underline or blink.
    #[arg(long)]
    cursor: Option<CursorStyle>,

    /// Cursor blink half-period in milliseconds.
    #[arg(long, default_value_t = timers::DEFAULT_BLINK.as_millis() as u64)]
    blink_ms: u64,

    /// Enable pulse width in milliseconds.
    #[arg(long, default_value_t = timers::DEFAULT_PULSE.as_millis() as u64)]
    pulse_ms: u64,
}

// ─── Logging ────────────────────────────────────────────────────────────────

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(args: &Args) {
    let level = if args.trace {
        log::LevelFilter::Trace
    } else if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

// ─── Startup ────────────────────────────────────────────────────────────────

/// Build the controller and push CLI configuration through the constraint engine.
fn build_lcd(args: &Args) -> Lcd {
    let mut lcd = Lcd::new();
    let changes = [
        args.bus.map(ConfigChange::BusWidth),
        args.lines.map(ConfigChange::LineCount),
        args.entry.map(ConfigChange::EntryMode),
        args.display.map(ConfigChange::DisplayPower),
        args.cursor.map(ConfigChange::CursorStyle),
    ];
    for change in changes.into_iter().flatten() {
        lcd.apply_config(change);
    }
    lcd
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut session = Session::new(build_lcd(&args), args.log_lines);
    if let Some(path) = &args.load_state {
        session.load(path)?;
    }

    if args.interactive {
        run_interactive(&mut session)
    } else if args.headless || args.script.is_some() {
        run_headless(&args, &mut session)
    } else {
        run_gui(&args, &mut session)
    }
}

// ─── GUI Mode ───────────────────────────────────────────────────────────────

/// Collects typed characters from the window.
struct CharQueue(Rc<RefCell<Vec<u32>>>);

impl minifb::InputCallback for CharQueue {
    fn add_char(&mut self, uni_char: u32) {
        self.0.borrow_mut().push(uni_char);
    }
}

const BUS_KEYS: [Key; 8] = [
    Key::Key0, Key::Key1, Key::Key2, Key::Key3,
    Key::Key4, Key::Key5, Key::Key6, Key::Key7,
];

fn next_cursor_style(style: CursorStyle) -> CursorStyle {
    match style {
        CursorStyle::Hidden => CursorStyle::Underline,
        CursorStyle::Underline => CursorStyle::BlinkingBlock,
        CursorStyle::BlinkingBlock => CursorStyle::Hidden,
    }
}

fn run_gui(args: &Args, session: &mut Session) -> Result<()> {
    let scale = args.scale as usize;
    let (scaled_w, scaled_h) = (FRAME_W * scale, FRAME_H * scale);
    let state_path = args.save_state.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

    let mut window = Window::new(TITLE, scaled_w, scaled_h, WindowOptions::default())
        .context("creating window")?;
    window.set_target_fps(60);
    let typed = Rc::new(RefCell::new(Vec::new()));
    window.set_input_callback(Box::new(CharQueue(typed.clone())));

    let mut frame = vec![0u32; FRAME_W * FRAME_H];
    let mut scaled_buf = vec![0u32; scaled_w * scaled_h];
    let mut blink = BlinkTimer::new(Duration::from_millis(args.blink_ms), Instant::now());
    let mut pulse = PulseTimer::new(Duration::from_millis(args.pulse_ms));
    let mut prev_click = false;
    let mut seen = session.log.total();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let now = Instant::now();
        if pulse.poll(now) {
            session.lcd.release_enable();
        }

        let ctrl = window.is_key_down(Key::LeftCtrl) || window.is_key_down(Key::RightCtrl);
        let chars: Vec<u32> = typed.borrow_mut().drain(..).collect();
        if !ctrl {
            for ch in chars.into_iter().filter_map(char::from_u32).filter(|c| (' '..='~').contains(c)) {
                session.checkpoint();
                session.lcd.send_text(ch.encode_utf8(&mut [0; 4]), InputFormat::Ascii);
            }
        }

        let pressed = |key: Key| window.is_key_pressed(key, KeyRepeat::No);
        let repeated = |key: Key| window.is_key_pressed(key, KeyRepeat::Yes);

        let mut command = None;
        if repeated(Key::Left) {
            command = Some(0x10);
        } else if repeated(Key::Right) {
            command = Some(0x14);
        } else if repeated(Key::PageUp) {
            command = Some(0x18);
        } else if repeated(Key::PageDown) {
            command = Some(0x1C);
        } else if pressed(Key::F1) {
            command = Some(0x01);
        } else if pressed(Key::F2) {
            command = Some(0x02);
        }
        if let Some(byte) = command {
            session.checkpoint();
            session.lcd.execute_user_command(byte);
            blink.reset(now);
        }

        let config = *session.lcd.config();
        let mut change = None;
        if pressed(Key::F3) {
            change = Some(ConfigChange::DisplayPower(match config.display_power {
                DisplayPower::On => DisplayPower::Off,
                DisplayPower::Off => DisplayPower::On,
            }));
        } else if pressed(Key::F4) {
            change = Some(ConfigChange::CursorStyle(next_cursor_style(config.cursor_style)));
        } else if pressed(Key::F6) {
            change = Some(ConfigChange::EntryMode(match config.entry {
                EntryDirection::Increment => EntryDirection::Decrement,
                EntryDirection::Decrement => EntryDirection::Increment,
            }));
        }
        if let Some(change) = change {
            session.checkpoint();
            session.lcd.apply_config(change);
        }

        if pressed(Key::F7) {
            session.checkpoint();
            session.lcd.pulse_enable();
            pulse.start(now);
        }
        if pressed(Key::F8) {
            let on = !session.lcd.backlight();
            session.lcd.set_backlight(on);
        }
        if pressed(Key::F10) {
            let rs = !session.lcd.lines().register_select;
            session.lcd.set_register_select(rs);
        }
        if pressed(Key::F11) {
            let rw = !session.lcd.lines().read_write;
            session.lcd.set_read_write(rw);
        }
        if ctrl {
            for (i, key) in BUS_KEYS.iter().enumerate() {
                if pressed(*key) {
                    session.lcd.toggle_bus_line(i as u8);
                }
            }
            if pressed(Key::Z) && !session.undo() {
                session.log.push("Nothing to undo");
            }
        }
        if pressed(Key::F5) {
            if let Err(e) = session.save(&state_path) {
                log::error!("{:#}", e);
            }
        }
        if pressed(Key::F9) {
            if let Err(e) = session.load(&state_path) {
                log::error!("{:#}", e);
            }
        }

        let click = window.get_mouse_down(MouseButton::Left);
        if click && !prev_click {
            let cell = window
                .get_mouse_pos(MouseMode::Discard)
                .and_then(|(x, y)| render::cell_at(x, y, scale));
            if let Some((row, col)) = cell {
                session.checkpoint();
                session.lcd.select_cell(row, col);
                blink.reset(now);
            }
        }
        prev_click = click;

        session.sync_log();
        if session.log.total() != seen {
            for line in session.log.since(seen) {
                println!("{}", line);
            }
            seen = session.log.total();
            if let Some(last) = session.log.last() {
                window.set_title(&format!("{} - {}", TITLE, last));
            }
        }

        render::render(&session.lcd, blink.tick(now), &mut frame);
        render::scale_into(&frame, scale, &mut scaled_buf);
        window
            .update_with_buffer(&scaled_buf, scaled_w, scaled_h)
            .context("updating window")?;
    }
    Ok(())
}

// ─── Headless Mode ──────────────────────────────────────────────────────────

fn run_headless(args: &Args, session: &mut Session) -> Result<()> {
    if let Some(path) = &args.script {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        session.run_script(&source, |text| print!("{}", text))?;
    }
    print!("{}", render::text_frame(&session.lcd));
    if let Some(path) = &args.save_state {
        session.save(path)?;
    }
    Ok(())
}

// ─── Interactive Mode ───────────────────────────────────────────────────────

fn run_interactive(session: &mut Session) -> Result<()> {
    println!("lcdsim interactive: type commands (show, data ascii Hi, cmd 0x01, ...), q to quit");
    print!("{}", render::text_frame(&session.lcd));

    let stdin = std::io::stdin();
    let mut seen = session.log.total();
    loop {
        print!("lcd> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "q" | "quit" | "exit" => break,
            _ => {}
        }
        match session.run_line(&line) {
            Ok(Some(text)) => print!("{}", text),
            Ok(None) => {}
            Err(e) => println!("error: {:#}", e),
        }
        for entry in session.log.since(seen) {
            println!("  {}", entry);
        }
        seen = session.log.total();
    }
    Ok(())
}
