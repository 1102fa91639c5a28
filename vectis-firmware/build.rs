//! Build script for vectis-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml at compile time
//! - Emits the validated settings as `board_config.rs` in OUT_DIR

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use vectis_hal::gpio::parse_pin_string;

/// SCI channels with a port configuration in the chip crate
const SCI_CHANNELS: &[i64] = &[0, 1, 2, 9];

const FORMATS: &[&str] = &["8N1", "8N2", "8E1", "8E2", "8O1", "8O2", "7E1", "7O1"];

const TRIGGERS: &[(&str, &str)] = &[
    ("falling", "Falling"),
    ("rising", "Rising"),
    ("both", "BothEdges"),
    ("low", "Low"),
];

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    setup_linker(&out_dir);
    let board = validate_config();
    write_board_config(&out_dir, &board);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Settings extracted from board.toml
struct Board {
    pclk_hz: i64,
    channel: i64,
    baud: i64,
    format: String,
    rx_buffer: i64,
    tx_buffer: i64,
    button: Option<(u8, u8, &'static str)>,
}

/// Validate board.toml configuration at compile time
fn validate_config() -> Board {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml configuration file.          ║\n\
            ║  Please create one in the vectis-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();

    let pclk_hz = require_int(&config, "board", "pclk_hz", &mut errors);
    if let Some(pclk) = pclk_hz {
        if !(1_000_000..=64_000_000).contains(&pclk) {
            errors.push("[board] pclk_hz must be 1-64 MHz".to_string());
        }
    }

    let channel = require_int(&config, "console", "channel", &mut errors);
    if let Some(ch) = channel {
        if !SCI_CHANNELS.contains(&ch) {
            errors.push("[console] channel must be 0, 1, 2 or 9".to_string());
        }
    }

    let baud = require_int(&config, "console", "baud", &mut errors);
    if let (Some(baud), Some(pclk)) = (baud, pclk_hz) {
        // 8x oversampling with BRR = 0 is the fastest divider
        if baud <= 0 || baud > pclk / 16 {
            errors.push(format!("[console] baud must be 1-{}", pclk / 16));
        }
    }

    let format = match config.get("console").and_then(|c| c.get("format")) {
        Some(toml::Value::String(f)) if FORMATS.contains(&f.as_str()) => Some(f.clone()),
        Some(_) => {
            errors.push("[console] format must be one of 8N1, 8N2, 8E1, 8E2, 8O1, 8O2, 7E1, 7O1".to_string());
            None
        }
        None => Some("8N1".to_string()),
    };

    let rx_buffer = buffer_size(&config, "rx_buffer", &mut errors);
    let tx_buffer = buffer_size(&config, "tx_buffer", &mut errors);
    let button = validate_button(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml validation failed                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=board.toml validated successfully");

    // Every None above pushed an error, so these are all present
    Board {
        pclk_hz: pclk_hz.unwrap(),
        channel: channel.unwrap(),
        baud: baud.unwrap(),
        format: format.unwrap(),
        rx_buffer,
        tx_buffer,
        button,
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn require_int(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> Option<i64> {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(v)) => Some(*v),
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            None
        }
    }
}

/// Ring buffer sizes default to 64 and are capped at 1 KiB each
fn buffer_size(config: &toml::Value, key: &str, errors: &mut Vec<String>) -> i64 {
    match config.get("console").and_then(|c| c.get(key)) {
        None => 64,
        Some(toml::Value::Integer(size)) if (1..=1024).contains(size) => *size,
        Some(_) => {
            errors.push(format!("[console] {} must be 1-1024", key));
            64
        }
    }
}

fn validate_button(config: &toml::Value, errors: &mut Vec<String>) -> Option<(u8, u8, &'static str)> {
    let button = config.get("button")?;

    let pin = match button.get("pin") {
        Some(toml::Value::String(s)) => match parse_pin_string(s) {
            Some(pin) => pin,
            None => {
                errors.push(format!("[button] pin '{}' is not of the form P105", s));
                return None;
            }
        },
        _ => {
            errors.push("[button] missing 'pin'".to_string());
            return None;
        }
    };

    let trigger = match button.get("trigger") {
        None => "Falling",
        Some(toml::Value::String(s)) => match TRIGGERS.iter().find(|(name, _)| name == s) {
            Some((_, variant)) => *variant,
            None => {
                errors.push("[button] trigger must be falling, rising, both or low".to_string());
                return None;
            }
        },
        Some(_) => {
            errors.push("[button] trigger must be a string".to_string());
            return None;
        }
    };

    Some((pin.port, pin.pin, trigger))
}

fn write_board_config(out_dir: &Path, board: &Board) {
    let button = match board.button {
        Some((port, pin, trigger)) => format!(
            "pub const BUTTON: Option<(PinId, Trigger)> = Some((PinId::new({}, {}), Trigger::{}));",
            port, pin, trigger
        ),
        None => "pub const BUTTON: Option<(PinId, Trigger)> = None;".to_string(),
    };

    let source = format!(
        "// Generated from board.toml by build.rs\n\
         pub const PCLK_HZ: u32 = {pclk};\n\
         pub const CONSOLE_PORT: PortConfig = ports::SCI{channel};\n\
         pub const CONSOLE_BAUD: u32 = {baud};\n\
         pub const CONSOLE_FORMAT: FrameFormat = uart::SERIAL_{format};\n\
         pub const CONSOLE_RX: usize = {rx};\n\
         pub const CONSOLE_TX: usize = {tx};\n\
         {button}\n",
        pclk = board.pclk_hz,
        channel = board.channel,
        baud = board.baud,
        format = board.format,
        rx = board.rx_buffer,
        tx = board.tx_buffer,
        button = button,
    );

    fs::write(out_dir.join("board_config.rs"), source).unwrap();
}
