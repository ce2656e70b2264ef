//! Simple TOML parser for link configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! the link configuration. It does NOT support the full TOML language.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - Integers in decimal or `0x` hexadecimal
//! - [section] headers
//! - Comments (# ...)
//!
//! NOT supported:
//! - Multi-line strings
//! - Arrays and inline tables
//! - Dotted keys

use dmlink_hal::{DataBits, Parity, StopBits};
use dmlink_protocol::Checksum;

use super::types::LinkConfig;
use crate::select::InputSource;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection,
    /// Line is neither a section header nor `key = value`
    InvalidLine,
    /// Key not valid in the current section
    UnknownKey,
    /// Invalid value type or out of range
    InvalidValue,
}

/// Every key the parser accepts, per section (`""` is the root table)
///
/// build.rs checks link.toml against this list so a misspelled key fails
/// the build instead of silently keeping its default.
pub const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("", &["version"]),
    (
        "link",
        &["node_address", "checksum", "validate_inbound", "resync_on_full"],
    ),
    ("uart", &["baudrate", "data_bits", "parity", "stop_bits"]),
    (
        "input",
        &[
            "adjuster",
            "hdmi",
            "displayport",
            "confirm_attempts",
            "response_timeout_ms",
            "initial",
        ],
    ),
];

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Link,
    Uart,
    Input,
}

impl Section {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "" => Some(Section::Root),
            "link" => Some(Section::Link),
            "uart" => Some(Section::Uart),
            "input" => Some(Section::Input),
            _ => None,
        }
    }
}

/// Parse TOML configuration into LinkConfig
///
/// Keys that are not present keep their default value.
pub fn parse_config(input: &str) -> Result<LinkConfig, ParseError> {
    let mut config = LinkConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('[') {
            let name = name.strip_suffix(']').ok_or(ParseError::InvalidSection)?;
            section = match Section::from_name(name.trim()) {
                Some(Section::Root) | None => return Err(ParseError::InvalidSection),
                Some(named) => named,
            };
            continue;
        }

        let (key, value) = line.split_once('=').ok_or(ParseError::InvalidLine)?;
        apply(&mut config, section, key.trim(), value.trim())?;
    }

    Ok(config)
}

/// Store one key/value pair
fn apply(config: &mut LinkConfig, section: Section, key: &str, value: &str) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Root, "version") => config.version = parse_u8(value)?,

        (Section::Link, "node_address") => config.node_address = parse_u8(value)?,
        (Section::Link, "checksum") => {
            config.checksum =
                Checksum::from_name(parse_str(value)?).ok_or(ParseError::InvalidValue)?;
        }
        (Section::Link, "validate_inbound") => config.validate_inbound = parse_bool(value)?,
        (Section::Link, "resync_on_full") => config.resync_on_full = parse_bool(value)?,

        (Section::Uart, "baudrate") => config.uart.baudrate = parse_int(value)?,
        (Section::Uart, "data_bits") => {
            config.uart.data_bits = match parse_int(value)? {
                7 => DataBits::Seven,
                8 => DataBits::Eight,
                9 => DataBits::Nine,
                _ => return Err(ParseError::InvalidValue),
            };
        }
        (Section::Uart, "parity") => {
            config.uart.parity = match parse_str(value)? {
                "none" => Parity::None,
                "even" => Parity::Even,
                "odd" => Parity::Odd,
                _ => return Err(ParseError::InvalidValue),
            };
        }
        (Section::Uart, "stop_bits") => {
            config.uart.stop_bits = match parse_int(value)? {
                1 => StopBits::One,
                2 => StopBits::Two,
                _ => return Err(ParseError::InvalidValue),
            };
        }

        (Section::Input, "adjuster") => config.input.adjuster = parse_u8(value)?,
        (Section::Input, "hdmi") => config.input.hdmi_code = parse_u8(value)?,
        (Section::Input, "displayport") => config.input.displayport_code = parse_u8(value)?,
        (Section::Input, "confirm_attempts") => {
            let attempts = parse_u8(value)?;
            if attempts == 0 {
                return Err(ParseError::InvalidValue);
            }
            config.input.confirm_attempts = attempts;
        }
        (Section::Input, "response_timeout_ms") => {
            config.input.response_timeout_ms =
                u16::try_from(parse_int(value)?).map_err(|_| ParseError::InvalidValue)?;
        }
        (Section::Input, "initial") => {
            config.input.initial = match parse_str(value)? {
                "hdmi" => InputSource::Hdmi,
                "displayport" | "dp" => InputSource::DisplayPort,
                _ => return Err(ParseError::InvalidValue),
            };
        }

        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Drop a trailing `# comment` that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_int(value: &str) -> Result<u32, ParseError> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|_| ParseError::InvalidValue)
}

fn parse_u8(value: &str) -> Result<u8, ParseError> {
    u8::try_from(parse_int(value)?).map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_str(value: &str) -> Result<&str, ParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue)
}
