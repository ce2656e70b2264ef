//! Build script for dmlink-firmware
//!
//! - Passes the cortex-m-rt and defmt linker scripts
//! - Validates link.toml at compile time, with the same parser the device
//!   runs on it

use std::fs;
use std::path::Path;

fn main() {
    setup_linker();
    validate_config();
}

/// Linker arguments for the firmware binary
///
/// memory.x itself comes from embassy-stm32's `memory-x` feature.
fn setup_linker() {
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate link.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=link.toml");

    let config_path = Path::new("link.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: link.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a link.toml configuration file.             ║\n\
            ║  Please create one in the dmlink-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read link.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in link.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_keys(&config, &mut errors);
    validate_link(&config, &mut errors);
    validate_uart(&config, &mut errors);
    validate_input(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid settings in link.toml                            ║\n\
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

    // The device parser has the final word, it falls back to defaults
    if let Err(e) = dmlink_core::config::parse_config(&config_content) {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: link.toml rejected by the firmware parser                ║\n\
            ║                                                                  ║\n\
            ║  Error: {:<56} ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format!("{:?}", e)
        );
    }

    println!("cargo:warning=link.toml validated successfully");
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

/// Report sections and keys the firmware does not know
fn validate_keys(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, value) in root {
        match value.as_table() {
            Some(table) => match known_keys(name) {
                Some(keys) => {
                    for key in table.keys() {
                        if !keys.contains(&key.as_str()) {
                            errors.push(format!("[{}] unknown key '{}'", name, key));
                        }
                    }
                }
                None => errors.push(format!("unknown section [{}]", name)),
            },
            None => {
                if !known_keys("").is_some_and(|keys| keys.contains(&name.as_str())) {
                    errors.push(format!("unknown top-level key '{}'", name));
                }
            }
        }
    }
}

fn known_keys(section: &str) -> Option<&'static [&'static str]> {
    dmlink_core::config::KNOWN_KEYS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, keys)| *keys)
}

/// Check an optional integer key against an inclusive range
fn check_int(table: &toml::Value, section: &str, key: &str, min: i64, max: i64, errors: &mut Vec<String>) {
    match table.get(key) {
        None => {}
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => {}
        Some(_) => errors.push(format!("[{}] {} must be an integer {}-{}", section, key, min, max)),
    }
}

/// Check an optional string key against a list of accepted values
fn check_choice(table: &toml::Value, section: &str, key: &str, choices: &[&str], errors: &mut Vec<String>) {
    match table.get(key) {
        None => {}
        Some(toml::Value::String(s)) if choices.contains(&s.as_str()) => {}
        Some(_) => errors.push(format!("[{}] {} must be one of {}", section, key, choices.join(", "))),
    }
}

fn check_bool(table: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(value) = table.get(key) {
        if !value.is_bool() {
            errors.push(format!("[{}] {} must be true or false", section, key));
        }
    }
}

fn validate_link(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(version) = config.get("version") {
        if version.as_integer() != Some(1) {
            errors.push("version must be 1".to_string());
        }
    }

    let Some(link) = config.get("link") else {
        return;
    };
    check_int(link, "link", "node_address", 0, 255, errors);
    check_choice(link, "link", "checksum", &["sum8", "sum", "xor8", "xor", "crc8", "crc"], errors);
    check_bool(link, "link", "validate_inbound", errors);
    check_bool(link, "link", "resync_on_full", errors);
}

fn validate_uart(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(uart) = config.get("uart") else {
        return;
    };
    check_int(uart, "uart", "baudrate", 1200, 1_000_000, errors);
    check_int(uart, "uart", "data_bits", 7, 9, errors);
    check_int(uart, "uart", "stop_bits", 1, 2, errors);
    check_choice(uart, "uart", "parity", &["none", "even", "odd"], errors);
}

fn validate_input(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(input) = config.get("input") else {
        return;
    };
    check_int(input, "input", "adjuster", 0, 255, errors);
    check_int(input, "input", "hdmi", 0, 255, errors);
    check_int(input, "input", "displayport", 0, 255, errors);
    check_int(input, "input", "confirm_attempts", 1, 255, errors);
    check_int(input, "input", "response_timeout_ms", 1, 65_535, errors);
    check_choice(input, "input", "initial", &["hdmi", "displayport", "dp"], errors);

    if let (Some(hdmi), Some(dp)) = (input.get("hdmi"), input.get("displayport")) {
        if hdmi == dp {
            errors.push("[input] hdmi and displayport codes must differ".to_string());
        }
    }
}
