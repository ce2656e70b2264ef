//! Configuration types
//!
//! The link configuration is written by hand as a small TOML file and can be
//! stored as postcard binary data.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError, KNOWN_KEYS};
pub use types::*;
