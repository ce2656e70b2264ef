//! Board-agnostic link logic for the dmlink firmware
//!
//! This crate contains the application logic that does not depend on a
//! specific board:
//!
//! - Link configuration (TOML subset and postcard binary forms)
//! - The [`link::Link`] facade tying the receive ring, frame parser, packet
//!   builder and transmitter together
//! - The input-select state machine driving the DM board's input adjuster
//! - The console line buffer used by the debug echo port

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod console;
pub mod link;
pub mod select;
