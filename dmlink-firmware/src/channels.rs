//! Inter-task communication signals
//!
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use dmlink_core::select::InputSource;

/// User asked to switch to the other video input
pub static TOGGLE_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Input the DM board confirmed after the last switch request
pub static INPUT_STATE: Signal<CriticalSectionRawMutex, InputSource> = Signal::new();
