//! STM32F0-specific HAL for the dmlink firmware
//!
//! Connects embassy-stm32 serial drivers to the `dmlink-hal` traits.
//! Supported chips:
//!
//! - STM32F042K6 (Nucleo-32 controller board)
//!
//! # Features
//!
//! - `stm32f042k6` - Enable support for STM32F042K6
//! - `defmt` - Enable debug formatting support

#![no_std]

pub mod uart;

pub use uart::{usart_config, SerialRx, SerialTx, UartBusError};
