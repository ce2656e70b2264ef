//! dmlink Controller Firmware
//!
//! Firmware for an STM32F042K6 board that switches the video input of a
//! display-module (DM) board over its RS-232 command link.
//!
//! - USART2 (PA2=TX, PA3=RX): link to the DM board
//! - USART1 (PA9=TX, PA10=RX): debug console
//! - PA1: input toggle button (active low)

#![no_std]
#![no_main]

mod channels;
mod tasks;

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::bind_interrupts;
use embassy_stm32::exti::{self, ExtiInput};
use embassy_stm32::gpio::Pull;
use embassy_stm32::peripherals::{USART1, USART2};
use embassy_stm32::usart::{self, BufferedUart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use dmlink_core::config::{parse_config, LinkConfig, MAX_CONFIG_SIZE};
use dmlink_core::link::Link;
use dmlink_hal_stm32f0::{usart_config, SerialRx, SerialTx};
use dmlink_protocol::SharedRing;

use crate::tasks::RX_RING_SIZE;

/// Embedded configuration (compiled into firmware)
/// Edit link.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../link.toml");

/// UART driver buffer size
const UART_BUF_SIZE: usize = 64;

bind_interrupts!(struct Irqs {
    USART1 => usart::BufferedInterruptHandler<USART1>;
    USART2 => usart::BufferedInterruptHandler<USART2>;
    EXTI0_1 => exti::InterruptHandler<embassy_stm32::interrupt::typelevel::EXTI0_1>;
});

// Receive ring shared by the link RX task (producer) and link task (consumer)
static RX_RING: StaticCell<SharedRing<RX_RING_SIZE>> = StaticCell::new();

// Static cells for UART buffers (must live forever)
static LINK_TX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();
static LINK_RX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();
static CONSOLE_TX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();
static CONSOLE_RX_BUF: StaticCell<[u8; UART_BUF_SIZE]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("dmlink firmware starting...");

    let config = load_config();
    let p = embassy_stm32::init(Default::default());

    // Link to the DM board
    let link_uart = BufferedUart::new(
        p.USART2,
        p.PA3, // RX
        p.PA2, // TX
        LINK_TX_BUF.init([0u8; UART_BUF_SIZE]),
        LINK_RX_BUF.init([0u8; UART_BUF_SIZE]),
        Irqs,
        usart_config(&config.uart),
    )
    .unwrap();
    let (link_tx, link_rx) = link_uart.split();

    info!(
        "Link UART at {} baud, checksum {:?}",
        config.uart.baudrate, config.checksum
    );

    // Debug console, fixed at 115200 8N1
    let mut console_config = usart::Config::default();
    console_config.baudrate = 115200;

    let console_uart = BufferedUart::new(
        p.USART1,
        p.PA10, // RX
        p.PA9,  // TX
        CONSOLE_TX_BUF.init([0u8; UART_BUF_SIZE]),
        CONSOLE_RX_BUF.init([0u8; UART_BUF_SIZE]),
        Irqs,
        console_config,
    )
    .unwrap();
    let (console_tx, console_rx) = console_uart.split();

    let button = ExtiInput::new(p.PA1, p.EXTI1, Pull::Up, Irqs);

    let ring = RX_RING.init(SharedRing::new());
    let (producer, consumer) = ring.split();
    let link = Link::new(consumer, SerialTx::new(link_tx), &config);

    // Spawn tasks
    spawner
        .spawn(tasks::link_rx_task(SerialRx::new(link_rx), producer))
        .unwrap();
    spawner.spawn(tasks::link_task(link, config.input)).unwrap();
    spawner.spawn(tasks::button_task(button)).unwrap();
    spawner
        .spawn(tasks::console_task(console_tx, console_rx))
        .unwrap();

    info!("All tasks spawned");
}

/// Parse the embedded link.toml
///
/// Falls back to built-in defaults if the file is rejected. build.rs runs
/// the same parser on the host and fails the build on any error, so the
/// fallback only covers a firmware built without that check.
fn load_config() -> LinkConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Loaded embedded configuration");
            config
        }
        Err(e) => {
            error!("Invalid embedded configuration ({:?}), using defaults", e);
            LinkConfig::default()
        }
    };

    let mut snapshot = [0u8; MAX_CONFIG_SIZE];
    match config.encode(&mut snapshot) {
        Ok(len) => debug!("Config snapshot: {=[u8]:x}", &snapshot[..len]),
        Err(e) => warn!("Config snapshot failed: {:?}", e),
    }

    config
}
