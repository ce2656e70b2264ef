//! Embassy async tasks
//!
//! Each task runs independently and communicates via signals.

pub mod button;
pub mod console;
pub mod link;
pub mod link_rx;

use dmlink_core::link::Link;
use dmlink_hal_stm32f0::{SerialRx, SerialTx};
use embassy_stm32::usart::{BufferedUartRx, BufferedUartTx};

pub use button::button_task;
pub use console::console_task;
pub use link::link_task;
pub use link_rx::link_rx_task;

/// Receive ring capacity, room for several response frames
pub const RX_RING_SIZE: usize = 64;

pub type LinkUartTx = SerialTx<BufferedUartTx<'static>>;
pub type LinkUartRx = SerialRx<BufferedUartRx<'static>>;

/// Link to the DM board as owned by the link task
pub type DmLink = Link<'static, LinkUartTx, RX_RING_SIZE>;
