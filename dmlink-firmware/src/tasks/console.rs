//! Debug console task
//!
//! Echoes typed lines back and reports confirmed input changes.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_stm32::usart::{BufferedUartRx, BufferedUartTx};
use embedded_io_async::Read;

use dmlink_core::console::{echo_line, LineBuffer};
use dmlink_core::select::InputSource;
use dmlink_hal_stm32f0::SerialTx;

use crate::channels::{INPUT_STATE, TOGGLE_REQUEST};

/// Longest console line kept, including room for the terminator
const LINE_SIZE: usize = 32;

/// Console task - line echo on the debug UART
#[embassy_executor::task]
pub async fn console_task(tx: BufferedUartTx<'static>, mut rx: BufferedUartRx<'static>) {
    info!("Console task started");

    let mut tx = SerialTx::new(tx);
    let mut lines = LineBuffer::<LINE_SIZE>::new();
    let mut buf = [0u8; 16];

    loop {
        match select(rx.read(&mut buf), INPUT_STATE.wait()).await {
            Either::First(Ok(n)) => {
                for &byte in &buf[..n] {
                    let Some(line) = lines.push(byte) else {
                        continue;
                    };

                    if let Err(e) = echo_line(&mut tx, &line) {
                        warn!("Console write failed: {:?}", e);
                    }
                    if line.as_slice() == b"toggle" {
                        TOGGLE_REQUEST.signal(());
                    }
                }
            }
            Either::First(Err(e)) => {
                warn!("Console read error: {:?}", e);
            }
            Either::Second(source) => {
                let name: &[u8] = match source {
                    InputSource::Hdmi => b"input: hdmi",
                    InputSource::DisplayPort => b"input: displayport",
                };
                if let Err(e) = echo_line(&mut tx, name) {
                    warn!("Console write failed: {:?}", e);
                }
            }
        }
    }
}
