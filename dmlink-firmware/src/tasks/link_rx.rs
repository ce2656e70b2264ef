//! Link UART receive task
//!
//! Sole producer of the receive ring: moves bytes from the UART driver
//! into the ring as soon as they arrive.

use defmt::*;
use embassy_time::Timer;

use dmlink_core::link::pump;
use dmlink_protocol::RxProducer;

use super::{LinkUartRx, RX_RING_SIZE};

/// Link RX task - feeds received bytes into the ring
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: LinkUartRx, mut producer: RxProducer<'static, RX_RING_SIZE>) {
    info!("Link RX task started");

    loop {
        if let Err(e) = rx.wait_ready().await {
            warn!("UART read error: {:?}", e);
            Timer::after_millis(10).await;
            continue;
        }

        match pump(&mut rx, &mut producer) {
            Ok(report) => {
                trace!("RX: {} bytes", report.accepted);
                if report.dropped > 0 {
                    warn!(
                        "RX ring full, dropped {} bytes ({} total)",
                        report.dropped,
                        producer.overflow_count()
                    );
                }
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
