//! Input toggle button

use defmt::*;
use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Timer};

use crate::channels::TOGGLE_REQUEST;

/// Minimum press length counted as a click
const MIN_PRESS_MS: u64 = 50;

/// Button press task
#[embassy_executor::task]
pub async fn button_task(mut btn: ExtiInput<'static>) {
    info!("Button task started");

    loop {
        btn.wait_for_falling_edge().await;
        let press_start = embassy_time::Instant::now();

        // Debounce
        Timer::after(Duration::from_millis(20)).await;

        if btn.is_low() {
            btn.wait_for_rising_edge().await;

            if press_start.elapsed().as_millis() > MIN_PRESS_MS {
                debug!("Button: toggle input");
                TOGGLE_REQUEST.signal(());
            }

            // Debounce after release
            Timer::after(Duration::from_millis(50)).await;
        }
    }
}
