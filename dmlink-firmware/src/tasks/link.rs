//! Link task
//!
//! Sole consumer of the receive ring. Polls for response frames on a fixed
//! tick, sends commands and drives the input selector.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Ticker};

use dmlink_core::config::InputSelectConfig;
use dmlink_core::link::LinkStats;
use dmlink_core::select::{InputSelector, SelectEvent, SelectOutcome, SelectStep};
use dmlink_protocol::{Command, ParseOutcome};

use super::DmLink;
use crate::channels::{INPUT_STATE, TOGGLE_REQUEST};

/// Receive ring poll period
const POLL_INTERVAL_MS: u64 = 5;

/// Link task - frame polling and input selection
#[embassy_executor::task]
pub async fn link_task(mut link: DmLink, config: InputSelectConfig) {
    info!("Link task started (node 0x{:x})", link.node());

    let mut selector = InputSelector::new(config);
    let timeout = Duration::from_millis(u64::from(config.response_timeout_ms));
    let mut deadline: Option<Instant> = None;
    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let mut last_stats = link.stats();

    INPUT_STATE.signal(selector.current());

    loop {
        if let Either::Second(()) = select(ticker.next(), TOGGLE_REQUEST.wait()).await {
            match selector.request_toggle() {
                Some(command) => {
                    info!("Switching input from {:?}", selector.current());
                    // Its answer (or timeout) triggers the first version query
                    send(&mut link, &command);
                    deadline = Some(Instant::now() + timeout);
                }
                None => warn!("Input switch already in progress"),
            }
        }

        loop {
            match link.poll() {
                Ok(ParseOutcome::Found(frame)) => {
                    debug!("Frame: type {:#x}", frame.kind());
                    if deadline.is_some() {
                        let step = selector.handle(SelectEvent::Response(frame.kind()));
                        deadline = follow_up(&mut link, step, timeout);
                    }
                }
                Ok(ParseOutcome::Rejected) => {
                    warn!("Frame rejected: checksum mismatch");
                }
                Ok(ParseOutcome::NotReady) | Ok(ParseOutcome::NotFound) => break,
                Err(e) => {
                    error!("Receive ring error: {:?}", e);
                    break;
                }
            }
        }

        if deadline.is_some_and(|at| Instant::now() >= at) {
            debug!("No response within {} ms", timeout.as_millis());
            let step = selector.handle(SelectEvent::NoResponse);
            deadline = follow_up(&mut link, step, timeout);
        }

        last_stats = report_stats(last_stats, link.stats());
    }
}

/// Act on the selector's answer; returns the next response deadline
fn follow_up(link: &mut DmLink, step: SelectStep, timeout: Duration) -> Option<Instant> {
    match step {
        SelectStep::Query => {
            send(link, &Command::GetVersion);
            Some(Instant::now() + timeout)
        }
        SelectStep::Done(SelectOutcome::Switched(source)) => {
            info!("Input switched to {:?}", source);
            INPUT_STATE.signal(source);
            None
        }
        SelectStep::Done(SelectOutcome::Unchanged(source)) => {
            warn!("Board kept input {:?}", source);
            INPUT_STATE.signal(source);
            None
        }
        SelectStep::Ignored => None,
    }
}

fn send(link: &mut DmLink, command: &Command) {
    match link.send(command) {
        Ok(()) => trace!("Sent {:?}", command),
        Err(e) => warn!("Failed to send {:?}: {:?}", command, e),
    }
}

/// Log receive-path counters that moved since the last call
fn report_stats(last: LinkStats, now: LinkStats) -> LinkStats {
    if now.parser.resynced_bytes != last.parser.resynced_bytes {
        warn!(
            "RX ring saturated, resync discarded {} bytes",
            now.parser.resynced_bytes - last.parser.resynced_bytes
        );
    }
    if now.parser.garbage_bytes != last.parser.garbage_bytes {
        debug!(
            "Skipped {} bytes in front of frames",
            now.parser.garbage_bytes - last.parser.garbage_bytes
        );
    }
    now
}
