use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::progress::Smoother;

/// Drive `smoother` toward the latest raw progress.
///
/// Ticks every `frame_interval` while the spring is moving and parks on the
/// input channels once it rests. Override changes apply on receipt.
pub async fn run(
    mut smoother: Smoother,
    mut raw_rx: watch::Receiver<f64>,
    mut override_rx: watch::Receiver<Option<f64>>,
    smoothed_tx: watch::Sender<f64>,
    frame_interval: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    smoother.set_target(*raw_rx.borrow_and_update());
    smoother.pin(*override_rx.borrow_and_update());
    publish(&smoothed_tx, smoother.value());

    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();
    let mut raw_open = true;
    let mut override_open = true;

    loop {
        let moving = !smoother.is_resting();
        select! {
            _ = cancel.cancelled() => break,
            changed = raw_rx.changed(), if raw_open => {
                if changed.is_err() {
                    // Source gone; keep converging on the last target.
                    raw_open = false;
                    continue;
                }
                if !moving {
                    // Restart the clock so the first step after a rest is one frame long.
                    last_tick = Instant::now();
                    ticker.reset();
                }
                smoother.set_target(*raw_rx.borrow_and_update());
            }
            changed = override_rx.changed(), if override_open => {
                if changed.is_err() {
                    override_open = false;
                    continue;
                }
                let pinned = *override_rx.borrow_and_update();
                debug!(?pinned, "progress override changed");
                smoother.pin(pinned);
                publish(&smoothed_tx, smoother.value());
            }
            now = ticker.tick(), if moving => {
                let dt = now.saturating_duration_since(last_tick);
                last_tick = now;
                let value = smoother.step(dt);
                publish(&smoothed_tx, value);
            }
        }
    }
    Ok(())
}

fn publish(tx: &watch::Sender<f64>, value: f64) {
    tx.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        *current = value;
        true
    });
}
