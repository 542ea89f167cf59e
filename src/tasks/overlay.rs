use anyhow::Result;
use tokio::select;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::overlay::{Narrative, OverlayFrame};

/// Re-derive beat opacities whenever smoothed progress moves.
pub async fn run(
    narrative: Narrative,
    mut smoothed_rx: watch::Receiver<f64>,
    overlay_tx: watch::Sender<OverlayFrame>,
    cancel: CancellationToken,
) -> Result<()> {
    overlay_tx.send_replace(narrative.sample(*smoothed_rx.borrow_and_update()));

    loop {
        select! {
            _ = cancel.cancelled() => break,
            changed = smoothed_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = *smoothed_rx.borrow_and_update();
                overlay_tx.send_replace(narrative.sample(s));
            }
        }
    }
    Ok(())
}
