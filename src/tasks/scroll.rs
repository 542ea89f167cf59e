use anyhow::Result;
use tokio::select;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::events::Viewport;
use crate::progress::ProgressSource;

/// Recompute raw progress on every scroll or resize until cancelled.
pub async fn run(
    source: ProgressSource,
    mut viewport_rx: watch::Receiver<Viewport>,
    raw_tx: watch::Sender<f64>,
    cancel: CancellationToken,
) -> Result<()> {
    let initial = source.raw_progress(&viewport_rx.borrow_and_update());
    raw_tx.send_replace(initial);

    loop {
        select! {
            _ = cancel.cancelled() => break,
            changed = viewport_rx.changed() => {
                if changed.is_err() {
                    // Observer dropped; progress stays where it was.
                    break;
                }
                let viewport = *viewport_rx.borrow_and_update();
                let raw = source.raw_progress(&viewport);
                trace!(scroll_y = viewport.scroll_y, raw, "raw progress");
                raw_tx.send_if_modified(|current| {
                    if *current == raw {
                        return false;
                    }
                    *current = raw;
                    true
                });
            }
        }
    }
    Ok(())
}
