use anyhow::Result;
use tokio::select;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cta::{CtaVisuals, ForcedOpen, RevealState};
use crate::events::UiCommand;

/// What the panel should currently look like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CtaSnapshot {
    pub state: RevealState,
    pub visuals: CtaVisuals,
}

impl Default for CtaSnapshot {
    fn default() -> Self {
        Self {
            state: RevealState::Natural,
            visuals: CtaVisuals::default(),
        }
    }
}

/// Apply open commands and progress updates to the forced-open machine and
/// publish the resulting visuals.
pub async fn run(
    mut machine: ForcedOpen,
    mut commands: broadcast::Receiver<UiCommand>,
    mut raw_rx: watch::Receiver<f64>,
    snapshot_tx: watch::Sender<CtaSnapshot>,
    cancel: CancellationToken,
) -> Result<()> {
    let publish = |machine: &ForcedOpen, visuals: CtaVisuals| {
        snapshot_tx.send_if_modified(|current| {
            let next = CtaSnapshot {
                state: machine.state(),
                visuals,
            };
            let changed = *current != next;
            *current = next;
            changed
        });
    };

    let initial = *raw_rx.borrow_and_update();
    let visuals = machine.on_progress(initial, Instant::now().into_std());
    publish(&machine, visuals);
    let mut commands_open = true;

    loop {
        select! {
            _ = cancel.cancelled() => break,
            command = commands.recv(), if commands_open => {
                let open = match command {
                    Ok(UiCommand::OpenCta) => true,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Every command on the bus opens the panel, so a gap still means open.
                        warn!(skipped, "cta command receiver lagged");
                        true
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        commands_open = false;
                        false
                    }
                };
                if open {
                    let was = machine.state();
                    let visuals = machine.open(Instant::now().into_std());
                    if was == RevealState::Natural {
                        info!("cta forced open");
                    }
                    publish(&machine, visuals);
                }
            }
            changed = raw_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let raw = *raw_rx.borrow_and_update();
                let was = machine.state();
                let visuals = machine.on_progress(raw, Instant::now().into_std());
                if was == RevealState::Forced && machine.state() == RevealState::Natural {
                    info!(raw, "cta released back to scroll control");
                }
                publish(&machine, visuals);
            }
        }
    }
    Ok(())
}
