use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{FramePainted, FrameTable, LoadState};
use crate::progress::frame_index;
use crate::surface::DrawSurface;

/// Paints the frame for the current progress onto a surface.
pub struct RenderLoop<S> {
    surface: S,
    sized: bool,
    painted: u64,
}

impl<S: DrawSurface> RenderLoop<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            sized: false,
            painted: 0,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Number of successful paints so far.
    pub fn painted(&self) -> u64 {
        self.painted
    }

    /// One render tick. Skips painting while there is nothing to show.
    ///
    /// The surface is sized to the first frame of the first non-empty table
    /// and keeps that size for the rest of the loop's life.
    pub fn tick(&mut self, table: Option<&FrameTable>, progress: f64) -> Option<FramePainted> {
        let table = table.filter(|t| !t.is_empty())?;
        if !self.sized {
            if let Some(first) = table.first() {
                let (width, height) = first.dimensions();
                self.surface.set_dimensions(width, height);
                info!(width, height, "render surface sized to first frame");
            }
            self.sized = true;
        }

        let index = frame_index(progress, table.len());
        let frame = table.get(index)?;
        match self.surface.draw_frame(frame) {
            Ok(()) => {
                self.painted += 1;
                Some(FramePainted {
                    index,
                    sequence_index: frame.sequence_index,
                })
            }
            Err(err) => {
                warn!(error = %err, index, "failed to paint frame");
                None
            }
        }
    }
}

/// Redraw every `frame_interval` until cancelled, then hand the surface back.
///
/// Each tick samples the latest load state and smoothed progress; it paints
/// even when the index has not changed.
pub async fn run<S: DrawSurface>(
    surface: S,
    mut loads: watch::Receiver<LoadState>,
    progress: watch::Receiver<f64>,
    painted_tx: watch::Sender<Option<FramePainted>>,
    frame_interval: Duration,
    cancel: CancellationToken,
) -> Result<S> {
    let mut render = RenderLoop::new(surface);
    let mut table: Option<Arc<FrameTable>> = loads.borrow_and_update().table().cloned();
    let mut ticker = interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if table.is_none() && loads.has_changed().unwrap_or(false) {
                    table = loads.borrow_and_update().table().cloned();
                }
                let p = *progress.borrow();
                if let Some(painted) = render.tick(table.as_deref(), p) {
                    painted_tx.send_if_modified(|last| {
                        let changed = *last != Some(painted);
                        *last = Some(painted);
                        changed
                    });
                }
            }
        }
    }

    debug!(painted = render.painted(), "render loop stopped");
    Ok(render.into_surface())
}
