//! Mounting and unmounting the sequence player and the CTA panel.
//!
//! Each mount owns a child cancellation token. Every task it spawns stops on
//! that one token, so `unmount` tears the whole component down at once.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{Configuration, CtaConfig};
use crate::cta::ForcedOpen;
use crate::events::{CommandBus, FramePainted, LoadState};
use crate::overlay::{Narrative, OverlayFrame};
use crate::progress::{Container, ProgressSource, ScrollObserver, ScrollOffsets, Smoother};
use crate::surface::DrawSurface;
use crate::tasks::cta::CtaSnapshot;
use crate::tasks::loader::LoadPlan;
use crate::tasks::{cta, loader, overlay, renderer, scroll, smoother};

pub struct SequencePlayer;

impl SequencePlayer {
    /// Start loading frames and playing them against `observer`'s scroll
    /// position through `container`, tracked with `cfg.sequence.offsets`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount<S: DrawSurface>(
        cfg: &Configuration,
        observer: &ScrollObserver,
        container: Option<Container>,
        surface: S,
        parent: &CancellationToken,
    ) -> MountedPlayer<S> {
        let cancel = parent.child_token();
        let viewport = observer.current();
        let plan = LoadPlan::for_viewport(&cfg.sequence, viewport.width);
        let poster = plan.poster().map(Path::to_path_buf);
        let source = ProgressSource::new(container, cfg.sequence.offsets);
        let initial = source.raw_progress(&viewport);

        let (raw_tx, raw_rx) = watch::channel(initial); // Scroll -> Smoother
        let (override_tx, override_rx) = watch::channel::<Option<f64>>(None); // Caller -> Smoother
        let (smoothed_tx, smoothed_rx) = watch::channel(initial); // Smoother -> Renderer/Overlay
        let (load_tx, load_rx) = watch::channel(LoadState::Loading); // Loader -> Renderer
        let (overlay_tx, overlay_rx) = watch::channel(OverlayFrame::default()); // Overlay -> Caller
        let (painted_tx, painted_rx) = watch::channel::<Option<FramePainted>>(None); // Renderer -> Caller

        let mut tasks = JoinSet::new();

        tasks.spawn({
            let viewport_rx = observer.subscribe();
            let cancel = cancel.clone();
            async move {
                scroll::run(source, viewport_rx, raw_tx, cancel)
                    .await
                    .context("scroll task failed")
            }
        });

        tasks.spawn({
            let smoother_state = Smoother::new(cfg.spring, initial);
            let interval = cfg.render.frame_interval;
            let cancel = cancel.clone();
            let raw_rx = raw_rx.clone();
            async move {
                smoother::run(
                    smoother_state,
                    raw_rx,
                    override_rx,
                    smoothed_tx,
                    interval,
                    cancel,
                )
                .await
                .context("smoother task failed")
            }
        });

        tasks.spawn({
            let narrative = Narrative::from_config(&cfg.narrative);
            let smoothed_rx = smoothed_rx.clone();
            let cancel = cancel.clone();
            async move {
                overlay::run(narrative, smoothed_rx, overlay_tx, cancel)
                    .await
                    .context("overlay task failed")
            }
        });

        tasks.spawn({
            let policy = cfg.sequence.gap_policy;
            let cancel = cancel.clone();
            async move {
                loader::run(plan, policy, load_tx, cancel)
                    .await
                    .context("loader task failed")
            }
        });

        let render = tokio::spawn({
            let load_rx = load_rx.clone();
            let smoothed_rx = smoothed_rx.clone();
            let interval = cfg.render.frame_interval;
            let cancel = cancel.clone();
            async move {
                renderer::run(surface, load_rx, smoothed_rx, painted_tx, interval, cancel)
                    .await
                    .context("render task failed")
            }
        });

        info!(container = ?container, poster = ?poster, "sequence player mounted");
        MountedPlayer {
            cancel,
            poster,
            tasks,
            render,
            raw_rx,
            smoothed_rx,
            load_rx,
            overlay_rx,
            painted_rx,
            override_tx,
        }
    }
}

/// Live handles of a mounted player.
pub struct MountedPlayer<S> {
    cancel: CancellationToken,
    poster: Option<PathBuf>,
    tasks: JoinSet<Result<()>>,
    render: JoinHandle<Result<S>>,
    raw_rx: watch::Receiver<f64>,
    smoothed_rx: watch::Receiver<f64>,
    load_rx: watch::Receiver<LoadState>,
    overlay_rx: watch::Receiver<OverlayFrame>,
    painted_rx: watch::Receiver<Option<FramePainted>>,
    override_tx: watch::Sender<Option<f64>>,
}

impl<S> MountedPlayer<S> {
    pub fn is_loading(&self) -> bool {
        self.load_rx.borrow().is_loading()
    }

    /// First frame of the sequence, to show in place of the surface while
    /// `is_loading()` holds.
    pub fn poster(&self) -> Option<&Path> {
        self.poster.as_deref()
    }

    pub fn raw_progress(&self) -> f64 {
        *self.raw_rx.borrow()
    }

    pub fn smoothed_progress(&self) -> f64 {
        *self.smoothed_rx.borrow()
    }

    pub fn last_painted(&self) -> Option<FramePainted> {
        *self.painted_rx.borrow()
    }

    pub fn overlay(&self) -> OverlayFrame {
        self.overlay_rx.borrow().clone()
    }

    /// Pin smoothed progress to a value regardless of scroll, or release
    /// the pin with `None`.
    pub fn force_progress(&self, value: Option<f64>) {
        self.override_tx.send_replace(value);
    }

    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.load_rx.clone()
    }

    pub fn raw(&self) -> watch::Receiver<f64> {
        self.raw_rx.clone()
    }

    pub fn smoothed(&self) -> watch::Receiver<f64> {
        self.smoothed_rx.clone()
    }

    pub fn painted(&self) -> watch::Receiver<Option<FramePainted>> {
        self.painted_rx.clone()
    }

    pub fn overlays(&self) -> watch::Receiver<OverlayFrame> {
        self.overlay_rx.clone()
    }

    /// Wait until the frame table is published. Returns `false` if the
    /// loader went away first.
    pub async fn wait_loaded(&self) -> bool {
        let mut rx = self.load_rx.clone();
        rx.wait_for(|state| !state.is_loading()).await.is_ok()
    }

    /// Cancel every task, wait for them, and hand the surface back.
    pub async fn unmount(self) -> Result<S> {
        let MountedPlayer {
            cancel,
            mut tasks,
            render,
            ..
        } = self;
        cancel.cancel();
        while let Some(joined) = tasks.join_next().await {
            joined.context("player task panicked")??;
        }
        let surface = render
            .await
            .map_err(|err| anyhow!("render task panicked: {err}"))??;
        debug!("sequence player unmounted");
        Ok(surface)
    }
}

pub struct CtaPanel;

impl CtaPanel {
    /// Track `container` with enter offsets and react to `OpenCta` on `bus`.
    pub fn mount(
        cfg: &CtaConfig,
        observer: &ScrollObserver,
        container: Option<Container>,
        bus: &CommandBus,
        parent: &CancellationToken,
    ) -> MountedCta {
        let cancel = parent.child_token();
        let source = ProgressSource::new(container, ScrollOffsets::Enter);
        let initial = source.raw_progress(&observer.current());
        let (raw_tx, raw_rx) = watch::channel(initial);
        let (snapshot_tx, snapshot_rx) = watch::channel(CtaSnapshot::default());

        let mut tasks = JoinSet::new();
        tasks.spawn({
            let viewport_rx = observer.subscribe();
            let cancel = cancel.clone();
            async move {
                scroll::run(source, viewport_rx, raw_tx, cancel)
                    .await
                    .context("cta scroll task failed")
            }
        });
        tasks.spawn({
            let machine = ForcedOpen::from_config(cfg);
            let commands = bus.subscribe();
            let raw_rx = raw_rx.clone();
            let cancel = cancel.clone();
            async move {
                cta::run(machine, commands, raw_rx, snapshot_tx, cancel)
                    .await
                    .context("cta task failed")
            }
        });

        MountedCta {
            cancel,
            tasks,
            raw_rx,
            snapshot_rx,
        }
    }
}

pub struct MountedCta {
    cancel: CancellationToken,
    tasks: JoinSet<Result<()>>,
    raw_rx: watch::Receiver<f64>,
    snapshot_rx: watch::Receiver<CtaSnapshot>,
}

impl MountedCta {
    pub fn raw_progress(&self) -> f64 {
        *self.raw_rx.borrow()
    }

    pub fn snapshot(&self) -> CtaSnapshot {
        *self.snapshot_rx.borrow()
    }

    pub fn snapshots(&self) -> watch::Receiver<CtaSnapshot> {
        self.snapshot_rx.clone()
    }

    pub async fn unmount(mut self) -> Result<()> {
        self.cancel.cancel();
        while let Some(joined) = self.tasks.join_next().await {
            joined.context("cta task panicked")??;
        }
        Ok(())
    }
}
