//! Headless rehearsal of the landing page's scroll-driven hero sequence.
//!
//! Mounts the sequence player and the CTA panel against a simulated
//! viewport, sweeps the scroll offset from the top of the page to the
//! bottom, and logs what a visitor would see along the way.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use scroll_sequence::config::{Configuration, ContainerConfig};
use scroll_sequence::cta::RevealState;
use scroll_sequence::events::{CommandBus, UiCommand, Viewport};
use scroll_sequence::player::{CtaPanel, SequencePlayer};
use scroll_sequence::progress::{Container, ScrollObserver};
use scroll_sequence::surface::{Canvas, DrawSurface};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(
    name = "scroll-sequence",
    version,
    about = "Rehearse the scroll-synchronized frame sequence without a browser"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// How long the scripted scroll from top to bottom takes
    #[arg(long, value_name = "DURATION", default_value = "12s", value_parser = humantime::parse_duration)]
    duration: Duration,
    /// Broadcast an open-CTA command this far into the sweep
    #[arg(long = "open-cta-at", value_name = "DURATION", value_parser = humantime::parse_duration)]
    open_cta_at: Option<Duration>,
    /// Write the last painted surface to this PNG file
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(
            format!("scroll_sequence={level}")
                .parse()
                .context("invalid log directive")?,
        );
    fmt().with_env_filter(filter).with_target(false).compact().init();
    Ok(())
}

fn container(cfg: &ContainerConfig, viewport_height: f64) -> Container {
    Container {
        top: cfg.top.resolve(viewport_height),
        height: cfg.height.resolve(viewport_height),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let cfg = Configuration::from_yaml_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?
        .validated()
        .context("invalid configuration values")?;
    debug!("loaded configuration: {cfg:#?}");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; stopping rehearsal");
            cancel.cancel();
        });
    }

    let canvas = rehearse(&cfg, &args, &cancel).await?;
    if let Some(path) = args.snapshot.as_ref() {
        canvas
            .save_png(path)
            .with_context(|| format!("failed to save snapshot to {}", path.display()))?;
        let (width, height) = canvas.dimensions();
        info!(path = %path.display(), width, height, "snapshot written");
    }
    Ok(())
}

async fn rehearse(cfg: &Configuration, args: &Args, cancel: &CancellationToken) -> Result<Canvas> {
    let layout = &cfg.layout;
    let vh = layout.viewport_height;
    let sequence = container(&layout.sequence, vh);
    let cta = container(&layout.cta, vh);
    let page_bottom = (sequence.top + sequence.height).max(cta.top + cta.height);
    let max_scroll = (page_bottom - vh).max(0.0);

    let observer = ScrollObserver::new(Viewport::new(layout.viewport_width, vh));
    let bus = CommandBus::default();
    let canvas = Canvas::new(cfg.render.fallback_width, cfg.render.fallback_height);

    let player = SequencePlayer::mount(cfg, &observer, Some(sequence), canvas, cancel);
    let panel = CtaPanel::mount(&cfg.cta, &observer, Some(cta), &bus, cancel);

    if player.is_loading() {
        info!(poster = ?player.poster(), "showing poster while frames load");
    }
    tokio::select! {
        _ = cancel.cancelled() => {}
        loaded = player.wait_loaded() => {
            if !loaded {
                warn!("frame loader stopped before publishing");
            }
        }
    }

    if !cancel.is_cancelled() {
        info!(max_scroll, duration = ?args.duration, "starting scroll sweep");
        let started = Instant::now();
        let step = cfg.render.frame_interval;
        let mut cta_sent = false;
        let mut last_beat: Option<String> = None;
        let mut last_state = RevealState::Natural;
        let mut last_frame = None;

        loop {
            let elapsed = started.elapsed();
            let t = (elapsed.as_secs_f64() / args.duration.as_secs_f64().max(f64::EPSILON)).min(1.0);
            observer.scroll_to(t * max_scroll);

            if let Some(at) = args.open_cta_at
                && !cta_sent
                && elapsed >= at
            {
                let receivers = bus.send(UiCommand::OpenCta);
                info!(receivers, "open-cta broadcast");
                cta_sent = true;
            }

            let painted = player.last_painted().map(|p| p.sequence_index);
            if painted != last_frame {
                debug!(frame = ?painted, progress = player.smoothed_progress(), "frame");
                last_frame = painted;
            }
            let overlay = player.overlay();
            let beat = overlay.dominant().map(str::to_string);
            if beat != last_beat {
                info!(beat = ?beat, progress = overlay.progress, "caption");
                last_beat = beat;
            }
            let snapshot = panel.snapshot();
            if snapshot.state != last_state {
                info!(state = ?snapshot.state, raw = panel.raw_progress(), "cta state");
                last_state = snapshot.state;
            }

            if t >= 1.0 {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(step) => {}
            }
        }
        info!(
            frame = ?player.last_painted().map(|p| p.sequence_index),
            cta = ?panel.snapshot().visuals,
            "scroll sweep finished"
        );
    }

    panel.unmount().await.context("cta panel shutdown failed")?;
    player.unmount().await.context("sequence player shutdown failed")
}
