use std::time::Duration;

use scroll_sequence::config::CtaConfig;
use scroll_sequence::cta::{CtaVisuals, RevealState};
use scroll_sequence::events::{CommandBus, UiCommand, Viewport};
use scroll_sequence::player::{CtaPanel, MountedCta};
use scroll_sequence::progress::{Container, ScrollObserver};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const TOP: f64 = 4000.0;
const HEIGHT: f64 = 2500.0;
const VH: f64 = 800.0;

/// Scroll offset at which the panel's enter progress equals `raw`.
fn scroll_for(raw: f64) -> f64 {
    (TOP - VH) + raw * (HEIGHT + VH)
}

fn mount(observer: &ScrollObserver, bus: &CommandBus, cancel: &CancellationToken) -> MountedCta {
    let container = Container {
        top: TOP,
        height: HEIGHT,
    };
    CtaPanel::mount(&CtaConfig::default(), observer, Some(container), bus, cancel)
}

async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn forced_open_survives_the_cooldown_then_reverts_near_the_top() {
    let observer = ScrollObserver::new(Viewport::new(1280.0, VH));
    let bus = CommandBus::default();
    let cancel = CancellationToken::new();
    let panel = mount(&observer, &bus, &cancel);
    settle().await;
    assert_eq!(panel.snapshot().state, RevealState::Natural);
    assert_eq!(panel.snapshot().visuals, CtaVisuals::at(0.0));

    assert_eq!(bus.send(UiCommand::OpenCta), 1);
    let mut snapshots = panel.snapshots();
    snapshots
        .wait_for(|s| s.state == RevealState::Forced)
        .await
        .unwrap();
    assert_eq!(panel.snapshot().visuals, CtaVisuals::terminal());

    // Inside the cooldown a low scroll position does not close the panel.
    observer.scroll_to(scroll_for(0.05));
    settle().await;
    assert!((panel.raw_progress() - 0.05).abs() < 1e-9);
    assert_eq!(panel.snapshot().state, RevealState::Forced);
    assert_eq!(panel.snapshot().visuals, CtaVisuals::terminal());

    // Expiry alone is not a transition; it needs a progress update.
    sleep(Duration::from_secs(2)).await;
    assert_eq!(panel.snapshot().state, RevealState::Forced);

    observer.scroll_to(scroll_for(0.02));
    settle().await;
    let snapshot = panel.snapshot();
    assert_eq!(snapshot.state, RevealState::Natural);
    assert_eq!(snapshot.visuals, CtaVisuals::at(panel.raw_progress()));

    panel.unmount().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn progress_above_threshold_keeps_panel_forced() {
    let observer = ScrollObserver::new(Viewport::new(1280.0, VH));
    let bus = CommandBus::default();
    let cancel = CancellationToken::new();
    let panel = mount(&observer, &bus, &cancel);
    settle().await;

    bus.send(UiCommand::OpenCta);
    settle().await;
    sleep(Duration::from_secs(3)).await;

    observer.scroll_to(scroll_for(0.5));
    settle().await;
    assert_eq!(panel.snapshot().state, RevealState::Forced);

    // A second open re-arms the cooldown.
    bus.send(UiCommand::OpenCta);
    settle().await;
    observer.scroll_to(scroll_for(0.01));
    settle().await;
    assert_eq!(panel.snapshot().state, RevealState::Forced);

    sleep(Duration::from_secs(2)).await;
    observer.scroll_to(scroll_for(0.0));
    settle().await;
    assert_eq!(panel.snapshot().state, RevealState::Natural);

    panel.unmount().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn natural_visuals_track_scroll() {
    let observer = ScrollObserver::new(Viewport::new(1280.0, VH));
    let bus = CommandBus::default();
    let cancel = CancellationToken::new();
    let panel = mount(&observer, &bus, &cancel);

    observer.scroll_to(scroll_for(0.4));
    settle().await;
    let snapshot = panel.snapshot();
    assert_eq!(snapshot.state, RevealState::Natural);
    assert_eq!(snapshot.visuals, CtaVisuals::at(panel.raw_progress()));
    assert!(!snapshot.visuals.is_fully_open());

    observer.scroll_to(scroll_for(1.0));
    settle().await;
    assert!(panel.snapshot().visuals.is_fully_open());

    cancel.cancel();
    panel.unmount().await.unwrap();
}
