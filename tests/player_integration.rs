mod common;

use std::time::Duration;

use scroll_sequence::events::Viewport;
use scroll_sequence::player::SequencePlayer;
use scroll_sequence::progress::{Container, ScrollObserver, ScrollOffsets};
use scroll_sequence::surface::{Canvas, DrawSurface};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(10);

fn viewport() -> ScrollObserver {
    ScrollObserver::new(Viewport::new(1280.0, 800.0))
}

fn container() -> Option<Container> {
    Some(Container {
        top: 0.0,
        height: 4000.0,
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scrolling_through_the_container_plays_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    common::write_frame(dir.path(), 1, 16, 9);
    for n in 2..=4 {
        common::write_frame(dir.path(), n, 32, 18);
    }
    let cfg = common::config_in(dir.path(), 4);
    let observer = viewport();
    let cancel = CancellationToken::new();
    let canvas = Canvas::new(cfg.render.fallback_width, cfg.render.fallback_height);

    let player = SequencePlayer::mount(&cfg, &observer, container(), canvas, &cancel);
    assert!(timeout(WAIT, player.wait_loaded()).await.unwrap());
    assert!(!player.is_loading());

    let mut painted = player.painted();
    timeout(WAIT, painted.wait_for(|p| p.is_some_and(|p| p.index == 0)))
        .await
        .unwrap()
        .unwrap();

    observer.scroll_to(3200.0);
    let mut smoothed = player.smoothed();
    timeout(WAIT, smoothed.wait_for(|s| *s == 1.0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(player.raw_progress(), 1.0);
    timeout(WAIT, painted.wait_for(|p| p.is_some_and(|p| p.index == 3)))
        .await
        .unwrap()
        .unwrap();
    let mut overlays = player.overlays();
    timeout(WAIT, overlays.wait_for(|o| o.progress == 1.0))
        .await
        .unwrap()
        .unwrap();
    let last = player.overlay();
    assert!(last.scroll_indicator < f64::EPSILON);

    player.force_progress(Some(0.0));
    timeout(WAIT, painted.wait_for(|p| p.is_some_and(|p| p.index == 0)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(player.smoothed_progress(), 0.0);

    let canvas = player.unmount().await.unwrap();
    assert_eq!(canvas.dimensions(), (16, 9));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_container_holds_progress_at_zero() {
    let dir = tempfile::tempdir().unwrap();
    for n in 1..=3 {
        common::write_frame(dir.path(), n, 8, 6);
    }
    let cfg = common::config_in(dir.path(), 3);
    let observer = viewport();
    let cancel = CancellationToken::new();
    let canvas = Canvas::new(cfg.render.fallback_width, cfg.render.fallback_height);

    let player = SequencePlayer::mount(&cfg, &observer, None, canvas, &cancel);
    assert!(timeout(WAIT, player.wait_loaded()).await.unwrap());
    observer.scroll_to(2400.0);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(player.raw_progress(), 0.0);
    assert_eq!(player.smoothed_progress(), 0.0);
    let mut painted = player.painted();
    timeout(WAIT, painted.wait_for(Option::is_some)).await.unwrap().unwrap();
    assert_eq!(player.last_painted().unwrap().index, 0);
    player.unmount().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_decodable_frames_never_paints() {
    let dir = tempfile::tempdir().unwrap();
    common::write_corrupt_frame(dir.path(), 1);
    let cfg = common::config_in(dir.path(), 3);
    let observer = viewport();
    let cancel = CancellationToken::new();
    let canvas = Canvas::new(cfg.render.fallback_width, cfg.render.fallback_height);

    let player = SequencePlayer::mount(&cfg, &observer, container(), canvas, &cancel);
    assert!(timeout(WAIT, player.wait_loaded()).await.unwrap());
    observer.scroll_to(1600.0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(player.last_painted().is_none());

    let canvas = player.unmount().await.unwrap();
    assert_eq!(canvas.dimensions(), (64, 48));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parent_cancellation_stops_the_player() {
    let dir = tempfile::tempdir().unwrap();
    common::write_frame(dir.path(), 1, 8, 6);
    let cfg = common::config_in(dir.path(), 1);
    let observer = viewport();
    let cancel = CancellationToken::new();
    let canvas = Canvas::new(cfg.render.fallback_width, cfg.render.fallback_height);

    let player = SequencePlayer::mount(&cfg, &observer, container(), canvas, &cancel);
    cancel.cancel();
    let canvas = timeout(WAIT, player.unmount()).await.unwrap().unwrap();
    assert!(canvas.dimensions() == (64, 48) || canvas.dimensions() == (8, 6));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn poster_is_the_first_frame_while_loading() {
    let dir = tempfile::tempdir().unwrap();
    common::write_frame(dir.path(), 1, 8, 6);
    let cfg = common::config_in(dir.path(), 3);
    let observer = viewport();
    // A cancelled parent stops the loader before it can publish.
    let cancel = CancellationToken::new();
    cancel.cancel();
    let canvas = Canvas::new(cfg.render.fallback_width, cfg.render.fallback_height);

    let player = SequencePlayer::mount(&cfg, &observer, container(), canvas, &cancel);
    assert!(player.is_loading());
    let expected = dir.path().join("frame-001.jpg");
    assert_eq!(player.poster(), Some(expected.as_path()));

    player.unmount().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn viewport_resize_recomputes_raw_progress() {
    let dir = tempfile::tempdir().unwrap();
    common::write_frame(dir.path(), 1, 8, 6);
    let cfg = common::config_in(dir.path(), 1);
    let observer = viewport();
    let cancel = CancellationToken::new();
    let canvas = Canvas::new(cfg.render.fallback_width, cfg.render.fallback_height);

    let player = SequencePlayer::mount(&cfg, &observer, container(), canvas, &cancel);
    let mut raw = player.raw();

    observer.scroll_to(1600.0);
    timeout(WAIT, raw.wait_for(|p| (*p - 0.5).abs() < 1e-12))
        .await
        .unwrap()
        .unwrap();

    // Taller viewport: the pinned range shrinks to 4000 - 2400.
    observer.resize(1280.0, 2400.0);
    timeout(WAIT, raw.wait_for(|p| *p == 1.0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(player.raw_progress(), 1.0);

    player.unmount().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn enter_offsets_are_configurable() {
    let dir = tempfile::tempdir().unwrap();
    common::write_frame(dir.path(), 1, 8, 6);
    let mut cfg = common::config_in(dir.path(), 1);
    cfg.sequence.offsets = ScrollOffsets::Enter;
    let observer = viewport();
    let cancel = CancellationToken::new();
    let canvas = Canvas::new(cfg.render.fallback_width, cfg.render.fallback_height);

    let player = SequencePlayer::mount(&cfg, &observer, container(), canvas, &cancel);
    // The container top already sits at the viewport top: 800 of 4800 travelled.
    assert!((player.raw_progress() - 800.0 / 4800.0).abs() < 1e-12);

    let mut raw = player.raw();
    observer.scroll_to(4000.0);
    timeout(WAIT, raw.wait_for(|p| *p == 1.0))
        .await
        .unwrap()
        .unwrap();

    player.unmount().await.unwrap();
}
