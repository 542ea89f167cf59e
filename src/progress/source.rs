use serde::Deserialize;
use tokio::sync::watch;

use crate::events::Viewport;

/// A scroll container in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Container {
    pub top: f64,
    pub height: f64,
}

/// Which edges bound the tracked range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollOffsets {
    /// From the container's top meeting the viewport bottom to its bottom
    /// meeting the viewport top.
    #[default]
    Enter,
    /// From the container's top meeting the viewport top to its bottom
    /// meeting the viewport bottom. Used by sticky, pinned sections.
    Pinned,
}

/// Turns viewport state into raw progress through one container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSource {
    container: Option<Container>,
    offsets: ScrollOffsets,
}

impl ProgressSource {
    pub fn new(container: Option<Container>, offsets: ScrollOffsets) -> Self {
        Self { container, offsets }
    }

    pub fn container(&self) -> Option<Container> {
        self.container
    }

    /// Raw progress in `[0, 1]`. Without a container this is always 0.
    pub fn raw_progress(&self, viewport: &Viewport) -> f64 {
        let Some(c) = self.container else {
            return 0.0;
        };
        let vh = viewport.height;
        let (start, range) = match self.offsets {
            ScrollOffsets::Enter => (c.top - vh, c.height + vh),
            ScrollOffsets::Pinned => (c.top, c.height - vh),
        };
        let travelled = viewport.scroll_y - start;
        if !travelled.is_finite() || !range.is_finite() {
            return 0.0;
        }
        if range <= 0.0 {
            return if travelled > 0.0 { 1.0 } else { 0.0 };
        }
        (travelled / range).clamp(0.0, 1.0)
    }
}

/// Publishes viewport changes to any number of subscribers. Dropping a
/// receiver unsubscribes it.
#[derive(Debug)]
pub struct ScrollObserver {
    tx: watch::Sender<Viewport>,
}

impl ScrollObserver {
    pub fn new(initial: Viewport) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Viewport> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Viewport {
        *self.tx.borrow()
    }

    pub fn scroll_to(&self, scroll_y: f64) {
        self.tx.send_if_modified(|vp| {
            if vp.scroll_y == scroll_y {
                return false;
            }
            vp.scroll_y = scroll_y;
            true
        });
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.tx.send_if_modified(|vp| {
            if vp.width == width && vp.height == height {
                return false;
            }
            vp.width = width;
            vp.height = height;
            true
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
