use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use tokio::sync::broadcast;

/// Host viewport state: where the document is scrolled to and how large the
/// visible area is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scroll_y: 0.0,
            width,
            height,
        }
    }
}

/// Commands broadcast between page components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// Show the call-to-action panel fully expanded regardless of scroll.
    OpenCta,
}

/// Typed fan-out channel for [`UiCommand`]s. Every subscriber sees every
/// command sent after it subscribed.
#[derive(Debug, Clone)]
pub struct CommandBus {
    tx: broadcast::Sender<UiCommand>,
}

impl CommandBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many subscribers received the command.
    pub fn send(&self, command: UiCommand) -> usize {
        self.tx.send(command).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiCommand> {
        self.tx.subscribe()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new(16)
    }
}

/// One decoded still of the sequence.
#[derive(Debug)]
pub struct DecodedFrame {
    pub path: PathBuf,
    /// Zero-based position in the requested sequence.
    pub sequence_index: usize,
    pub image: RgbaImage,
}

impl DecodedFrame {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Frames ready for playback, published once per mount.
#[derive(Debug, Default)]
pub struct FrameTable {
    frames: Vec<Arc<DecodedFrame>>,
    requested: usize,
    failed: Vec<usize>,
}

impl FrameTable {
    pub fn new(frames: Vec<Arc<DecodedFrame>>, requested: usize, failed: Vec<usize>) -> Self {
        Self {
            frames,
            requested,
            failed,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<DecodedFrame>> {
        self.frames.get(index)
    }

    pub fn first(&self) -> Option<&Arc<DecodedFrame>> {
        self.frames.first()
    }

    pub fn frames(&self) -> &[Arc<DecodedFrame>] {
        &self.frames
    }

    /// Number of frames the loader was asked for.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Sequence indices that failed to decode.
    pub fn failed(&self) -> &[usize] {
        &self.failed
    }
}

#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready(Arc<FrameTable>),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn table(&self) -> Option<&Arc<FrameTable>> {
        match self {
            Self::Loading => None,
            Self::Ready(table) => Some(table),
        }
    }
}

/// Emitted by the render loop after each paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePainted {
    /// Index into the frame table.
    pub index: usize,
    /// Sequence position of the painted frame.
    pub sequence_index: usize,
}
