//! Scroll position to playback progress: measurement, smoothing and mapping.

pub mod mapper;
pub mod smoother;
pub mod source;

pub use mapper::{frame_index, interpolate};
pub use smoother::Smoother;
pub use source::{Container, ProgressSource, ScrollObserver, ScrollOffsets};
