use std::path::PathBuf;

use thiserror::Error;

/// Library error type for sequence player operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A frame could not be read or decoded.
    #[error("failed to decode frame {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A surface snapshot could not be written.
    #[error("failed to write snapshot {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Painting onto a draw surface failed.
    #[error("render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
