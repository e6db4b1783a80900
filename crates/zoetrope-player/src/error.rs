use thiserror::Error;

use crate::config::MediaFormat;
use crate::surface::SurfaceError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported media format: {0}")]
    UnsupportedFormat(MediaFormat),

    #[error("playback surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("surface signal channel closed before the buffering channel opened")]
    SurfaceClosed,
}
