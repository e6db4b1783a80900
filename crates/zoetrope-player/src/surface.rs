//! Host abstractions: the playback surface and its buffering channel.
//!
//! A typical host pairs a video output element with a media-buffering API.
//! Neither is owned by this crate; both are modeled as traits so the
//! player can run against any host (or a test double). Host-delivered
//! readiness signals arrive on a broadcast channel; every interested party
//! takes its own receiver via [`MediaSurface::signals`].

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::MediaFormat;

/// Signals the host delivers about the playback surface.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum SurfaceSignal {
    /// The buffering association is wired up; the channel may be opened.
    SourceOpen,
    /// Enough data is buffered to begin playback.
    CanPlay,
    /// Playback position advanced.
    PositionChanged,
    /// Asynchronous buffering-channel failure reported by the host.
    SinkError { message: String },
}

/// The host-provided video output and transport controls.
///
/// Subscribe to [`signals`](MediaSurface::signals) *before* calling
/// [`attach_source`](MediaSurface::attach_source): `SourceOpen` may fire as
/// soon as the association is made, and broadcast receivers only observe
/// signals sent after they were created.
pub trait MediaSurface: Send + Sync + 'static {
    /// Whether the host can decode the given container/codec format.
    fn supports_format(&self, format: &MediaFormat) -> bool;

    /// Bind a buffering association to the surface as its data source.
    fn attach_source(&self) -> Result<(), SurfaceError>;

    /// Open the buffering channel for the given format.
    ///
    /// Valid only after the host has signaled [`SurfaceSignal::SourceOpen`].
    fn open_sink(&self, format: &MediaFormat) -> Result<Box<dyn BufferSink>, SurfaceError>;

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Total duration in seconds, once the host has derived it.
    fn duration(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    fn has_ended(&self) -> bool;

    /// Whether the host reports enough buffered data to play immediately.
    fn ready_to_play(&self) -> bool;

    /// Begin playback.
    fn start(&self);

    /// Pause playback.
    fn stop(&self);

    /// Move the playhead to an absolute position in seconds.
    fn set_position(&self, seconds: f64);

    /// A fresh receiver of host signals.
    fn signals(&self) -> broadcast::Receiver<SurfaceSignal>;
}

/// The host-provided sink that accepts raw media bytes in order.
///
/// Appends must arrive in strictly increasing segment order, and
/// [`close`](BufferSink::close) must be called exactly once, after which no
/// append may follow.
pub trait BufferSink: Send {
    fn append(&mut self, chunk: Bytes) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError>;
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SurfaceError {
    #[error("media source could not be attached: {0}")]
    Attach(String),
    #[error("buffering channel could not be opened: {0}")]
    OpenChannel(String),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("append rejected by the buffering channel: {0}")]
    Append(String),
    #[error("buffering channel already closed")]
    Closed,
}
