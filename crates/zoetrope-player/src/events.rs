//! Player events, published on a `tokio::sync::broadcast` channel.
//!
//! Publishing never blocks; lagging subscribers lose events rather than
//! stalling the fetch loop. Playback correctness must not depend on event
//! delivery.

/// Progress and failure notifications from the streaming session.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum PlayerEvent {
    /// A segment was fetched and handed to the buffering channel.
    SegmentAppended { index: u64, len: usize },
    /// The resource is exhausted and the buffering channel was closed.
    EndOfStream { total_bytes: u64 },
    /// A ranged fetch failed after the retry budget; the session stopped.
    DownloadFailed { index: u64, reason: String },
    /// The buffering channel rejected data or reported an error.
    SinkError { message: String },
}
