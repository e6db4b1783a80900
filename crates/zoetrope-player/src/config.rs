#![forbid(unsafe_code)]

use std::fmt;
use std::time::Duration;

use tokio::sync::broadcast;
use zoetrope_net::NetOptions;

use crate::events::PlayerEvent;

/// Default container/codec pair the buffering channel is opened for.
pub const DEFAULT_FORMAT: &str = "video/mp4; codecs=\"avc1.42E01E, mp4a.40.2\"";

/// Default segment size: 1 MiB.
pub const DEFAULT_SEGMENT_LEN: u64 = 1024 * 1024;

/// Default pause between an append and the next fetch.
pub const DEFAULT_APPEND_PAUSE: Duration = Duration::from_millis(500);

/// A MIME-type-with-codecs string identifying what the buffering channel
/// must accept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaFormat(String);

impl MediaFormat {
    pub fn new<S: Into<String>>(format: S) -> Self {
        Self(format.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MediaFormat {
    fn default() -> Self {
        Self(DEFAULT_FORMAT.to_owned())
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the fetch loop decides that the resource is exhausted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Probe the total length up front (HEAD) and stop before the first
    /// out-of-range request. Falls back to [`Implicit`](Self::Implicit)
    /// behavior when the probe yields no usable length.
    #[default]
    Explicit,
    /// No probe; a chunk shorter (or longer) than the segment size marks
    /// the end of the resource.
    Implicit,
}

/// Configuration for a [`Player`](crate::Player).
///
/// Used with `Player::open(surface, url, config)`.
#[derive(Clone)]
pub struct PlayerConfig {
    /// Container/codec format the buffering channel is opened for.
    pub format: MediaFormat,
    /// Byte length of each fetched segment.
    pub segment_len: u64,
    /// Fixed-rate throttle between an append and the next fetch.
    pub append_pause: Duration,
    /// End-of-resource detection policy.
    pub length_policy: LengthPolicy,
    /// Network configuration (timeout, retry, pooling).
    pub net: NetOptions,
    /// Capacity of the events broadcast channel (used when `events_tx` is
    /// not provided).
    pub events_channel_capacity: usize,
    /// Events broadcast sender (optional - if not provided, one is created
    /// internally). Injecting one lets callers subscribe before the first
    /// segment is fetched.
    pub events_tx: Option<broadcast::Sender<PlayerEvent>>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            format: MediaFormat::default(),
            segment_len: DEFAULT_SEGMENT_LEN,
            append_pause: DEFAULT_APPEND_PAUSE,
            length_policy: LengthPolicy::default(),
            net: NetOptions::default(),
            events_channel_capacity: 32,
            events_tx: None,
        }
    }
}

impl PlayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the media format.
    pub fn with_format(mut self, format: MediaFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the segment size in bytes. Must be non-zero.
    pub fn with_segment_len(mut self, segment_len: u64) -> Self {
        self.segment_len = segment_len;
        self
    }

    /// Set the pause between appends.
    pub fn with_append_pause(mut self, append_pause: Duration) -> Self {
        self.append_pause = append_pause;
        self
    }

    /// Set the end-of-resource detection policy.
    pub fn with_length_policy(mut self, length_policy: LengthPolicy) -> Self {
        self.length_policy = length_policy;
        self
    }

    /// Set network options.
    pub fn with_net(mut self, net: NetOptions) -> Self {
        self.net = net;
        self
    }

    /// Set events broadcast channel capacity.
    pub fn with_events_channel_capacity(mut self, capacity: usize) -> Self {
        self.events_channel_capacity = capacity;
        self
    }

    /// Set the events broadcast sender.
    pub fn with_events(mut self, events_tx: broadcast::Sender<PlayerEvent>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }
}
