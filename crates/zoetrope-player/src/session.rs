#![forbid(unsafe_code)]

//! The serial segment-fetch loop.
//!
//! One session per player. The loop pulls fixed-size byte ranges of the
//! resource in strictly increasing index order, appends each to the
//! buffering channel, pauses for the configured throttle, and repeats
//! until the resource is exhausted. At most one fetch is in flight at any
//! time; the channel is closed exactly once.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};
use url::Url;
use zoetrope_net::{Net, NetError, RangeSpec};

use crate::config::{LengthPolicy, PlayerConfig};
use crate::events::PlayerEvent;
use crate::surface::BufferSink;

pub(crate) struct SegmentSession {
    url: Url,
    net: Arc<dyn Net>,
    sink: Box<dyn BufferSink>,
    segment_len: u64,
    append_pause: std::time::Duration,
    length_policy: LengthPolicy,
    events_tx: broadcast::Sender<PlayerEvent>,
    cancel: CancellationToken,
}

impl SegmentSession {
    pub(crate) fn new(
        url: Url,
        net: Arc<dyn Net>,
        sink: Box<dyn BufferSink>,
        config: &PlayerConfig,
        events_tx: broadcast::Sender<PlayerEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            url,
            net,
            sink,
            segment_len: config.segment_len,
            append_pause: config.append_pause,
            length_policy: config.length_policy,
            events_tx,
            cancel,
        }
    }

    /// Resolve the resource's total byte length, if the policy wants one.
    ///
    /// A failed probe or a response without a usable `content-length`
    /// degrades to short-chunk detection rather than failing the session.
    async fn resolve_total_len(&mut self) -> Option<u64> {
        match self.length_policy {
            LengthPolicy::Implicit => None,
            LengthPolicy::Explicit => match self.net.head(self.url.clone(), None).await {
                Ok(headers) => match headers.content_length() {
                    Some(total) => {
                        debug!(total, "resolved resource length");
                        Some(total)
                    }
                    None => {
                        warn!(url = %self.url, "length probe carried no content-length, falling back to short-chunk detection");
                        None
                    }
                },
                Err(e) => {
                    warn!(url = %self.url, error = %e, "length probe failed, falling back to short-chunk detection");
                    None
                }
            },
        }
    }

    pub(crate) async fn run(mut self) {
        let total_len = self.resolve_total_len().await;
        let mut index: u64 = 0;
        let mut total_bytes: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                debug!(index, "segment session cancelled");
                return;
            }

            let start = index * self.segment_len;
            if let Some(total) = total_len {
                if start >= total {
                    self.finish(total_bytes);
                    return;
                }
            }
            let end = start + self.segment_len - 1;
            let range = RangeSpec::new(start, Some(end));

            let chunk = tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!(index, "segment session cancelled mid-fetch");
                    return;
                }
                fetched = self.net.get_range(self.url.clone(), range, None) => match fetched {
                    Ok(chunk) => chunk,
                    // Past-the-end probe on a server that reports it: the
                    // resource ended exactly on a segment boundary.
                    Err(NetError::HttpStatus { status: 416, .. }) if total_len.is_none() => {
                        debug!(index, "range not satisfiable, treating as end of resource");
                        self.finish(total_bytes);
                        return;
                    }
                    Err(e) => {
                        warn!(index, error = %e, "segment fetch failed, stopping session");
                        let _ = self.events_tx.send(PlayerEvent::DownloadFailed {
                            index,
                            reason: e.to_string(),
                        });
                        return;
                    }
                },
            };

            let chunk_len = chunk.len();
            trace!(index, bytes = chunk_len, "appending segment");
            if let Err(e) = self.sink.append(chunk) {
                error!(index, error = %e, "buffering channel rejected segment");
                let _ = self.events_tx.send(PlayerEvent::SinkError {
                    message: e.to_string(),
                });
                return;
            }
            total_bytes += chunk_len as u64;
            let _ = self.events_tx.send(PlayerEvent::SegmentAppended {
                index,
                len: chunk_len,
            });

            // Without a known total length, anything other than a full
            // segment (short, empty, or a server that ignored the Range
            // header) marks the end of the resource.
            if total_len.is_none() && chunk_len as u64 != self.segment_len {
                self.finish(total_bytes);
                return;
            }

            tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!(index, "segment session cancelled during pause");
                    return;
                }
                () = sleep(self.append_pause) => {}
            }
            index += 1;
        }
    }

    fn finish(&mut self, total_bytes: u64) {
        if let Err(e) = self.sink.close() {
            error!(error = %e, "failed to close buffering channel");
            let _ = self.events_tx.send(PlayerEvent::SinkError {
                message: e.to_string(),
            });
            return;
        }
        debug!(total_bytes, "end of stream");
        let _ = self
            .events_tx
            .send(PlayerEvent::EndOfStream { total_bytes });
    }
}
