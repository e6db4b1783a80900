//! Stateful test doubles for the host surface, the buffering channel, and
//! the network.
//!
//! These are ordinary structs rather than macro-generated mocks: the tests
//! care about recorded interaction order (ranges requested, chunks
//! appended, close count), which is easiest to assert against plain state.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use portable_atomic::AtomicF64;
use tokio::sync::broadcast;
use url::Url;
use zoetrope_net::{Headers, Net, NetError, RangeSpec};

use crate::config::MediaFormat;
use crate::surface::{BufferSink, MediaSurface, SinkError, SurfaceError, SurfaceSignal};

// -- Buffering channel ------------------------------------------------------------

/// Shared state behind a [`RecordingSink`].
#[derive(Default)]
pub struct SinkState {
    chunks: Mutex<Vec<Bytes>>,
    closes: AtomicUsize,
    reject_appends: AtomicBool,
}

impl SinkState {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A [`BufferSink`] handle writing into this state.
    pub fn sink(state: &Arc<Self>) -> Box<dyn BufferSink> {
        Box::new(RecordingSink {
            state: Arc::clone(state),
        })
    }

    pub fn appended(&self) -> Vec<Bytes> {
        self.chunks.lock().clone()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.chunks.lock().iter().map(|c| c.len() as u64).sum()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Make every subsequent append fail.
    pub fn fail_appends(&self, fail: bool) {
        self.reject_appends.store(fail, Ordering::SeqCst);
    }
}

/// Records appended chunks and close calls.
pub struct RecordingSink {
    state: Arc<SinkState>,
}

impl BufferSink for RecordingSink {
    fn append(&mut self, chunk: Bytes) -> Result<(), SinkError> {
        if self.state.closes.load(Ordering::SeqCst) > 0 {
            return Err(SinkError::Closed);
        }
        if self.state.reject_appends.load(Ordering::SeqCst) {
            return Err(SinkError::Append("append rejected by test sink".into()));
        }
        self.state.chunks.lock().push(chunk);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.state.closes.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(SinkError::Closed);
        }
        Ok(())
    }
}

// -- Network ----------------------------------------------------------------------

/// In-memory [`Net`] serving slices of a fixed body, recording every
/// request it sees.
pub struct StaticNet {
    body: Bytes,
    advertise_length: bool,
    range_not_satisfiable: bool,
    failure: Option<NetError>,
    ranges: Mutex<Vec<RangeSpec>>,
    head_calls: AtomicUsize,
}

impl StaticNet {
    pub fn new(body: Bytes) -> Self {
        Self {
            body,
            advertise_length: true,
            range_not_satisfiable: false,
            failure: None,
            ranges: Mutex::new(Vec::new()),
            head_calls: AtomicUsize::new(0),
        }
    }

    /// HEAD responses omit `content-length`.
    pub fn without_advertised_length(mut self) -> Self {
        self.advertise_length = false;
        self
    }

    /// Answer past-the-end ranges with `416` instead of an empty body.
    pub fn with_range_not_satisfiable(mut self) -> Self {
        self.range_not_satisfiable = true;
        self
    }

    /// Fail every ranged fetch with the given error.
    pub fn with_failure(mut self, error: NetError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn range_requests(&self) -> Vec<RangeSpec> {
        self.ranges.lock().clone()
    }

    pub fn head_requests(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Net for StaticNet {
    async fn get_range(
        &self,
        url: Url,
        range: RangeSpec,
        _headers: Option<Headers>,
    ) -> Result<Bytes, NetError> {
        self.ranges.lock().push(range.clone());

        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let len = self.body.len() as u64;
        if range.start >= len {
            if self.range_not_satisfiable {
                return Err(NetError::http_status(416, url.to_string()));
            }
            return Ok(Bytes::new());
        }

        let end = range.end.unwrap_or(len - 1).min(len - 1);
        Ok(self.body.slice(range.start as usize..=end as usize))
    }

    async fn head(&self, _url: Url, _headers: Option<Headers>) -> Result<Headers, NetError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let mut headers = Headers::new();
        if self.advertise_length {
            headers.insert("content-length", self.body.len().to_string());
        }
        Ok(headers)
    }
}

// -- Playback surface -------------------------------------------------------------

/// A stateful [`MediaSurface`] whose host signals are fired by the test.
///
/// `attach_source` emits `SourceOpen` immediately (the common host
/// behavior); position, duration, readiness, and the remaining signals are
/// driven through the helper methods.
pub struct TestSurface {
    supported: AtomicBool,
    attach_calls: AtomicUsize,
    paused: AtomicBool,
    ended: AtomicBool,
    ready: AtomicBool,
    position: AtomicF64,
    duration: AtomicF64,
    duration_known: AtomicBool,
    signals_tx: broadcast::Sender<SurfaceSignal>,
    sink: Arc<SinkState>,
}

impl Default for TestSurface {
    fn default() -> Self {
        let (signals_tx, _) = broadcast::channel(32);
        Self {
            supported: AtomicBool::new(true),
            attach_calls: AtomicUsize::new(0),
            paused: AtomicBool::new(true),
            ended: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            position: AtomicF64::new(0.0),
            duration: AtomicF64::new(0.0),
            duration_known: AtomicBool::new(false),
            signals_tx,
            sink: SinkState::shared(),
        }
    }
}

impl TestSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_duration(&self, seconds: f64) {
        self.duration.store(seconds, Ordering::SeqCst);
        self.duration_known.store(true, Ordering::SeqCst);
    }

    pub fn set_ended(&self, ended: bool) {
        self.ended.store(ended, Ordering::SeqCst);
    }

    pub fn fire_can_play(&self) {
        let _ = self.signals_tx.send(SurfaceSignal::CanPlay);
    }

    pub fn fire_position_changed(&self, position: f64) {
        self.position.store(position, Ordering::SeqCst);
        let _ = self.signals_tx.send(SurfaceSignal::PositionChanged);
    }

    pub fn fire_sink_error<S: Into<String>>(&self, message: S) {
        let _ = self.signals_tx.send(SurfaceSignal::SinkError {
            message: message.into(),
        });
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls.load(Ordering::SeqCst)
    }

    /// State of the sink handed out by [`open_sink`](MediaSurface::open_sink).
    pub fn sink_state(&self) -> Arc<SinkState> {
        Arc::clone(&self.sink)
    }
}

impl MediaSurface for TestSurface {
    fn supports_format(&self, _format: &MediaFormat) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn attach_source(&self) -> Result<(), SurfaceError> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.signals_tx.send(SurfaceSignal::SourceOpen);
        Ok(())
    }

    fn open_sink(&self, _format: &MediaFormat) -> Result<Box<dyn BufferSink>, SurfaceError> {
        Ok(SinkState::sink(&self.sink))
    }

    fn position(&self) -> f64 {
        self.position.load(Ordering::SeqCst)
    }

    fn duration(&self) -> Option<f64> {
        if self.duration_known.load(Ordering::SeqCst) {
            Some(self.duration.load(Ordering::SeqCst))
        } else {
            None
        }
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn has_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn ready_to_play(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn start(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn set_position(&self, seconds: f64) {
        self.position.store(seconds, Ordering::SeqCst);
    }

    fn signals(&self) -> broadcast::Receiver<SurfaceSignal> {
        self.signals_tx.subscribe()
    }
}
