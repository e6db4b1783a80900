//! The public player: initialization protocol plus transport controls.
//!
//! `Player` owns nothing the host provided — the surface and the buffering
//! channel stay host property. It wires them to the network: one spawned
//! [`SegmentSession`] feeding the channel, one spawned signal relay driving
//! the progress callback, and direct pass-throughs for the controls.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use url::Url;
use zoetrope_net::{HttpClient, Net, NetExt};

use crate::config::PlayerConfig;
use crate::error::PlayerError;
use crate::events::PlayerEvent;
use crate::session::SegmentSession;
use crate::surface::{MediaSurface, SurfaceSignal};

type TimeUpdateFn = Box<dyn Fn(f64) + Send + 'static>;

pub struct Player<S: MediaSurface> {
    surface: Arc<S>,
    config: PlayerConfig,
    events_tx: broadcast::Sender<PlayerEvent>,
    on_time_update: Arc<Mutex<TimeUpdateFn>>,
    cancel: CancellationToken,
}

impl<S: MediaSurface> Player<S> {
    /// Open a player against a surface and a resource URL, with the
    /// default layered HTTP stack (per-call timeout, bounded retry).
    ///
    /// Must be called from within a tokio runtime; the fetch loop and the
    /// signal relay are spawned tasks.
    pub async fn open(
        surface: Arc<S>,
        url: &str,
        config: PlayerConfig,
    ) -> Result<Self, PlayerError> {
        let net = HttpClient::new(config.net.clone())
            .with_timeout(config.net.request_timeout)
            .with_retry(config.net.retry_policy.clone());
        Self::open_with_net(surface, url, config, Arc::new(net)).await
    }

    /// Open with an injected [`Net`] implementation.
    pub async fn open_with_net(
        surface: Arc<S>,
        url: &str,
        config: PlayerConfig,
        net: Arc<dyn Net>,
    ) -> Result<Self, PlayerError> {
        if url.trim().is_empty() {
            return Err(PlayerError::InvalidArgument(
                "resource URL must not be empty".into(),
            ));
        }
        let url: Url = url
            .parse()
            .map_err(|e| PlayerError::InvalidArgument(format!("invalid resource URL: {e}")))?;
        if config.segment_len == 0 {
            return Err(PlayerError::InvalidArgument(
                "segment length must be non-zero".into(),
            ));
        }
        if !surface.supports_format(&config.format) {
            return Err(PlayerError::UnsupportedFormat(config.format.clone()));
        }

        // Subscribe before attaching: the host may deliver SourceOpen as
        // soon as the association is made.
        let mut signals = surface.signals();
        surface.attach_source()?;
        debug!(url = %url, "waiting for the host to open the buffering channel");
        loop {
            match signals.recv().await {
                Ok(SurfaceSignal::SourceOpen) => break,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "lagged behind surface signals while waiting for source-open");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(PlayerError::SurfaceClosed)
                }
            }
        }

        let sink = surface.open_sink(&config.format)?;
        let events_tx = config
            .events_tx
            .clone()
            .unwrap_or_else(|| broadcast::channel(config.events_channel_capacity.max(1)).0);
        let cancel = CancellationToken::new();
        let on_time_update: Arc<Mutex<TimeUpdateFn>> = Arc::new(Mutex::new(Box::new(|_| {})));

        let session = SegmentSession::new(
            url.clone(),
            net,
            sink,
            &config,
            events_tx.clone(),
            cancel.clone(),
        );
        tokio::spawn(session.run());

        let relay_signals = surface.signals();
        tokio::spawn(Self::run_signal_relay(
            Arc::clone(&surface),
            relay_signals,
            Arc::clone(&on_time_update),
            cancel.clone(),
        ));

        debug!(url = %url, "player initialized");
        Ok(Self {
            surface,
            config,
            events_tx,
            on_time_update,
            cancel,
        })
    }

    /// Start playback: immediately if the surface already has enough
    /// buffered data, otherwise on the next `CanPlay` signal.
    pub fn play(&self) {
        if self.surface.ready_to_play() {
            debug!("starting playback immediately");
            self.surface.start();
            return;
        }

        debug!("deferring playback until the surface can play");
        let surface = Arc::clone(&self.surface);
        let cancel = self.cancel.clone();
        let mut signals = surface.signals();
        tokio::spawn(async move {
            // The surface may have become ready between the check and the
            // subscription.
            if surface.ready_to_play() {
                surface.start();
                return;
            }
            loop {
                tokio::select! {
                    () = cancel.cancelled() => return,
                    received = signals.recv() => match received {
                        Ok(SurfaceSignal::CanPlay) => {
                            surface.start();
                            return;
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {
                            if surface.ready_to_play() {
                                surface.start();
                                return;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => return,
                    }
                }
            }
        });
    }

    /// Pause playback unconditionally.
    pub fn pause(&self) {
        debug!("pause");
        self.surface.stop();
    }

    /// Move the playhead to `fraction × duration`.
    ///
    /// `fraction` is not validated against `[0, 1]`. Before the duration is
    /// known the call is ignored (the host has nothing to seek within).
    pub fn seek_to(&self, fraction: f64) {
        let Some(duration) = self.surface.duration() else {
            warn!(fraction, "seek ignored, duration not yet known");
            return;
        };
        let target = fraction * duration;
        debug!(fraction, target, "seek");
        self.surface.set_position(target);
    }

    /// `true` iff the surface is neither paused nor ended.
    pub fn is_playing(&self) -> bool {
        !self.surface.is_paused() && !self.surface.has_ended()
    }

    /// Replace the progress callback (default: no-op).
    ///
    /// Invoked with `position / duration` on every position-change signal
    /// once the duration is known.
    pub fn set_on_time_update<F>(&self, callback: F)
    where
        F: Fn(f64) + Send + 'static,
    {
        *self.on_time_update.lock() = Box::new(callback);
    }

    /// Subscribe to streaming-session events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events_tx.subscribe()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Tear down the streaming session: cancels the fetch loop, the signal
    /// relay, and any pending deferred-play waiter. Idempotent; also runs
    /// on drop.
    pub fn close(&self) {
        debug!("closing player");
        self.cancel.cancel();
    }

    async fn run_signal_relay(
        surface: Arc<S>,
        mut signals: broadcast::Receiver<SurfaceSignal>,
        on_time_update: Arc<Mutex<TimeUpdateFn>>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                received = signals.recv() => match received {
                    Ok(SurfaceSignal::PositionChanged) => {
                        // No callback before the duration is known; a zero
                        // duration would otherwise produce a non-finite
                        // fraction.
                        let Some(duration) = surface.duration() else {
                            continue;
                        };
                        if duration <= 0.0 {
                            continue;
                        }
                        let fraction = surface.position() / duration;
                        let callback = on_time_update.lock();
                        (*callback)(fraction);
                    }
                    Ok(SurfaceSignal::SinkError { message }) => {
                        error!(reason = %message, "buffering channel error");
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "lagged behind surface signals");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        }
    }
}

impl<S: MediaSurface> Drop for Player<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
