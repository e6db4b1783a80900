#![forbid(unsafe_code)]

mod config;
mod error;
mod events;
mod player;
mod session;
mod surface;

pub mod mock;

pub use config::{
    LengthPolicy, MediaFormat, PlayerConfig, DEFAULT_APPEND_PAUSE, DEFAULT_FORMAT,
    DEFAULT_SEGMENT_LEN,
};
pub use error::PlayerError;
pub use events::PlayerEvent;
pub use player::Player;
pub use surface::{BufferSink, MediaSurface, SinkError, SurfaceError, SurfaceSignal};
pub use zoetrope_net::{Headers, Net, NetOptions, RetryPolicy};
