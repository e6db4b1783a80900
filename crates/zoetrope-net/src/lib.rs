#![forbid(unsafe_code)]

mod client;
mod error;
mod retry;
mod timeout;
mod traits;
mod types;

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    retry::{DefaultRetryClassifier, DefaultRetryPolicy, RetryClassifier, RetryNet},
    timeout::TimeoutNet,
    traits::{Net, NetExt},
    types::{Headers, NetOptions, RangeSpec, RetryPolicy},
};

#[cfg(test)]
pub use crate::traits::NetMock;
