use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use unimock::unimock;
use url::Url;

use crate::error::NetError;
use crate::retry::{DefaultRetryPolicy, RetryNet};
use crate::timeout::TimeoutNet;
use crate::types::{Headers, RangeSpec, RetryPolicy};

/// Ranged access to a remote resource.
///
/// The player appends each segment to the decoder buffer as one unit, so
/// ranged reads return a fully buffered body rather than a stream.
#[cfg_attr(test, unimock(api = NetMock))]
#[async_trait]
pub trait Net: Send + Sync {
    /// Fetch a byte range of a URL (HTTP GET with a `Range` header).
    async fn get_range(
        &self,
        url: Url,
        range: RangeSpec,
        headers: Option<Headers>,
    ) -> Result<Bytes, NetError>;

    /// Metadata probe (HTTP HEAD); returns the response headers.
    async fn head(&self, url: Url, headers: Option<Headers>) -> Result<Headers, NetError>;
}

pub trait NetExt: Net + Sized {
    /// Add a whole-call timeout layer.
    fn with_timeout(self, timeout: Duration) -> TimeoutNet<Self> {
        TimeoutNet::new(self, timeout)
    }

    /// Add a bounded-backoff retry layer.
    fn with_retry(self, policy: RetryPolicy) -> RetryNet<Self, DefaultRetryPolicy> {
        RetryNet::new(self, DefaultRetryPolicy::new(policy))
    }
}

impl<T: Net> NetExt for T {}
