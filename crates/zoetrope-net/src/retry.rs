use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::sleep;
use tracing::debug;
#[cfg(test)]
use unimock::unimock;
use url::Url;

use crate::{
    error::NetError,
    traits::Net,
    types::{Headers, RangeSpec, RetryPolicy},
};

/// Decides whether an error class is worth retrying at all.
#[cfg_attr(test, unimock(api = RetryClassifierMock))]
pub trait RetryClassifier {
    fn should_retry(&self, error: &NetError) -> bool;
}

#[derive(Default)]
pub struct DefaultRetryClassifier;

impl DefaultRetryClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl RetryClassifier for DefaultRetryClassifier {
    fn should_retry(&self, error: &NetError) -> bool {
        error.is_retryable()
    }
}

/// Budgeted retry decisions: classifier plus attempt accounting.
pub trait RetryPolicyTrait: Send + Sync {
    fn should_retry(&self, error: &NetError, attempt: u32) -> bool;
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
    fn max_attempts(&self) -> u32;
}

pub struct DefaultRetryPolicy {
    classifier: DefaultRetryClassifier,
    policy: RetryPolicy,
}

impl DefaultRetryPolicy {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            classifier: DefaultRetryClassifier,
            policy,
        }
    }
}

impl RetryPolicyTrait for DefaultRetryPolicy {
    fn should_retry(&self, error: &NetError, attempt: u32) -> bool {
        if attempt >= self.policy.max_retries {
            return false;
        }
        self.classifier.should_retry(error)
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.policy.delay_for_attempt(attempt)
    }

    fn max_attempts(&self) -> u32 {
        self.policy.max_retries
    }
}

/// Retry decorator for [`Net`] implementations.
///
/// Non-retryable errors propagate unchanged on the first failure; a
/// retryable error that survives the whole budget comes back wrapped in
/// [`NetError::RetryExhausted`].
pub struct RetryNet<N, P> {
    inner: N,
    retry_policy: P,
}

impl<N: Net, P: RetryPolicyTrait> RetryNet<N, P> {
    pub fn new(inner: N, retry_policy: P) -> Self {
        Self {
            inner,
            retry_policy,
        }
    }

    fn classify(&self, error: NetError, attempt: u32) -> Result<u32, NetError> {
        if self.retry_policy.should_retry(&error, attempt) {
            debug!(attempt, error = %error, "retrying request");
            return Ok(attempt + 1);
        }
        if attempt > 0 && error.is_retryable() {
            // Budget exhausted on an otherwise-retryable error.
            return Err(NetError::RetryExhausted {
                max_retries: self.retry_policy.max_attempts(),
                source: Box::new(error),
            });
        }
        Err(error)
    }
}

#[async_trait]
impl<N: Net, P: RetryPolicyTrait> Net for RetryNet<N, P> {
    async fn get_range(
        &self,
        url: Url,
        range: RangeSpec,
        headers: Option<Headers>,
    ) -> Result<Bytes, NetError> {
        let mut attempt = 0;
        loop {
            match self
                .inner
                .get_range(url.clone(), range.clone(), headers.clone())
                .await
            {
                Ok(bytes) => return Ok(bytes),
                Err(error) => {
                    attempt = self.classify(error, attempt)?;
                    sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
            }
        }
    }

    async fn head(&self, url: Url, headers: Option<Headers>) -> Result<Headers, NetError> {
        let mut attempt = 0;
        loop {
            match self.inner.head(url.clone(), headers.clone()).await {
                Ok(out) => return Ok(out),
                Err(error) => {
                    attempt = self.classify(error, attempt)?;
                    sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
            }
        }
    }
}
