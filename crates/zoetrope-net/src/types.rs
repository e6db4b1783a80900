use std::{cmp::min, collections::HashMap, time::Duration};

/// Response/request header map.
///
/// Keys are case-sensitive; `reqwest` hands back lowercased names, so
/// lookups against response headers should use lowercase keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Parsed `content-length`, if present and numeric.
    ///
    /// The length probe the player issues before a fixed-length session is
    /// a HEAD request; this is the only header it cares about.
    pub fn content_length(&self) -> Option<u64> {
        self.get("content-length").and_then(|v| v.trim().parse().ok())
    }
}

impl From<HashMap<String, String>> for Headers {
    fn from(map: HashMap<String, String>) -> Self {
        Self { inner: map }
    }
}

/// A byte range of a remote resource, in HTTP `Range` header terms.
///
/// `end` is inclusive; `None` means open-ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: Option<u64>,
}

impl RangeSpec {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    pub fn from_start(start: u64) -> Self {
        Self { start, end: None }
    }

    pub fn to_header_value(&self) -> String {
        if let Some(end) = self.end {
            format!("bytes={}-{}", self.start, end)
        } else {
            format!("bytes={}-", self.start)
        }
    }
}

/// Bounded exponential backoff for retryable request failures.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay before the given attempt: zero for the first try, then
    /// doubling from `base_delay`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponential = self.base_delay * 2_u32.saturating_pow(attempt.saturating_sub(1));
        min(exponential, self.max_delay)
    }
}

#[derive(Clone, Debug)]
pub struct NetOptions {
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    /// Max idle connections per host. 0 disables pooling.
    pub pool_max_idle_per_host: usize,
}

impl Default for NetOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
            pool_max_idle_per_host: 0,
        }
    }
}
