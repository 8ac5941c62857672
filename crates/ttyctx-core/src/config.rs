//! Query configuration.
//!
//! A terminal either answers a query promptly or not at all, so the default
//! wait is short. Both knobs can be overridden from the environment:
//!
//! | Variable | Field | Unit |
//! |---|---|---|
//! | `TTYCTX_QUERY_TIMEOUT_MS` | [`QueryConfig::timeout`] | milliseconds |
//! | `TTYCTX_CHUNK_SIZE` | [`QueryConfig::chunk_size`] | bytes |

use std::env;
use std::time::Duration;

/// Default wait for a query reply.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(50);

/// Maximum bytes taken from the terminal by a single query read.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Environment variable overriding [`QueryConfig::timeout`].
pub const ENV_QUERY_TIMEOUT_MS: &str = "TTYCTX_QUERY_TIMEOUT_MS";

/// Environment variable overriding [`QueryConfig::chunk_size`].
pub const ENV_CHUNK_SIZE: &str = "TTYCTX_CHUNK_SIZE";

/// Configuration for terminal queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long a query waits for the terminal to become readable.
    pub timeout: Duration,
    /// Upper bound on the bytes read back for one query.
    pub chunk_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl QueryConfig {
    /// Defaults with environment overrides applied.
    ///
    /// Unset, unparsable, or zero values leave the default in place.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(ms) = lookup(ENV_QUERY_TIMEOUT_MS).and_then(|v| parse_positive(&v)) {
            config.timeout = Duration::from_millis(ms as u64);
        }
        if let Some(size) = lookup(ENV_CHUNK_SIZE).and_then(|v| parse_positive(&v)) {
            config.chunk_size = size;
        }
        config
    }

    /// Replace the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the read chunk size. Zero is ignored.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        if chunk_size > 0 {
            self.chunk_size = chunk_size;
        }
        self
    }
}

fn parse_positive(value: &str) -> Option<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(value, "ignoring query config override");
            None
        }
        Ok(n) => Some(n),
    }
}
