//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.
//! Each component reads its own sub-config; `Config` groups them for the server.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

// == Cache Config ==
/// Parameters of the in-process bounded expiring cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of sessions held at once
    pub capacity: usize,
    /// Idle time after which an entry is swept by the janitor
    pub expiry_time: Duration,
    /// Interval between janitor sweeps
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            expiry_time: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

// == Packer Config ==
/// Token budgets for the context packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackerConfig {
    pub max_context_tokens: usize,
    pub max_history_tokens: usize,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 2048,
            max_history_tokens: 1024,
        }
    }
}

// == Ranker Config ==
/// Cutoff policy for the retrieval ranker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerConfig {
    /// Cumulative normalized-score threshold, in (0, 1]
    pub cutoff_distance: f64,
    /// Absolute floor on raw scores
    pub min_score_distance: f64,
    /// Number of index results considered per query
    pub max_documents_to_retrieve: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            cutoff_distance: 0.8,
            min_score_distance: 0.0,
            max_documents_to_retrieve: 4,
        }
    }
}

// == Session Config ==
/// Deadlines and TTL used by the session cache coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub store_timeout: Duration,
    pub cache_timeout: Duration,
    /// TTL passed to the fast cache on repopulation
    pub cache_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(2000),
            cache_timeout: Duration::from_millis(200),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache: CacheConfig,
    pub packer: PackerConfig,
    pub ranker: RankerConfig,
    pub session: SessionConfig,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cached sessions (default: 1000)
    /// - `CACHE_EXPIRY_TIME` - Idle expiry in seconds (default: 3600)
    /// - `CACHE_CLEANUP_INTERVAL` - Janitor interval in seconds (default: 60)
    /// - `MAX_CONTEXT_TOKENS` - Document context budget (default: 2048)
    /// - `MAX_HISTORY_TOKENS` - Chat history budget (default: 1024)
    /// - `CUTOFF_DISTANCE` - Cumulative score cutoff (default: 0.8)
    /// - `MIN_SCORE_DISTANCE` - Raw score floor (default: 0.0)
    /// - `MAX_DOCUMENTS_TO_RETRIEVE` - Results per query (default: 4)
    /// - `STORE_TIMEOUT_MS` - Durable store deadline (default: 2000)
    /// - `CACHE_TIMEOUT_MS` - Fast cache deadline (default: 200)
    /// - `CACHE_ENTRY_TTL` - Fast cache TTL in seconds (default: 3600)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache = CacheConfig {
            capacity: positive("CACHE_CAPACITY", defaults.cache.capacity),
            expiry_time: Duration::from_secs(positive(
                "CACHE_EXPIRY_TIME",
                defaults.cache.expiry_time.as_secs(),
            )),
            cleanup_interval: Duration::from_secs(positive(
                "CACHE_CLEANUP_INTERVAL",
                defaults.cache.cleanup_interval.as_secs(),
            )),
        };

        let packer = PackerConfig {
            max_context_tokens: parsed("MAX_CONTEXT_TOKENS", defaults.packer.max_context_tokens),
            max_history_tokens: parsed("MAX_HISTORY_TOKENS", defaults.packer.max_history_tokens),
        };

        let mut cutoff_distance = parsed("CUTOFF_DISTANCE", defaults.ranker.cutoff_distance);
        if !(cutoff_distance > 0.0 && cutoff_distance <= 1.0) {
            warn!(
                "CUTOFF_DISTANCE={} outside (0, 1], using {}",
                cutoff_distance, defaults.ranker.cutoff_distance
            );
            cutoff_distance = defaults.ranker.cutoff_distance;
        }
        let ranker = RankerConfig {
            cutoff_distance,
            min_score_distance: parsed("MIN_SCORE_DISTANCE", defaults.ranker.min_score_distance),
            max_documents_to_retrieve: positive(
                "MAX_DOCUMENTS_TO_RETRIEVE",
                defaults.ranker.max_documents_to_retrieve,
            ),
        };

        let session = SessionConfig {
            store_timeout: Duration::from_millis(positive(
                "STORE_TIMEOUT_MS",
                defaults.session.store_timeout.as_millis() as u64,
            )),
            cache_timeout: Duration::from_millis(positive(
                "CACHE_TIMEOUT_MS",
                defaults.session.cache_timeout.as_millis() as u64,
            )),
            cache_ttl: Duration::from_secs(positive(
                "CACHE_ENTRY_TTL",
                defaults.session.cache_ttl.as_secs(),
            )),
        };

        Self {
            cache,
            packer,
            ranker,
            session,
            server_port: parsed("SERVER_PORT", defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            packer: PackerConfig::default(),
            ranker: RankerConfig::default(),
            session: SessionConfig::default(),
            server_port: 3000,
        }
    }
}

/// Reads and parses `key`, falling back to `default` when unset or malformed.
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parsed`], but zero is rejected in favour of the default.
fn positive<T>(key: &str, default: T) -> T
where
    T: FromStr + PartialEq + Default + Copy + std::fmt::Display,
{
    let value = parsed(key, default);
    if value == T::default() {
        warn!("{} must be positive, using {}", key, default);
        default
    } else {
        value
    }
}
