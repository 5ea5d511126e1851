//! Sweep configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```rust
//! use gridsweep::SweepConfig;
//!
//! let config = SweepConfig::from_json(r#"{ "top_divisions": 10, "concurrency": 4 }"#).unwrap();
//! assert_eq!(config.cap, 60);
//! assert_eq!(config.top_divisions, 10);
//! ```

use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default text search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://places.googleapis.com/v1/places:searchText";

/// Maximum number of results the endpoint returns for one logical query.
pub const DEFAULT_CAP: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Result count at which a rectangle is considered truncated.
    #[serde(default = "SweepConfig::default_cap")]
    pub cap: usize,

    /// Grid size used to seed the sweep from the region's bounding box.
    #[serde(default = "SweepConfig::default_top_divisions")]
    pub top_divisions: usize,

    /// Grid size used when a saturated rectangle is split.
    #[serde(default = "SweepConfig::default_sub_divisions")]
    pub sub_divisions: usize,

    /// Deepest subdivision level allowed; `None` disables the depth guard.
    /// Written as `0` in config files.
    #[serde(default = "SweepConfig::default_max_depth", with = "depth_limit")]
    pub max_depth: Option<u32>,

    /// A saturated rectangle is not split when its children's diagonal
    /// would fall below this length.
    #[serde(default = "SweepConfig::default_min_cell_diagonal_meters")]
    pub min_cell_diagonal_meters: f64,

    /// Maximum number of logical queries in flight.
    #[serde(default = "SweepConfig::default_concurrency")]
    pub concurrency: usize,

    /// Timeout applied to every individual HTTP call.
    #[serde(default = "SweepConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Retries per page for retryable failures.
    #[serde(default)]
    pub max_retries: u32,

    /// Backoff before the first retry; doubled on each further attempt.
    #[serde(default = "SweepConfig::default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "SweepConfig::default_endpoint")]
    pub endpoint: String,
}

impl SweepConfig {
    const fn default_cap() -> usize {
        DEFAULT_CAP
    }

    const fn default_top_divisions() -> usize {
        30
    }

    const fn default_sub_divisions() -> usize {
        3
    }

    const fn default_max_depth() -> Option<u32> {
        Some(16)
    }

    const fn default_min_cell_diagonal_meters() -> f64 {
        5.0
    }

    const fn default_concurrency() -> usize {
        8
    }

    const fn default_request_timeout_ms() -> u64 {
        30_000
    }

    const fn default_retry_backoff_ms() -> u64 {
        500
    }

    fn default_endpoint() -> String {
        DEFAULT_ENDPOINT.to_string()
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_top_divisions(mut self, divisions: usize) -> Self {
        self.top_divisions = divisions;
        self
    }

    pub fn with_sub_divisions(mut self, divisions: usize) -> Self {
        self.sub_divisions = divisions;
        self
    }

    /// `Some(0)` is the same as `None`.
    pub fn with_max_depth(mut self, depth: Option<u32>) -> Self {
        self.max_depth = depth.filter(|&depth| depth > 0);
        self
    }

    pub fn with_min_cell_diagonal_meters(mut self, meters: f64) -> Self {
        self.min_cell_diagonal_meters = meters;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = saturating_millis(timeout);
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = saturating_millis(backoff);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cap == 0 {
            return Err("Result cap must be greater than zero".to_string());
        }

        if self.top_divisions == 0 {
            return Err("Top-level divisions must be greater than zero".to_string());
        }

        // A 1x1 split would query the same rectangle again forever.
        if self.sub_divisions < 2 {
            return Err("Sub-divisions must be at least 2".to_string());
        }

        if self.concurrency == 0 {
            return Err("Concurrency must be greater than zero".to_string());
        }

        if self.concurrency > Semaphore::MAX_PERMITS {
            return Err(format!(
                "Concurrency must be at most {}, got {}",
                Semaphore::MAX_PERMITS,
                self.concurrency
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err("Request timeout must be greater than zero".to_string());
        }

        if !self.min_cell_diagonal_meters.is_finite() || self.min_cell_diagonal_meters < 0.0 {
            return Err(format!(
                "Minimum cell diagonal must be a non-negative number, got {}",
                self.min_cell_diagonal_meters
            ));
        }

        if self.endpoint.trim().is_empty() {
            return Err("Endpoint URL must not be empty".to_string());
        }

        if self.cap > 1_000 {
            log::warn!(
                "Result cap of {} is far above what search endpoints usually return; \
                saturated rectangles may never be detected.",
                self.cap
            );
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: SweepConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: SweepConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// TOML has no null, so "no depth limit" travels as `0`.
mod depth_limit {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(depth: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(depth.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u32>, D::Error> {
        Ok(Option::<u32>::deserialize(deserializer)?.filter(|&depth| depth > 0))
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            cap: Self::default_cap(),
            top_divisions: Self::default_top_divisions(),
            sub_divisions: Self::default_sub_divisions(),
            max_depth: Self::default_max_depth(),
            min_cell_diagonal_meters: Self::default_min_cell_diagonal_meters(),
            concurrency: Self::default_concurrency(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            max_retries: 0,
            retry_backoff_ms: Self::default_retry_backoff_ms(),
            endpoint: Self::default_endpoint(),
        }
    }
}
