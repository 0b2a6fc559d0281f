//! Index configuration.
//!
//! A small serializable configuration with sensible defaults, loadable from
//! JSON while keeping complexity minimal.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for building or loading a location index.
///
/// # Example
///
/// ```rust
/// use roadgrid::IndexConfig;
///
/// let config = IndexConfig::default().with_min_resolution(100);
/// assert_eq!(config.min_resolution_meters, 100);
///
/// // Load from JSON
/// let json = r#"{
///     "min_resolution_meters": 100,
///     "max_region_search": 6
/// }"#;
/// let config = IndexConfig::from_json(json).unwrap();
/// assert_eq!(config.max_region_search, 6);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Minimum width in meters of one leaf tile. Decrease this for faster
    /// queries at the price of a larger index.
    #[serde(default = "IndexConfig::default_min_resolution")]
    pub min_resolution_meters: u32,

    /// How many rings of neighbouring tiles around the query tile are
    /// searched before giving up. Odd values are rounded up to the next even
    /// value when the configuration is applied, so that the search always
    /// ends on a termination check.
    #[serde(default = "IndexConfig::default_max_region_search")]
    pub max_region_search: u32,

    /// Use the fast planar approximation for query distances instead of the
    /// precise earth model.
    #[serde(default = "IndexConfig::default_approximation")]
    pub approximate_distance: bool,

    /// Growth granularity of the backing store in bytes. `None` keeps the
    /// store's own default.
    #[serde(default)]
    pub segment_size_bytes: Option<usize>,
}

impl IndexConfig {
    const fn default_min_resolution() -> u32 {
        300
    }

    const fn default_max_region_search() -> u32 {
        4
    }

    const fn default_approximation() -> bool {
        true
    }

    pub fn with_min_resolution(mut self, meters: u32) -> Self {
        self.min_resolution_meters = meters;
        self
    }

    pub fn with_max_region_search(mut self, tiles: u32) -> Self {
        self.max_region_search = tiles;
        self
    }

    pub fn with_approximation(mut self, approximate: bool) -> Self {
        self.approximate_distance = approximate;
        self
    }

    pub fn with_segment_size(mut self, bytes: usize) -> Self {
        self.segment_size_bytes = Some(bytes);
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.min_resolution_meters == 0 {
            return Err(IndexError::InvalidConfiguration(
                "tile resolution must be positive".to_string(),
            ));
        }

        if self.max_region_search < 1 {
            return Err(IndexError::InvalidConfiguration(
                "region of location index must be at least 1".to_string(),
            ));
        }

        if self.segment_size_bytes == Some(0) {
            return Err(IndexError::InvalidConfiguration(
                "segment size must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: IndexConfig = serde_json::from_str(json)
            .map_err(|e| IndexError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| IndexError::InvalidConfiguration(e.to_string()))
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_resolution_meters: Self::default_min_resolution(),
            max_region_search: Self::default_max_region_search(),
            approximate_distance: Self::default_approximation(),
            segment_size_bytes: None,
        }
    }
}
