//! Configuration system for the loop cost analysis.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the cost model. It provides:
//! 1. **Defaults:** Baseline cache parameters and the trip-count fallback.
//! 2. **Structures:** Cache and analysis settings grouped under a root `Config`.
//! 3. **Enums:** Cache associativity and array access order.
//!
//! Configuration is supplied as JSON (`Config::from_json` / `Config::from_file`) or
//! built from `Config::default()`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::ConfigError;

/// Default configuration constants for the analysis.
///
/// These values define the baseline configuration when not explicitly
/// overridden in a JSON configuration.
mod defaults {
    use crate::common::constants;

    /// Default cache line size in elements (4 words).
    ///
    /// Generic data layout; a target description would normally supply this.
    pub const LINE_WORDS: u32 = constants::DEFAULT_LINE_WORDS;

    /// Default cache capacity in elements (8192 words).
    ///
    /// Recorded for completeness; the cost formula does not use capacity.
    pub const SIZE_WORDS: u32 = 8192;

    /// Trip count substituted when a loop's count cannot be resolved or inferred.
    pub const FALLBACK_TRIP_COUNT: u64 = constants::STATIC_TRIP_COUNT;
}

/// Cache associativity.
///
/// Recorded on the cache model but not used by the cost formula, which only
/// depends on the line size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Associativity {
    /// Direct-mapped cache (one way).
    #[default]
    Direct,
    /// Two-way set-associative.
    #[serde(alias = "2")]
    Way2,
    /// Four-way set-associative.
    #[serde(alias = "4")]
    Way4,
    /// Eight-way set-associative.
    #[serde(alias = "8")]
    Way8,
    /// Fully associative.
    #[serde(alias = "Fully")]
    Full,
}

/// Array element layout assumed when classifying strides.
///
/// Selects which index position of an addressing expression walks
/// contiguous memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AccessOrder {
    /// C-style layout: the last index is contiguous.
    #[default]
    #[serde(alias = "row-major", alias = "row_major")]
    RowMajor,
    /// Fortran-style layout: the leading dimension (index position 2) is contiguous.
    #[serde(alias = "column-major", alias = "column_major")]
    ColumnMajor,
}

/// Root configuration structure containing all analysis settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use loopcost_core::config::{AccessOrder, Config};
///
/// let config = Config::default();
/// assert_eq!(config.cache.line_words, 4);
/// assert_eq!(config.analysis.access_order, AccessOrder::RowMajor);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use loopcost_core::config::{AccessOrder, Associativity, Config};
///
/// let json = r#"{
///     "cache": { "line_words": 16, "size_words": 8192, "associativity": "Way4" },
///     "analysis": { "access_order": "ColumnMajor", "fallback_trip_count": 100 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.cache.line_words, 16);
/// assert_eq!(config.cache.associativity, Associativity::Way4);
/// assert_eq!(config.analysis.access_order, AccessOrder::ColumnMajor);
/// assert_eq!(config.analysis.fallback_trip_count, 100);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Cache parameters
    #[serde(default)]
    pub cache: CacheConfig,
    /// Cost model settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// Missing sections and fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// Cache parameters consumed by the cost model.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache line size in elements (words)
    #[serde(default = "CacheConfig::default_line_words")]
    pub line_words: u32,

    /// Total cache size in elements (unused by the cost formula)
    #[serde(default = "CacheConfig::default_size_words")]
    pub size_words: u32,

    /// Associativity (unused by the cost formula)
    #[serde(default)]
    pub associativity: Associativity,
}

impl CacheConfig {
    /// Returns the default cache line size in elements.
    fn default_line_words() -> u32 {
        defaults::LINE_WORDS
    }

    /// Returns the default cache size in elements.
    fn default_size_words() -> u32 {
        defaults::SIZE_WORDS
    }
}

impl Default for CacheConfig {
    /// Creates a default cache configuration.
    ///
    /// Four-word lines, direct-mapped, default capacity.
    fn default() -> Self {
        Self {
            line_words: defaults::LINE_WORDS,
            size_words: defaults::SIZE_WORDS,
            associativity: Associativity::default(),
        }
    }
}

/// Cost model settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Array layout used for stride classification
    #[serde(default)]
    pub access_order: AccessOrder,

    /// Trip count used when normalization cannot infer one
    #[serde(default = "AnalysisConfig::default_fallback_trip_count")]
    pub fallback_trip_count: u64,
}

impl AnalysisConfig {
    /// Returns the default fallback trip count.
    fn default_fallback_trip_count() -> u64 {
        defaults::FALLBACK_TRIP_COUNT
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            access_order: AccessOrder::default(),
            fallback_trip_count: defaults::FALLBACK_TRIP_COUNT,
        }
    }
}
