//! Cache Parameter Model.
//!
//! This module holds the cache geometry the cost model charges penalties against.
//! Only the line size enters the cost formula; capacity and associativity are
//! recorded so reports can state what the costs were computed for.

use tracing::warn;

use crate::common::constants::DEFAULT_LINE_WORDS;
use crate::config::{Associativity, CacheConfig};

/// Cache geometry, in elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheModel {
    line_words: u32,
    size_words: u32,
    associativity: Associativity,
}

impl CacheModel {
    /// Creates a cache model from its configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache configuration specifying line size, capacity, and
    ///   associativity
    ///
    /// # Returns
    ///
    /// A new `CacheModel`. A zero line size falls back to the default line size
    /// instead of failing, so the contiguous penalty never divides by zero.
    pub fn new(config: &CacheConfig) -> Self {
        let safe_line = if config.line_words == 0 {
            warn!(
                fallback = DEFAULT_LINE_WORDS,
                "cache line size of zero; using the default"
            );
            DEFAULT_LINE_WORDS
        } else {
            config.line_words
        };

        Self {
            line_words: safe_line,
            size_words: config.size_words,
            associativity: config.associativity,
        }
    }

    /// Returns the line size in elements. Never zero.
    pub const fn line_words(&self) -> u32 {
        self.line_words
    }

    /// Returns the recorded capacity in elements.
    pub const fn size_words(&self) -> u32 {
        self.size_words
    }

    /// Returns the recorded associativity.
    pub const fn associativity(&self) -> Associativity {
        self.associativity
    }
}

impl Default for CacheModel {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
