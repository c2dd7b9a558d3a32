//! Analysis-wide constants.
//!
//! This module defines the fixed values the cost model falls back on. It includes:
//! 1. **Sentinel:** The cost reported for loops that were never computed or were rejected.
//! 2. **Trip Count Fallback:** The count substituted when neither neighbour can supply one.
//! 3. **Cache Defaults:** The line size used when no cache parameters are supplied.

/// Cost reported for a loop that has not been computed, or whose nest was rejected.
pub const SENTINEL_COST: f64 = -1.0;

/// Trip count substituted when normalization still yields zero.
pub const STATIC_TRIP_COUNT: u64 = 1000;

/// Cache line size, in elements, used when none is configured.
pub const DEFAULT_LINE_WORDS: u32 = 4;

/// Index of the leading structural offset in an addressing expression.
///
/// Operand 0 of an address is its base; stride classification starts at the
/// first index after it.
pub const FIRST_INDEX_OPERAND: usize = 1;

/// Index position treated as contiguous under column-major access order.
///
/// Position 1 is the primary offset into the aggregate, so the leading array
/// dimension is position 2.
pub const COLUMN_MAJOR_CONTIGUOUS_INDEX: usize = 2;
