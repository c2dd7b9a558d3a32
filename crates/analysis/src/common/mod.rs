//! Common types shared across the loop cost analysis.
//!
//! This module provides the building blocks used by every other component. It includes:
//! 1. **Identifiers:** Strong arena ids for loops, blocks, and values.
//! 2. **Constants:** The sentinel cost, trip-count fallback, and cache defaults.
//! 3. **Error Handling:** IR and config errors, and nest rejection reasons.

/// Analysis-wide constants.
pub mod constants;

/// Error types and nest rejection reasons.
pub mod error;

/// Arena identifier types.
pub mod ids;

pub use constants::{SENTINEL_COST, STATIC_TRIP_COUNT};
pub use error::{ConfigError, IrError, NestRejection};
pub use ids::{BlockId, LoopId, ValueId};
