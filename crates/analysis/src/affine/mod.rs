//! Affine analysis interface.
//!
//! The cost model never evaluates expressions itself; it asks an analyzer. This module
//! defines that seam. It provides:
//! 1. **Trait:** `AffineAnalyzer`, resolving trip counts and constant differences.
//! 2. **Linear Analyzer:** A built-in implementation folding values into linear forms
//!    over induction variables, symbols, and other opaque-but-stable atoms.

/// Linear-form analyzer over the arena IR.
pub mod linear;

pub use linear::{LinearAnalyzer, LinearForm};

use crate::common::{LoopId, ValueId};
use crate::ir::Function;

/// Symbolic queries the cost model needs from the host compiler.
///
/// Implementations must be deterministic: the cost model may ask the same question
/// several times while analyzing one nest and relies on identical answers.
pub trait AffineAnalyzer {
    /// Returns the number of iterations `loop_id` executes, if it can be determined.
    ///
    /// A result of `Some(0)` is treated the same as `None`.
    fn trip_count(&self, func: &Function, loop_id: LoopId) -> Option<u64>;

    /// Returns `true` if `value` can take part in symbolic arithmetic.
    fn is_analyzable(&self, func: &Function, value: ValueId) -> bool;

    /// Returns `a - b` if the difference is a compile-time constant.
    fn constant_difference(&self, func: &Function, a: ValueId, b: ValueId) -> Option<i64>;
}

