//! Trip count resolution.
//!
//! Counts are requested from the affine analyzer for every loop of a nest, in nest
//! order. Unknown counts are then filled in from their neighbours:
//! 1. **First loop:** takes its successor's count.
//! 2. **Last loop:** takes its predecessor's count.
//! 3. **Interior loop:** takes the integer mean of both neighbours.
//!
//! The pass runs left to right in place, so a filled-in count is visible to the next
//! loop. Anything still zero becomes the configured fallback.

use std::fmt::Write as _;

use tracing::debug;

use crate::affine::AffineAnalyzer;
use crate::common::LoopId;
use crate::ir::Function;
use crate::nest::LoopNest;

/// Per-loop trip counts aligned with nest order. Every count is positive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TripCountTable {
    entries: Vec<(LoopId, u64)>,
}

impl TripCountTable {
    /// Returns the `(loop, count)` pairs in nest order.
    pub fn entries(&self) -> &[(LoopId, u64)] {
        &self.entries
    }

    /// Returns the count of `l`, if it is part of the table.
    pub fn get(&self, l: LoopId) -> Option<u64> {
        self.entries.iter().find(|(id, _)| *id == l).map(|&(_, c)| c)
    }

    /// Returns the counts alone, in nest order.
    pub fn counts(&self) -> Vec<u64> {
        self.entries.iter().map(|&(_, c)| c).collect()
    }

    /// Returns the number of loops in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the product of every count except that of `l`.
    ///
    /// An empty product is `1.0`.
    pub fn product_except(&self, l: LoopId) -> f64 {
        self.entries
            .iter()
            .filter(|(id, _)| *id != l)
            .map(|&(_, c)| c as f64)
            .product()
    }

    /// Renders the table for diagnostics.
    pub fn dump(&self, func: &Function) -> String {
        let mut out = String::from("Printing Trip Counts: ");
        if self.entries.is_empty() {
            out.push_str("(empty)");
        }
        out.push('\n');
        for &(l, count) in &self.entries {
            let _ = writeln!(out, "Loop: {}\tTripCount: {count}", func.loop_name(l));
        }
        out
    }
}

/// Fills in unknown (zero) counts from their neighbours, in place, left to right.
///
/// Counts still zero afterwards become `fallback`. A lone unknown count has no
/// neighbours and takes `fallback` directly.
pub fn normalize_trip_counts(counts: &mut [u64], fallback: u64) {
    let len = counts.len();
    for i in 0..len {
        if counts[i] != 0 {
            continue;
        }
        counts[i] = if len == 1 {
            0
        } else if i == 0 {
            counts[1]
        } else if i == len - 1 {
            counts[i - 1]
        } else {
            // u128 so two large neighbours cannot overflow.
            ((u128::from(counts[i - 1]) + u128::from(counts[i + 1])) / 2) as u64
        };
        if counts[i] == 0 {
            counts[i] = fallback;
        }
    }
}

/// Resolves and normalizes the trip count of every loop in `nest`.
pub fn resolve_trip_counts<A: AffineAnalyzer + ?Sized>(
    func: &Function,
    nest: &LoopNest,
    analyzer: &A,
    fallback: u64,
) -> TripCountTable {
    let mut counts: Vec<u64> = nest
        .iter()
        .map(|l| analyzer.trip_count(func, l).unwrap_or(0))
        .collect();
    let unknown = counts.iter().filter(|&&c| c == 0).count();
    normalize_trip_counts(&mut counts, fallback);
    if unknown > 0 {
        debug!(
            nest = %nest.display(func),
            unknown,
            normalized = ?counts,
            "normalized unknown trip counts"
        );
    }
    TripCountTable {
        entries: nest.iter().zip(counts).collect(),
    }
}
