//! Cache-locality cost model.
//!
//! This module estimates, for every loop of a perfect nest, the number of cache lines
//! the nest would touch if that loop were placed innermost. It provides:
//! 1. **Cache Model:** The line size penalties are charged against.
//! 2. **Trip Counts:** Per-loop iteration counts with neighbour-based normalization.
//! 3. **Reference Groups:** Accesses of the innermost body clustered by cache line.
//! 4. **Stride Classes:** Invariant, contiguous, or strided access per loop.
//! 5. **Aggregation:** Per-loop costs, or the sentinel for rejected nests and loops
//!    without an induction variable.
//!
//! Costs are unnormalized relative magnitudes; only their ordering within one run is
//! meaningful.

/// Cache geometry.
pub mod cache;

/// Reference grouping of the innermost body.
pub mod groups;

/// Stride classification and per-reference penalties.
pub mod stride;

/// Trip count resolution and normalization.
pub mod trip_count;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::{debug, warn};

pub use self::cache::CacheModel;
pub use self::groups::{ReferenceGroups, create_reference_groups};
pub use self::stride::{StrideClass, classify_access, induction_occurs_in};
pub use self::trip_count::{TripCountTable, normalize_trip_counts, resolve_trip_counts};

use crate::affine::AffineAnalyzer;
use crate::common::{BlockId, LoopId, NestRejection, SENTINEL_COST, STATIC_TRIP_COUNT};
use crate::config::{AccessOrder, Config};
use crate::ir::Function;
use crate::nest::{LoopNest, innermost_body_block, is_perfect_nest};

/// Per-loop costs. Loops never computed report [`SENTINEL_COST`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CostTable {
    costs: BTreeMap<LoopId, f64>,
}

impl CostTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the sentinel for every loop of `nest`.
    pub fn for_nest(nest: &LoopNest) -> Self {
        Self {
            costs: nest.iter().map(|l| (l, SENTINEL_COST)).collect(),
        }
    }

    /// Returns the cost of `l`, or [`SENTINEL_COST`] if it has none.
    pub fn cost_of(&self, l: LoopId) -> f64 {
        self.costs.get(&l).copied().unwrap_or(SENTINEL_COST)
    }

    /// Returns the entry for `l`, sentinel included, if the table has one.
    pub fn get(&self, l: LoopId) -> Option<f64> {
        self.costs.get(&l).copied()
    }

    /// Records the cost of `l`.
    pub fn set(&mut self, l: LoopId, cost: f64) {
        let _ = self.costs.insert(l, cost);
    }

    /// Copies every entry of `other` into this table.
    pub fn merge(&mut self, other: &Self) {
        self.costs.extend(other.iter());
    }

    /// Iterates over `(loop, cost)` entries by loop id.
    pub fn iter(&self) -> impl Iterator<Item = (LoopId, f64)> + '_ {
        self.costs.iter().map(|(&l, &c)| (l, c))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Renders the table for diagnostics.
    pub fn dump(&self, func: &Function) -> String {
        let mut out = String::from("Printing Loop Costs: ");
        if self.costs.is_empty() {
            out.push_str("(empty)");
        }
        out.push('\n');
        for (l, cost) in self.iter() {
            if func.has_loop(l) {
                let _ = writeln!(out, "Loop: {}\tCosts: {cost}", func.loop_name(l));
            } else {
                let _ = writeln!(out, "Loop: {l}\tCosts: {cost}");
            }
        }
        out
    }
}

/// Everything computed for one nest.
#[derive(Clone, Debug, PartialEq)]
pub struct NestCost {
    /// The analyzed nest.
    pub nest: LoopNest,
    /// Normalized trip counts. Empty when the nest was rejected.
    pub trip_counts: TripCountTable,
    /// Reference groups of the innermost body. Empty when the nest was rejected.
    pub groups: ReferenceGroups,
    /// Per-loop costs.
    pub costs: CostTable,
    /// Why the nest was rejected, if it was.
    pub rejection: Option<NestRejection>,
}

impl NestCost {
    /// Returns `true` if every loop of the nest reports the sentinel because the nest
    /// was rejected.
    pub const fn is_rejected(&self) -> bool {
        self.rejection.is_some()
    }
}

/// Checks that `nest` is perfect and returns its innermost body block.
///
/// # Errors
///
/// Returns the [`NestRejection`] explaining why the cost model refuses the nest.
pub fn check_nest(func: &Function, nest: &LoopNest) -> Result<BlockId, NestRejection> {
    let innermost = nest.innermost().ok_or(NestRejection::Empty)?;
    if let Some(&unknown) = nest.loops().iter().find(|&&l| !func.has_loop(l)) {
        return Err(NestRejection::UnknownLoop(unknown));
    }
    if !is_perfect_nest(func, nest) {
        return Err(NestRejection::NotPerfect);
    }
    innermost_body_block(func, innermost).ok_or(NestRejection::NoSingleBody(innermost))
}

/// Combines trip counts, reference groups, and stride classes into per-loop costs.
///
/// The nest is re-validated first; a rejected nest reports the sentinel for every loop.
/// A loop without an induction variable keeps the sentinel while its siblings are
/// still computed.
pub fn aggregate_costs(
    func: &Function,
    nest: &LoopNest,
    trip_counts: &TripCountTable,
    groups: &ReferenceGroups,
    cache: &CacheModel,
    order: AccessOrder,
) -> CostTable {
    let mut costs = CostTable::for_nest(nest);
    if check_nest(func, nest).is_err() {
        return costs;
    }

    for l in nest.iter() {
        let name = func.loop_name(l);
        let Some(iv) = func.induction_variable(l) else {
            debug!(loop_name = name, "could not find induction variable");
            continue;
        };

        let this_trip = trip_counts.get(l).unwrap_or(1);
        let others = trip_counts.product_except(l);
        debug!(
            loop_name = name,
            induction = %func.describe_value(iv),
            this_trip,
            others,
            "loop penalties"
        );

        let mut cost = 0.0;
        for rep in groups.iter() {
            let class = classify_access(func, rep, iv, order);
            let penalty = class.penalty(this_trip, cache.line_words());
            cost += penalty * others;
            debug!(
                loop_name = name,
                access = %func.describe_value(rep),
                ?class,
                penalty,
                accumulated = cost,
                "reference penalty"
            );
        }
        costs.set(l, cost);
    }
    costs
}

/// The cost model: cache geometry, access order, and trip-count fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostModel {
    cache: CacheModel,
    order: AccessOrder,
    fallback_trip_count: u64,
}

impl CostModel {
    /// Creates a cost model from a configuration.
    ///
    /// A zero fallback trip count is replaced by the static default so normalized
    /// counts stay positive.
    pub fn new(config: &Config) -> Self {
        let fallback = if config.analysis.fallback_trip_count == 0 {
            warn!(
                fallback = STATIC_TRIP_COUNT,
                "fallback trip count of zero; using the default"
            );
            STATIC_TRIP_COUNT
        } else {
            config.analysis.fallback_trip_count
        };
        Self {
            cache: CacheModel::new(&config.cache),
            order: config.analysis.access_order,
            fallback_trip_count: fallback,
        }
    }

    /// Returns the cache model.
    pub const fn cache(&self) -> &CacheModel {
        &self.cache
    }

    /// Returns the access order used for stride classification.
    pub const fn access_order(&self) -> AccessOrder {
        self.order
    }

    /// Returns the trip count substituted when normalization cannot infer one.
    pub const fn fallback_trip_count(&self) -> u64 {
        self.fallback_trip_count
    }

    /// Computes the costs of every loop in `nest` with a fresh cost table.
    ///
    /// Rejected nests are logged and report the sentinel for every loop; the reason is
    /// recorded on the result rather than returned as an error.
    pub fn compute_costs<A: AffineAnalyzer + ?Sized>(
        &self,
        func: &Function,
        nest: &LoopNest,
        analyzer: &A,
    ) -> NestCost {
        let body = match check_nest(func, nest) {
            Ok(body) => body,
            Err(rejection) => {
                warn!(
                    function = func.name(),
                    nest = %nest.display(func),
                    %rejection,
                    "nest rejected"
                );
                return NestCost {
                    nest: nest.clone(),
                    trip_counts: TripCountTable::default(),
                    groups: ReferenceGroups::default(),
                    costs: CostTable::for_nest(nest),
                    rejection: Some(rejection),
                };
            }
        };

        let groups = create_reference_groups(func, body, analyzer, self.cache.line_words());
        let trip_counts = resolve_trip_counts(func, nest, analyzer, self.fallback_trip_count);
        let costs = aggregate_costs(func, nest, &trip_counts, &groups, &self.cache, self.order);
        NestCost {
            nest: nest.clone(),
            trip_counts,
            groups,
            costs,
            rejection: None,
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
