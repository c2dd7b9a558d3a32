//! Function-level driver.
//!
//! Discovers every maximal perfect nest of a function, computes each nest with a fresh
//! cost table, and merges the results into one report. Loops outside every perfect
//! nest report the sentinel cost.

use serde::Serialize;
use tracing::{debug, info};

use crate::affine::AffineAnalyzer;
use crate::common::{LoopId, SENTINEL_COST};
use crate::config::Config;
use crate::cost::{CostModel, CostTable, NestCost};
use crate::ir::Function;
use crate::nest::find_perfect_nests;

/// Report sections accepted by [`FunctionReport::render`].
pub const SECTIONS: [&str; 3] = ["trip_counts", "groups", "costs"];

/// One loop's cost, as written by the command-line tool.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostEntry {
    /// Header name of the loop.
    #[serde(rename = "loop")]
    pub loop_name: String,
    /// Nesting depth within its nest (0 is outermost), if the loop is part of one.
    pub depth: Option<usize>,
    /// Computed cost, or the sentinel.
    pub cost: f64,
}

/// Costs of every loop of a function.
#[derive(Clone, Debug, Default)]
pub struct FunctionReport {
    function: String,
    nests: Vec<NestCost>,
    costs: CostTable,
}

impl FunctionReport {
    /// Returns the analyzed function's name.
    pub fn function_name(&self) -> &str {
        &self.function
    }

    /// Returns the per-nest results in discovery order.
    pub fn nests(&self) -> &[NestCost] {
        &self.nests
    }

    /// Returns the merged cost table.
    pub const fn costs(&self) -> &CostTable {
        &self.costs
    }

    /// Returns the cost of `l`, or [`SENTINEL_COST`] if it was never computed.
    pub fn cost_of(&self, l: LoopId) -> f64 {
        self.costs.cost_of(l)
    }

    /// Returns one entry per loop of `func`, in loop creation order.
    pub fn entries(&self, func: &Function) -> Vec<CostEntry> {
        func.loops()
            .map(|l| CostEntry {
                loop_name: func.loop_name(l).to_string(),
                depth: self
                    .nests
                    .iter()
                    .find_map(|n| n.nest.loops().iter().position(|&x| x == l)),
                cost: self.costs.get(l).unwrap_or(SENTINEL_COST),
            })
            .collect()
    }

    /// Renders the selected report sections.
    ///
    /// Recognized sections are listed in [`SECTIONS`]; an empty selection renders all
    /// of them.
    pub fn render(&self, func: &Function, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let mut out = String::new();

        if want("trip_counts") {
            for nc in &self.nests {
                out.push_str(&nc.trip_counts.dump(func));
            }
        }
        if want("groups") {
            for nc in &self.nests {
                out.push_str(&nc.groups.dump(func));
            }
        }
        if want("costs") {
            out.push_str(&self.costs.dump(func));
        }
        out
    }
}

/// Computes the cost of every loop in every perfect nest of `func`.
pub fn analyze_function<A: AffineAnalyzer + ?Sized>(
    func: &Function,
    analyzer: &A,
    config: &Config,
) -> FunctionReport {
    debug!(function = func.name(), "calculating loop costs");
    let model = CostModel::new(config);
    let mut report = FunctionReport {
        function: func.name().to_string(),
        ..FunctionReport::default()
    };

    for nest in find_perfect_nests(func) {
        let result = model.compute_costs(func, &nest, analyzer);
        debug!(
            "nest {}\n{}{}{}",
            nest.display(func),
            result.trip_counts.dump(func),
            result.groups.dump(func),
            result.costs.dump(func)
        );
        report.costs.merge(&result.costs);
        report.nests.push(result);
    }

    let rejected = report.nests.iter().filter(|n| n.is_rejected()).count();
    info!(
        function = func.name(),
        nests = report.nests.len(),
        rejected,
        loops = func.loop_count(),
        "loop costs computed"
    );
    report
}
