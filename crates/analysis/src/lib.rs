//! Cache-locality loop cost analysis library.
//!
//! This crate estimates, for each loop of a perfect loop nest, how many cache lines the
//! nest touches when that loop runs innermost, following the Carr-McKinley-Tseng
//! data-locality model. It includes:
//! 1. **IR:** An arena-based loop forest, blocks, and SSA values, built in code or from JSON.
//! 2. **Affine Analysis:** Trip counts and constant differences of index expressions.
//! 3. **Nests:** Discovery and verification of perfect loop nests.
//! 4. **Cost Model:** Trip-count normalization, reference grouping, stride
//!    classification, and per-loop cost aggregation.
//! 5. **Driver:** Function-level analysis, configuration, and diagnostic reports.

/// Function-level driver and reports.
pub mod analysis;
/// Affine analyzer trait and the built-in linear analyzer.
pub mod affine;
/// Common types and constants (ids, sentinel cost, errors).
pub mod common;
/// Analysis configuration (defaults, enums, JSON loading).
pub mod config;
/// Cost model (cache, trip counts, reference groups, strides, aggregation).
pub mod cost;
/// Arena IR (functions, loops, blocks, values, builder, JSON description).
pub mod ir;
/// Perfect loop nest discovery and verification.
pub mod nest;

/// Function-level entry point and its report.
pub use crate::analysis::{FunctionReport, analyze_function};
/// Analyzer seam and the built-in implementation.
pub use crate::affine::{AffineAnalyzer, LinearAnalyzer};
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Cost model entry point and per-nest results.
pub use crate::cost::{CostModel, CostTable, NestCost};
/// The IR a cost model runs over.
pub use crate::ir::Function;
/// Ordered loop nests.
pub use crate::nest::LoopNest;
