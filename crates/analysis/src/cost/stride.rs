//! Stride classification.
//!
//! For a loop's induction variable and an addressing expression, this module decides
//! how consecutive iterations of the loop walk memory through that expression:
//! 1. **Invariant:** the variable appears in no index; the access costs one line.
//! 2. **Contiguous:** the variable appears in the fastest-varying index; one line
//!    serves `line` iterations.
//! 3. **Strided:** the variable appears in another index; every iteration touches a
//!    new line.

use std::collections::HashSet;

use crate::common::ValueId;
use crate::common::constants::{COLUMN_MAJOR_CONTIGUOUS_INDEX, FIRST_INDEX_OPERAND};
use crate::config::AccessOrder;
use crate::ir::Function;

/// How an access strides with respect to one loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrideClass {
    /// The induction variable occurs in no index.
    Invariant,
    /// The induction variable occurs in the contiguous index at `position`.
    Contiguous {
        /// Operand position of the index.
        position: usize,
    },
    /// The induction variable occurs in a non-contiguous index at `position`.
    Strided {
        /// Operand position of the index.
        position: usize,
    },
}

impl StrideClass {
    /// Returns the per-reference penalty for a loop running `trip_count` iterations
    /// over lines of `line_words` elements.
    pub fn penalty(self, trip_count: u64, line_words: u32) -> f64 {
        match self {
            Self::Invariant => 1.0,
            Self::Contiguous { .. } => trip_count as f64 / f64::from(line_words),
            Self::Strided { .. } => trip_count as f64,
        }
    }
}

/// Returns `true` if `iv` occurs in the expression tree of `operand`.
///
/// The search follows computed values through their operands but stops at any other
/// phi-like node, so an outer loop's variable is never mistaken for an inner one.
pub fn induction_occurs_in(func: &Function, operand: ValueId, iv: ValueId) -> bool {
    let mut worklist = vec![operand];
    let mut visited = HashSet::new();
    while let Some(v) = worklist.pop() {
        if v == iv {
            return true;
        }
        if !visited.insert(v) {
            continue;
        }
        let kind = func.value_kind(v);
        if kind.is_phi_like() {
            continue;
        }
        worklist.extend(kind.operands().iter().filter(|o| !visited.contains(*o)));
    }
    false
}

/// Returns `true` if operand `position` of an access with `operand_count` operands is
/// the contiguous index under `order`.
pub const fn is_contiguous_position(
    order: AccessOrder,
    position: usize,
    operand_count: usize,
) -> bool {
    match order {
        AccessOrder::RowMajor => position + 1 == operand_count,
        AccessOrder::ColumnMajor => position == COLUMN_MAJOR_CONTIGUOUS_INDEX,
    }
}

/// Classifies the addressing expression `address` against induction variable `iv`.
///
/// Every index from the first after the base is searched; when `iv` occurs in several,
/// the last one decides. A value that is not an addressing expression is invariant.
pub fn classify_access(
    func: &Function,
    address: ValueId,
    iv: ValueId,
    order: AccessOrder,
) -> StrideClass {
    let Some(operands) = func.address_operands(address) else {
        return StrideClass::Invariant;
    };
    let count = operands.len();
    let mut class = StrideClass::Invariant;
    for (position, &index) in operands.iter().enumerate().skip(FIRST_INDEX_OPERAND) {
        if !induction_occurs_in(func, index, iv) {
            continue;
        }
        class = if is_contiguous_position(order, position, count) {
            StrideClass::Contiguous { position }
        } else {
            StrideClass::Strided { position }
        };
    }
    class
}
