//! Linear-form affine analyzer.
//!
//! Every analyzable value folds into `constant + Σ coefficient·atom`. Atoms are the
//! values arithmetic cannot look inside: induction variables, phis, symbols, loads,
//! addresses, comparisons, and products of two non-constant forms. Opaque values
//! poison every expression built from them.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use super::AffineAnalyzer;
use crate::common::{LoopId, ValueId};
use crate::ir::{BinOp, Function, ValueKind};

/// A value folded into `constant + Σ coefficient·atom`.
///
/// Zero coefficients are never stored, so two forms are equal exactly when they
/// denote the same linear expression.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearForm {
    /// Constant term.
    pub constant: i64,
    /// Non-zero coefficients keyed by atom.
    pub terms: BTreeMap<ValueId, i64>,
}

impl LinearForm {
    /// The form `c`.
    pub fn constant(c: i64) -> Self {
        Self {
            constant: c,
            terms: BTreeMap::new(),
        }
    }

    /// The form `1·atom`.
    pub fn atom(v: ValueId) -> Self {
        let mut terms = BTreeMap::new();
        let _ = terms.insert(v, 1);
        Self { constant: 0, terms }
    }

    /// Folds `v` into a linear form, or `None` if it depends on an opaque value
    /// or the arithmetic overflows.
    ///
    /// Operands are folded in post-order with each value folded once, so shared
    /// subexpressions and long chains cost time linear in the expression graph.
    pub fn of(func: &Function, v: ValueId) -> Option<Self> {
        let mut memo: HashMap<ValueId, Option<Self>> = HashMap::new();
        let mut stack = vec![(v, false)];

        while let Some((value, operands_done)) = stack.pop() {
            if memo.contains_key(&value) {
                continue;
            }
            let form = match *func.value_kind(value) {
                ValueKind::Const(c) => Some(Self::constant(c)),
                ValueKind::Opaque => None,
                ValueKind::Symbol
                | ValueKind::Induction { .. }
                | ValueKind::Phi
                | ValueKind::Load { .. }
                | ValueKind::Address { .. } => Some(Self::atom(value)),
                ValueKind::Binary { op, operands: [lhs, rhs] } => {
                    if !operands_done {
                        stack.push((value, true));
                        stack.extend(
                            [lhs, rhs]
                                .into_iter()
                                .filter(|x| !memo.contains_key(x))
                                .map(|x| (x, false)),
                        );
                        continue;
                    }
                    let folded = |x: ValueId| memo.get(&x).and_then(Option::as_ref);
                    match (folded(lhs), folded(rhs)) {
                        (Some(l), Some(r)) => Self::fold(value, op, l, r),
                        _ => None,
                    }
                }
            };
            let _ = memo.insert(value, form);
        }
        memo.remove(&v).flatten()
    }

    /// Applies `op` to the folded operands of the binary value `v`.
    fn fold(v: ValueId, op: BinOp, lhs: &Self, rhs: &Self) -> Option<Self> {
        match op {
            BinOp::Add => lhs.checked_add(rhs),
            BinOp::Sub => lhs.checked_sub(rhs),
            BinOp::Mul => match (lhs.as_constant(), rhs.as_constant()) {
                (Some(k), _) => rhs.checked_scale(k),
                (_, Some(k)) => lhs.checked_scale(k),
                (None, None) => Some(Self::atom(v)),
            },
            BinOp::Cmp => Some(Self::atom(v)),
        }
    }

    /// Returns the constant if the form has no atoms.
    pub fn as_constant(&self) -> Option<i64> {
        self.terms.is_empty().then_some(self.constant)
    }

    fn combine(&self, other: &Self, sign: i64) -> Option<Self> {
        let mut out = self.clone();
        out.constant = out.constant.checked_add(other.constant.checked_mul(sign)?)?;
        for (&atom, &coeff) in &other.terms {
            let entry = out.terms.entry(atom).or_insert(0);
            *entry = entry.checked_add(coeff.checked_mul(sign)?)?;
            if *entry == 0 {
                let _ = out.terms.remove(&atom);
            }
        }
        Some(out)
    }

    /// `self + other`, or `None` on overflow.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        self.combine(other, 1)
    }

    /// `self - other`, or `None` on overflow.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.combine(other, -1)
    }

    /// `k · self`, or `None` on overflow.
    pub fn checked_scale(&self, k: i64) -> Option<Self> {
        if k == 0 {
            return Some(Self::constant(0));
        }
        let mut terms = BTreeMap::new();
        for (&atom, &coeff) in &self.terms {
            let _ = terms.insert(atom, coeff.checked_mul(k)?);
        }
        Some(Self {
            constant: self.constant.checked_mul(k)?,
            terms,
        })
    }
}

/// Built-in [`AffineAnalyzer`] over the arena IR.
///
/// Trip counts come from a loop's canonical induction variable and its constant
/// exit bound; differences come from subtracting linear forms.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearAnalyzer;

impl LinearAnalyzer {
    /// Creates the analyzer.
    pub const fn new() -> Self {
        Self
    }
}

impl AffineAnalyzer for LinearAnalyzer {
    fn trip_count(&self, func: &Function, loop_id: LoopId) -> Option<u64> {
        if !func.has_loop(loop_id) {
            return None;
        }
        let iv = func.induction_variable(loop_id)?;
        let ValueKind::Induction { start, step, .. } = *func.value_kind(iv) else {
            return None;
        };
        let bound = func.exit_bound(loop_id)?;
        let (span, step) = (i128::from(bound) - i128::from(start), i128::from(step));
        let count = if step > 0 && span > 0 {
            (span + step - 1) / step
        } else if step < 0 && span < 0 {
            (-span + (-step) - 1) / -step
        } else {
            0
        };
        trace!(
            loop_name = func.loop_name(loop_id),
            start,
            bound,
            count = %count,
            "resolved trip count"
        );
        u64::try_from(count).ok().filter(|&c| c > 0)
    }

    fn is_analyzable(&self, func: &Function, value: ValueId) -> bool {
        LinearForm::of(func, value).is_some()
    }

    fn constant_difference(&self, func: &Function, a: ValueId, b: ValueId) -> Option<i64> {
        let a = LinearForm::of(func, a)?;
        let b = LinearForm::of(func, b)?;
        a.checked_sub(&b)?.as_constant()
    }
}
