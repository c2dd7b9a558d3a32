//! Reference grouping.
//!
//! Memory accesses of the innermost body are clustered into groups presumed to share a
//! cache line. An access joins the first existing group whose representative
//! 1. **has the same operand count,**
//! 2. **shares every operand but the last** (by value identity), and
//! 3. **has a last operand exceeding the representative's by a constant smaller than a
//!    cache line.**
//!
//! The difference is signed: an access any constant distance below its representative
//! joins the group.
//!
//! Otherwise the access becomes the representative of a new group. Accesses are only
//! compared against representatives, never against each other, so the result depends
//! on program order and is not transitive.

use std::fmt::Write as _;

use tracing::trace;

use crate::affine::AffineAnalyzer;
use crate::common::{BlockId, ValueId};
use crate::ir::{Function, Inst};

/// Group representatives in first-occurrence order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceGroups {
    representatives: Vec<ValueId>,
}

impl ReferenceGroups {
    /// Returns the representative addressing expressions.
    pub fn representatives(&self) -> &[ValueId] {
        &self.representatives
    }

    /// Returns the number of groups.
    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    /// Returns `true` if the body holds no memory accesses.
    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }

    /// Iterates over the representatives in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.representatives.iter().copied()
    }

    /// Renders the groups for diagnostics.
    pub fn dump(&self, func: &Function) -> String {
        let mut out = String::from("Printing Reference Groups: ");
        if self.representatives.is_empty() {
            out.push_str("(empty)");
        }
        out.push('\n');
        for &rep in &self.representatives {
            let _ = writeln!(out, "Ref group: {}", func.describe_value(rep));
        }
        out
    }
}

/// Returns `true` if `access` falls in the cache line of `rep`.
fn shares_line<A: AffineAnalyzer + ?Sized>(
    func: &Function,
    analyzer: &A,
    access: &[ValueId],
    rep: &[ValueId],
    line_words: u32,
) -> bool {
    let n = access.len();
    if rep.len() != n || access[..n - 1] != rep[..n - 1] {
        return false;
    }
    let (last, rep_last) = (access[n - 1], rep[n - 1]);
    if !analyzer.is_analyzable(func, rep_last) {
        return false;
    }
    analyzer
        .constant_difference(func, last, rep_last)
        .is_some_and(|diff| diff < i64::from(line_words))
}

/// Partitions the addressing expressions of `body` into reference groups.
pub fn create_reference_groups<A: AffineAnalyzer + ?Sized>(
    func: &Function,
    body: BlockId,
    analyzer: &A,
    line_words: u32,
) -> ReferenceGroups {
    let mut groups = ReferenceGroups::default();
    for inst in &func.block(body).insts {
        let Inst::Value(v) = *inst else {
            continue;
        };
        let Some(operands) = func.address_operands(v) else {
            continue;
        };
        let Some(&last) = operands.last() else {
            continue;
        };

        let group = if analyzer.is_analyzable(func, last) {
            groups.iter().find(|&rep| {
                func.address_operands(rep).is_some_and(|rep_ops| {
                    shares_line(func, analyzer, operands, rep_ops, line_words)
                })
            })
        } else {
            None
        };

        match group {
            Some(rep) => trace!(
                access = %func.describe_value(v),
                group = %func.describe_value(rep),
                "joined reference group"
            ),
            None => {
                trace!(access = %func.describe_value(v), "new reference group");
                groups.representatives.push(v);
            }
        }
    }
    groups
}
