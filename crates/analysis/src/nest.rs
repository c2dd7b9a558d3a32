//! Perfect loop nest discovery and verification.
//!
//! This module recognizes the loop structures the cost model accepts. It provides:
//! 1. **`LoopNest`:** An ordered path of loops, outermost first.
//! 2. **Discovery:** `find_perfect_nests` walks the loop forest bottom-up and returns
//!    every maximal perfect nest.
//! 3. **Verification:** `is_perfect_nest` re-checks an arbitrary nest from the
//!    innermost loop outward, and `innermost_body_block` locates the single block the
//!    reference grouper scans.
//!
//! A loop may only extend a nest when it is not rotated, has a single child, and every
//! block it owns outside its header and latch is either inside that child or holds
//! nothing but an unconditional jump.

use std::fmt;

use tracing::{debug, trace};

use crate::common::{BlockId, LoopId};
use crate::ir::{Function, Inst, ValueKind};

/// An ordered sequence of loops, outermost first, innermost last.
///
/// Nests are views over a [`Function`]'s loop forest; they do not own loops.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LoopNest {
    loops: Vec<LoopId>,
}

impl LoopNest {
    /// Creates a nest from loops ordered outermost first.
    pub const fn new(loops: Vec<LoopId>) -> Self {
        Self { loops }
    }

    /// Returns the loops, outermost first.
    pub fn loops(&self) -> &[LoopId] {
        &self.loops
    }

    /// Returns the outermost loop.
    pub fn outermost(&self) -> Option<LoopId> {
        self.loops.first().copied()
    }

    /// Returns the innermost loop.
    pub fn innermost(&self) -> Option<LoopId> {
        self.loops.last().copied()
    }

    /// Returns the nest depth.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Returns `true` if the nest has no loops.
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Returns `true` if `l` is part of the nest.
    pub fn contains(&self, l: LoopId) -> bool {
        self.loops.contains(&l)
    }

    /// Iterates over the loops, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = LoopId> + '_ {
        self.loops.iter().copied()
    }

    fn push_front(&mut self, l: LoopId) {
        self.loops.insert(0, l);
    }

    /// Returns a displayable rendering of the nest using loop names.
    pub const fn display<'a>(&'a self, func: &'a Function) -> NestDisplay<'a> {
        NestDisplay { nest: self, func }
    }
}

impl From<Vec<LoopId>> for LoopNest {
    fn from(loops: Vec<LoopId>) -> Self {
        Self::new(loops)
    }
}

/// [`LoopNest`] rendered as `outer -> ... -> inner`.
#[derive(Debug)]
pub struct NestDisplay<'a> {
    nest: &'a LoopNest,
    func: &'a Function,
}

impl fmt::Display for NestDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, l) in self.nest.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            if self.func.has_loop(l) {
                f.write_str(self.func.loop_name(l))?;
            } else {
                write!(f, "{l}")?;
            }
        }
        Ok(())
    }
}

/// Returns `true` if the loop test of `l` follows its body.
///
/// A loop whose header is not its single exiting block is rotated. A loop with several
/// exiting blocks is treated as rotated as well.
pub fn is_rotated(func: &Function, l: LoopId) -> bool {
    func.exiting_block(l) != Some(func.header(l))
}

/// Returns `true` if the header and latch of `l` hold only loop bookkeeping:
/// phis, induction arithmetic, comparisons, and branches.
pub fn has_simple_header_latch(func: &Function, l: LoopId) -> bool {
    [func.header(l), func.latch(l)].into_iter().all(|b| {
        func.block(b).insts.iter().all(|inst| match *inst {
            Inst::Value(v) => matches!(
                func.value_kind(v),
                ValueKind::Induction { .. }
                    | ValueKind::Phi
                    | ValueKind::Binary { .. }
                    | ValueKind::Const(_)
            ),
            Inst::Store { .. } => false,
            Inst::Jump(_) | Inst::Branch { .. } | Inst::Return => true,
        })
    })
}

/// Returns the blocks of `l` other than its header, its latch, and structurally empty
/// blocks.
fn working_blocks(func: &Function, l: LoopId) -> impl Iterator<Item = BlockId> + '_ {
    let (header, latch) = (func.header(l), func.latch(l));
    func.blocks_of(l)
        .iter()
        .copied()
        .filter(move |&b| b != header && b != latch && !func.is_structurally_empty(b))
}

/// Returns `true` if every working block of `outer` belongs to `inner`.
pub fn blocks_perfectly_nested_under(func: &Function, outer: LoopId, inner: LoopId) -> bool {
    working_blocks(func, outer).all(|b| {
        let nested = func.contains(inner, b);
        if !nested {
            trace!(
                outer = func.loop_name(outer),
                block = %func.block(b).name,
                "block outside the subloop"
            );
        }
        nested
    })
}

fn accepts_leaf(func: &Function, l: LoopId) -> bool {
    !is_rotated(func, l) && has_simple_header_latch(func, l)
}

fn extends_nest(func: &Function, outer: LoopId, inner: LoopId) -> bool {
    func.children(outer) == [inner]
        && !is_rotated(func, outer)
        && has_simple_header_latch(func, outer)
        && blocks_perfectly_nested_under(func, outer, inner)
}

/// Classifies the subtree rooted at `l`, appending perfect nests to `nests`.
///
/// Returns `true` if `l` heads the nest most recently pushed.
fn populate_under(func: &Function, l: LoopId, nests: &mut Vec<LoopNest>) -> bool {
    let children = func.children(l);
    if children.is_empty() {
        if accepts_leaf(func, l) {
            nests.push(LoopNest::new(vec![l]));
            return true;
        }
        return false;
    }

    let mut child_perfect = false;
    for &child in children {
        child_perfect = populate_under(func, child, nests);
    }

    if children.len() == 1 && child_perfect && extends_nest(func, l, children[0]) {
        if let Some(nest) = nests.last_mut() {
            nest.push_front(l);
            return true;
        }
    }
    false
}

/// Returns every maximal perfect nest of `func`, in loop-forest order.
pub fn find_perfect_nests(func: &Function) -> Vec<LoopNest> {
    let mut nests = Vec::new();
    for &root in func.roots() {
        let _ = populate_under(func, root, &mut nests);
    }
    debug!(
        function = func.name(),
        count = nests.len(),
        "perfect loop nests found"
    );
    nests
}

/// Verifies that `nest` is perfect, checking the innermost loop first and then
/// each enclosing loop in turn.
///
/// Agrees with [`find_perfect_nests`] on every nest that function returns.
pub fn is_perfect_nest(func: &Function, nest: &LoopNest) -> bool {
    let Some(innermost) = nest.innermost() else {
        return false;
    };
    if !nest.iter().all(|l| func.has_loop(l)) {
        return false;
    }
    if !func.is_innermost(innermost) || !accepts_leaf(func, innermost) {
        return false;
    }
    nest.loops()
        .windows(2)
        .rev()
        .all(|pair| extends_nest(func, pair[0], pair[1]))
}

/// Returns the single non-trivial block of the innermost loop's body.
///
/// The header, the latch, and structurally empty blocks are ignored; `None` is returned
/// unless exactly one block remains.
pub fn innermost_body_block(func: &Function, innermost: LoopId) -> Option<BlockId> {
    let mut blocks = working_blocks(func, innermost);
    match (blocks.next(), blocks.next()) {
        (Some(body), None) => Some(body),
        _ => None,
    }
}
