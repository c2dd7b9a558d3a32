//! Arena identifiers.
//!
//! This module defines strong index types for the entities owned by a
//! [`Function`](crate::ir::Function). It provides the following:
//! 1. **Type Safety:** Loops, blocks, and values cannot be confused at compile time.
//! 2. **Stable Identity:** Ids are plain indices into the function's arenas, so they are
//!    `Copy`, hashable, and ordered by creation.
//! 3. **No Ownership Cycles:** Parent/child links in the loop tree are stored as ids
//!    rather than pointers.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// Creates an id from an arena index.
            #[inline(always)]
            pub const fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Returns the arena index this id refers to.
            #[inline(always)]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Identifies a loop in a function's loop forest.
    ///
    /// Loops are keyed by the identity of their header block, so two loops never
    /// share an id even when their bodies overlap through nesting.
    LoopId,
    "loop"
);

arena_id!(
    /// Identifies a basic block.
    BlockId,
    "bb"
);

arena_id!(
    /// Identifies an SSA value (an expression node in the value graph).
    ValueId,
    "v"
);
