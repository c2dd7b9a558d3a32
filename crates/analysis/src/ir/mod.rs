//! Host IR model.
//!
//! The cost model reads loops, blocks, and addressing expressions from a host
//! compiler. This module is a compact arena-based stand-in for that IR,
//! exposing exactly the queries the analysis needs:
//! 1. **Loop Forest:** Root loops, children, member blocks, header/latch/exiting blocks,
//!    canonical induction variables, and constant exit bounds.
//! 2. **Blocks:** Instructions in program order, with unconditional jumps distinguishable
//!    from conditional branches.
//! 3. **Value Graph:** SSA expression nodes, including memory addressing expressions and
//!    their index operands.
//!
//! Functions are built with [`FunctionBuilder`] or decoded from JSON with
//! [`Function::from_json`].

/// Fluent construction and validation of functions.
pub mod builder;

/// Serde description of a function and its conversion to the arena form.
pub mod desc;

use std::fmt::Write as _;

pub use self::builder::{FunctionBuilder, LoopSpec};
pub use self::desc::FunctionDesc;

use crate::common::{BlockId, IrError, LoopId, ValueId};

/// Binary operators on integer values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    /// Integer addition.
    Add,
    /// Integer subtraction.
    Sub,
    /// Integer multiplication.
    Mul,
    /// Comparison (loop exit tests).
    Cmp,
}

impl BinOp {
    /// Returns the mnemonic used in textual dumps.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Cmp => "cmp",
        }
    }
}

/// The kind of an SSA value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Integer constant.
    Const(i64),
    /// Function parameter or global symbol; opaque but analyzable.
    Symbol,
    /// Canonical induction variable of `loop_id`: starts at `start` and advances by
    /// `step` once per iteration.
    Induction {
        /// Loop the variable belongs to.
        loop_id: LoopId,
        /// Initial value.
        start: i64,
        /// Per-iteration increment.
        step: i64,
    },
    /// Any other header phi. Searches for an induction variable stop here.
    Phi,
    /// Binary arithmetic over two operands.
    Binary {
        /// Operator.
        op: BinOp,
        /// Left and right operands.
        operands: [ValueId; 2],
    },
    /// Memory addressing expression. Operand 0 is the base; operands 1.. are indices,
    /// the last one nearest the accessed element.
    Address {
        /// Base followed by index operands.
        operands: Vec<ValueId>,
    },
    /// Value read from memory through an address.
    Load {
        /// Address read from.
        address: ValueId,
    },
    /// Value the affine analyzer cannot reason about (e.g. a call result).
    Opaque,
}

impl ValueKind {
    /// Returns the values this node is computed from.
    ///
    /// Leaves (constants, symbols, phis, induction variables, opaque values)
    /// have no operands.
    pub fn operands(&self) -> &[ValueId] {
        match self {
            Self::Binary { operands, .. } => operands.as_slice(),
            Self::Address { operands } => operands.as_slice(),
            Self::Load { address } => std::slice::from_ref(address),
            Self::Const(_) | Self::Symbol | Self::Induction { .. } | Self::Phi | Self::Opaque => {
                &[]
            }
        }
    }

    /// Returns `true` for phi-like nodes (canonical induction variables and other phis).
    pub const fn is_phi_like(&self) -> bool {
        matches!(self, Self::Induction { .. } | Self::Phi)
    }
}

/// An SSA value: a name and the expression it computes.
#[derive(Clone, Debug)]
pub struct ValueData {
    /// Name used in dumps and textual descriptions.
    pub name: String,
    /// Expression kind.
    pub kind: ValueKind,
}

/// An instruction placed in a basic block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inst {
    /// Defines a value (arithmetic, address computation, load, phi, ...).
    Value(ValueId),
    /// Writes `value` to memory at `address`.
    Store {
        /// Address written to.
        address: ValueId,
        /// Value written.
        value: ValueId,
    },
    /// Unconditional branch.
    Jump(BlockId),
    /// Conditional branch.
    Branch {
        /// Target when the condition holds.
        then: BlockId,
        /// Target otherwise.
        otherwise: BlockId,
    },
    /// Function return.
    Return,
}

/// A basic block: a name and its instructions in program order.
#[derive(Clone, Debug, Default)]
pub struct BlockData {
    /// Block label.
    pub name: String,
    /// Instructions in program order.
    pub insts: Vec<Inst>,
}

impl BlockData {
    /// Returns `true` if the block holds nothing but an unconditional jump.
    pub fn is_structurally_empty(&self) -> bool {
        matches!(self.insts.as_slice(), [Inst::Jump(_)])
    }
}

/// A loop in the loop forest.
#[derive(Clone, Debug)]
pub struct LoopData {
    /// Loop header; also the loop's identity in dumps.
    pub header: BlockId,
    /// Block carrying the back edge.
    pub latch: BlockId,
    /// The single block with an edge leaving the loop, if there is exactly one.
    pub exiting: Option<BlockId>,
    /// Member blocks, including those of nested loops.
    pub blocks: Vec<BlockId>,
    /// Enclosing loop, if any.
    pub parent: Option<LoopId>,
    /// Directly nested loops, in program order.
    pub children: Vec<LoopId>,
    /// Canonical induction variable, if one was recognized.
    pub induction: Option<ValueId>,
    /// Constant limit the header test compares the induction variable against.
    pub exit_bound: Option<i64>,
}

/// A function: arenas of blocks, loops, and values plus its root loops.
#[derive(Clone, Debug, Default)]
pub struct Function {
    name: String,
    blocks: Vec<BlockData>,
    loops: Vec<LoopData>,
    values: Vec<ValueData>,
    roots: Vec<LoopId>,
}

impl Function {
    /// Decodes a function from its JSON description.
    ///
    /// # Errors
    ///
    /// Returns [`IrError::Json`] for malformed JSON and the other [`IrError`]
    /// variants when the description references undefined or inconsistent entities.
    pub fn from_json(text: &str) -> Result<Self, IrError> {
        let desc: FunctionDesc = serde_json::from_str(text)?;
        desc.build()
    }

    /// Returns the function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the outermost loops in program order.
    pub fn roots(&self) -> &[LoopId] {
        &self.roots
    }

    /// Iterates over every loop id in creation order.
    pub fn loops(&self) -> impl Iterator<Item = LoopId> + '_ {
        (0..self.loops.len()).map(LoopId::new)
    }

    /// Returns the number of loops in the function.
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Returns `true` if `l` is a loop of this function.
    pub fn has_loop(&self, l: LoopId) -> bool {
        l.index() < self.loops.len()
    }

    /// Returns the data of loop `l`.
    pub fn loop_data(&self, l: LoopId) -> &LoopData {
        &self.loops[l.index()]
    }

    /// Returns the loops directly nested in `l`.
    pub fn children(&self, l: LoopId) -> &[LoopId] {
        &self.loop_data(l).children
    }

    /// Returns `true` if `l` has no nested loops.
    pub fn is_innermost(&self, l: LoopId) -> bool {
        self.children(l).is_empty()
    }

    /// Returns the member blocks of `l`, including nested loops' blocks.
    pub fn blocks_of(&self, l: LoopId) -> &[BlockId] {
        &self.loop_data(l).blocks
    }

    /// Returns the header block of `l`.
    pub fn header(&self, l: LoopId) -> BlockId {
        self.loop_data(l).header
    }

    /// Returns the latch block of `l`.
    pub fn latch(&self, l: LoopId) -> BlockId {
        self.loop_data(l).latch
    }

    /// Returns the single exiting block of `l`, or `None` if it has several.
    pub fn exiting_block(&self, l: LoopId) -> Option<BlockId> {
        self.loop_data(l).exiting
    }

    /// Returns the canonical induction variable of `l`, if any.
    pub fn induction_variable(&self, l: LoopId) -> Option<ValueId> {
        self.loop_data(l).induction
    }

    /// Returns the constant exit bound of `l`, if known.
    pub fn exit_bound(&self, l: LoopId) -> Option<i64> {
        self.loop_data(l).exit_bound
    }

    /// Returns `true` if block `b` belongs to loop `l` (directly or through nesting).
    pub fn contains(&self, l: LoopId, b: BlockId) -> bool {
        self.blocks_of(l).contains(&b)
    }

    /// Returns the name of loop `l`, which is its header's name.
    pub fn loop_name(&self, l: LoopId) -> &str {
        &self.block(self.header(l)).name
    }

    /// Returns block `b`.
    pub fn block(&self, b: BlockId) -> &BlockData {
        &self.blocks[b.index()]
    }

    /// Returns the number of blocks in the function.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if `b` holds nothing but an unconditional jump.
    pub fn is_structurally_empty(&self, b: BlockId) -> bool {
        self.block(b).is_structurally_empty()
    }

    /// Returns value `v`.
    pub fn value(&self, v: ValueId) -> &ValueData {
        &self.values[v.index()]
    }

    /// Returns the kind of value `v`.
    pub fn value_kind(&self, v: ValueId) -> &ValueKind {
        &self.value(v).kind
    }

    /// Returns the operands of `v` if it is a memory addressing expression.
    pub fn address_operands(&self, v: ValueId) -> Option<&[ValueId]> {
        match self.value_kind(v) {
            ValueKind::Address { operands } => Some(operands),
            _ => None,
        }
    }

    /// Finds a block by name.
    pub fn find_block(&self, name: &str) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|b| b.name == name)
            .map(BlockId::new)
    }

    /// Finds the loop whose header is named `name`.
    pub fn find_loop(&self, name: &str) -> Option<LoopId> {
        let header = self.find_block(name)?;
        self.loops().find(|&l| self.header(l) == header)
    }

    /// Finds a named (non-constant) value.
    pub fn find_value(&self, name: &str) -> Option<ValueId> {
        self.values
            .iter()
            .position(|v| v.name == name && !matches!(v.kind, ValueKind::Const(_)))
            .map(ValueId::new)
    }

    /// Renders an operand reference: constants as literals, symbols as `@name`,
    /// everything else as `%name`.
    pub fn operand_ref(&self, v: ValueId) -> String {
        let data = self.value(v);
        match data.kind {
            ValueKind::Const(c) => c.to_string(),
            ValueKind::Symbol => format!("@{}", data.name),
            _ => format!("%{}", data.name),
        }
    }

    /// Renders value `v` as a one-line definition, e.g.
    /// `%arrayidx = address @c, 0, %i, %j`.
    pub fn describe_value(&self, v: ValueId) -> String {
        let data = self.value(v);
        let mut out = self.operand_ref(v);
        match &data.kind {
            ValueKind::Const(_) | ValueKind::Symbol => return out,
            ValueKind::Induction {
                loop_id,
                start,
                step,
            } => {
                let _ = write!(
                    out,
                    " = induction [start {start}, step {step}] in {}",
                    self.loop_name(*loop_id)
                );
                return out;
            }
            ValueKind::Phi => out.push_str(" = phi"),
            ValueKind::Opaque => out.push_str(" = opaque"),
            ValueKind::Binary { op, .. } => {
                let _ = write!(out, " = {}", op.mnemonic());
            }
            ValueKind::Address { .. } => out.push_str(" = address"),
            ValueKind::Load { .. } => out.push_str(" = load"),
        }
        let operands: Vec<String> = data
            .kind
            .operands()
            .iter()
            .map(|&o| self.operand_ref(o))
            .collect();
        if !operands.is_empty() {
            out.push(' ');
            out.push_str(&operands.join(", "));
        }
        out
    }
}
