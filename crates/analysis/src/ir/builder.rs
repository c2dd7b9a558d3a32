//! Function builder.
//!
//! Builds a [`Function`] block by block. Builder methods never fail; ill-formed
//! input (dangling ids, empty addresses, loops that do not contain their own
//! header) is reported by [`FunctionBuilder::finish`].

use std::collections::{HashMap, HashSet};

use super::{BinOp, BlockData, Function, Inst, LoopData, ValueData, ValueKind};
use crate::common::{BlockId, IrError, LoopId, ValueId};

/// Shape of a loop handed to [`FunctionBuilder::add_loop`].
#[derive(Clone, Debug)]
pub struct LoopSpec {
    /// Header block.
    pub header: BlockId,
    /// Latch block.
    pub latch: BlockId,
    /// Single exiting block, or `None` when the loop exits from several blocks.
    pub exiting: Option<BlockId>,
    /// Every member block, nested loops' blocks included.
    pub blocks: Vec<BlockId>,
    /// Enclosing loop.
    pub parent: Option<LoopId>,
}

impl LoopSpec {
    /// A loop that exits from its header (not rotated).
    pub fn new(header: BlockId, latch: BlockId, blocks: Vec<BlockId>) -> Self {
        Self {
            header,
            latch,
            exiting: Some(header),
            blocks,
            parent: None,
        }
    }

    /// Sets the enclosing loop.
    #[must_use]
    pub const fn within(mut self, parent: LoopId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the exiting block.
    #[must_use]
    pub const fn exiting(mut self, exiting: Option<BlockId>) -> Self {
        self.exiting = exiting;
        self
    }
}

/// Incremental builder for [`Function`].
#[derive(Debug)]
pub struct FunctionBuilder {
    func: Function,
    constants: HashMap<i64, ValueId>,
    error: Option<IrError>,
}

impl FunctionBuilder {
    /// Starts an empty function named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            func: Function {
                name: name.into(),
                ..Function::default()
            },
            constants: HashMap::new(),
            error: None,
        }
    }

    fn fail(&mut self, err: IrError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn define(&mut self, name: String, kind: ValueKind) -> ValueId {
        let id = ValueId::new(self.func.values.len());
        self.func.values.push(ValueData { name, kind });
        id
    }

    fn place(&mut self, block: BlockId, inst: Inst) {
        match self.func.blocks.get_mut(block.index()) {
            Some(data) => data.insts.push(inst),
            None => self.fail(IrError::UnknownBlock(block)),
        }
    }

    fn define_in(&mut self, block: BlockId, name: impl Into<String>, kind: ValueKind) -> ValueId {
        let id = self.define(name.into(), kind);
        self.place(block, Inst::Value(id));
        id
    }

    /// Appends an empty block.
    pub fn block(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId::new(self.func.blocks.len());
        self.func.blocks.push(BlockData {
            name: name.into(),
            insts: Vec::new(),
        });
        id
    }

    /// Returns the (uniqued) constant `value`.
    ///
    /// Constants are not placed in any block; equal constants share one id so
    /// addressing expressions can be compared by operand identity.
    pub fn constant(&mut self, value: i64) -> ValueId {
        if let Some(&id) = self.constants.get(&value) {
            return id;
        }
        let id = self.define(value.to_string(), ValueKind::Const(value));
        let _ = self.constants.insert(value, id);
        id
    }

    /// Declares a parameter or global symbol.
    pub fn symbol(&mut self, name: impl Into<String>) -> ValueId {
        self.define(name.into(), ValueKind::Symbol)
    }

    /// Places a phi that is not a canonical induction variable.
    pub fn phi(&mut self, block: BlockId, name: impl Into<String>) -> ValueId {
        self.define_in(block, name, ValueKind::Phi)
    }

    /// Places a value the affine analyzer cannot see through, such as a call result.
    pub fn opaque(&mut self, block: BlockId, name: impl Into<String>) -> ValueId {
        self.define_in(block, name, ValueKind::Opaque)
    }

    /// Places a binary operation.
    pub fn binary(
        &mut self,
        block: BlockId,
        name: impl Into<String>,
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
    ) -> ValueId {
        self.define_in(
            block,
            name,
            ValueKind::Binary {
                op,
                operands: [lhs, rhs],
            },
        )
    }

    /// Places a memory addressing expression (base followed by indices).
    pub fn address(
        &mut self,
        block: BlockId,
        name: impl Into<String>,
        operands: &[ValueId],
    ) -> ValueId {
        self.define_in(
            block,
            name,
            ValueKind::Address {
                operands: operands.to_vec(),
            },
        )
    }

    /// Places a load through `address`.
    pub fn load(&mut self, block: BlockId, name: impl Into<String>, address: ValueId) -> ValueId {
        self.define_in(block, name, ValueKind::Load { address })
    }

    /// Places a store of `value` through `address`.
    pub fn store(&mut self, block: BlockId, address: ValueId, value: ValueId) {
        self.place(block, Inst::Store { address, value });
    }

    /// Terminates `block` with an unconditional jump.
    pub fn jump(&mut self, block: BlockId, target: BlockId) {
        self.place(block, Inst::Jump(target));
    }

    /// Terminates `block` with a conditional branch.
    pub fn branch(&mut self, block: BlockId, then: BlockId, otherwise: BlockId) {
        self.place(block, Inst::Branch { then, otherwise });
    }

    /// Terminates `block` with a return.
    pub fn ret(&mut self, block: BlockId) {
        self.place(block, Inst::Return);
    }

    /// Registers a loop. Children are recorded on their parent in registration order.
    pub fn add_loop(&mut self, spec: LoopSpec) -> LoopId {
        let id = LoopId::new(self.func.loops.len());
        match spec.parent {
            Some(parent) => match self.func.loops.get_mut(parent.index()) {
                Some(data) => data.children.push(id),
                None => self.fail(IrError::UnknownLoop(parent)),
            },
            None => self.func.roots.push(id),
        }
        self.func.loops.push(LoopData {
            header: spec.header,
            latch: spec.latch,
            exiting: spec.exiting,
            blocks: spec.blocks,
            parent: spec.parent,
            children: Vec::new(),
            induction: None,
            exit_bound: None,
        });
        id
    }

    /// Places the canonical induction variable of `loop_id` in its header.
    pub fn induction(
        &mut self,
        loop_id: LoopId,
        name: impl Into<String>,
        start: i64,
        step: i64,
    ) -> ValueId {
        let Some(header) = self.func.loops.get(loop_id.index()).map(|l| l.header) else {
            self.fail(IrError::UnknownLoop(loop_id));
            return self.define(name.into(), ValueKind::Phi);
        };
        let id = self.define_in(
            header,
            name,
            ValueKind::Induction {
                loop_id,
                start,
                step,
            },
        );
        self.func.loops[loop_id.index()].induction = Some(id);
        id
    }

    /// Records the constant the header test of `loop_id` compares against.
    pub fn set_exit_bound(&mut self, loop_id: LoopId, bound: i64) {
        match self.func.loops.get_mut(loop_id.index()) {
            Some(data) => data.exit_bound = Some(bound),
            None => self.fail(IrError::UnknownLoop(loop_id)),
        }
    }

    /// Validates and returns the function.
    ///
    /// # Errors
    ///
    /// Returns the first problem recorded while building, or the first
    /// inconsistency found in the finished IR.
    pub fn finish(mut self) -> Result<Function, IrError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        validate(&self.func)?;
        Ok(self.func)
    }
}

fn validate(func: &Function) -> Result<(), IrError> {
    let block_ok = |b: BlockId| {
        if b.index() < func.blocks.len() {
            Ok(())
        } else {
            Err(IrError::UnknownBlock(b))
        }
    };
    let value_ok = |v: ValueId| {
        if v.index() < func.values.len() {
            Ok(())
        } else {
            Err(IrError::UnknownValue(v))
        }
    };

    let mut names = HashSet::new();
    for block in &func.blocks {
        if !names.insert(block.name.as_str()) {
            return Err(IrError::Duplicate {
                kind: "block",
                name: block.name.clone(),
            });
        }
        for inst in &block.insts {
            match *inst {
                Inst::Value(v) => value_ok(v)?,
                Inst::Store { address, value } => {
                    value_ok(address)?;
                    value_ok(value)?;
                }
                Inst::Jump(target) => block_ok(target)?,
                Inst::Branch { then, otherwise } => {
                    block_ok(then)?;
                    block_ok(otherwise)?;
                }
                Inst::Return => {}
            }
        }
    }

    let mut names = HashSet::new();
    for value in &func.values {
        if matches!(value.kind, ValueKind::Const(_)) {
            continue;
        }
        if !names.insert(value.name.as_str()) {
            return Err(IrError::Duplicate {
                kind: "value",
                name: value.name.clone(),
            });
        }
        if matches!(&value.kind, ValueKind::Address { operands } if operands.is_empty()) {
            return Err(IrError::EmptyAddress(value.name.clone()));
        }
        for &operand in value.kind.operands() {
            value_ok(operand)?;
        }
    }

    let mut headers = HashSet::new();
    for l in func.loops() {
        let data = func.loop_data(l);
        block_ok(data.header)?;
        block_ok(data.latch)?;
        for &b in &data.blocks {
            block_ok(b)?;
        }
        let name = func.loop_name(l).to_string();
        if !headers.insert(data.header) {
            return Err(IrError::HeaderReused(name));
        }
        for (block, role) in [(data.header, "header"), (data.latch, "latch")] {
            if !data.blocks.contains(&block) {
                return Err(IrError::MissingLoopBlock {
                    loop_name: name,
                    role,
                });
            }
        }
        if data.exiting.is_some_and(|b| !data.blocks.contains(&b)) {
            return Err(IrError::MissingLoopBlock {
                loop_name: name,
                role: "exiting",
            });
        }
        if let Some(parent) = data.parent {
            let parent_blocks = func.blocks_of(parent);
            if data.blocks.iter().any(|b| !parent_blocks.contains(b)) {
                return Err(IrError::NotNested {
                    child: name,
                    parent: func.loop_name(parent).to_string(),
                });
            }
        }
    }
    Ok(())
}
