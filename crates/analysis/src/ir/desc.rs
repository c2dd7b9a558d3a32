//! JSON description of a function.
//!
//! A function is described by its symbols, its blocks (instructions referring to
//! values and blocks by name), and its loops (referring to blocks by name, loops
//! by header name). Loops must be listed after their parent.
//!
//! ```
//! use loopcost_core::ir::Function;
//!
//! let json = r#"{
//!     "name": "sum",
//!     "symbols": ["a"],
//!     "blocks": [
//!         { "name": "entry", "insts": [ { "op": "jump", "target": "for.cond" } ] },
//!         { "name": "for.cond", "insts": [
//!             { "op": "induction", "name": "i", "start": 0, "step": 1 },
//!             { "op": "cmp", "name": "cond", "lhs": "i", "rhs": 100 },
//!             { "op": "branch", "then": "for.body", "else": "for.end" } ] },
//!         { "name": "for.body", "insts": [
//!             { "op": "address", "name": "p", "operands": ["a", 0, "i"] },
//!             { "op": "load", "name": "x", "address": "p" },
//!             { "op": "jump", "target": "for.inc" } ] },
//!         { "name": "for.inc", "insts": [
//!             { "op": "add", "name": "i.next", "lhs": "i", "rhs": 1 },
//!             { "op": "jump", "target": "for.cond" } ] },
//!         { "name": "for.end", "insts": [ { "op": "return" } ] }
//!     ],
//!     "loops": [
//!         { "header": "for.cond", "latch": "for.inc",
//!           "blocks": ["for.cond", "for.body", "for.inc"], "bound": 100 }
//!     ]
//! }"#;
//!
//! let func = Function::from_json(json).unwrap();
//! assert_eq!(func.roots().len(), 1);
//! assert_eq!(func.loop_name(func.roots()[0]), "for.cond");
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use super::builder::{FunctionBuilder, LoopSpec};
use super::{BinOp, Function};
use crate::common::{BlockId, IrError, LoopId, ValueId};

/// Top-level function description.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionDesc {
    /// Function name.
    pub name: String,
    /// Parameters and globals that instructions may reference.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Blocks in layout order.
    pub blocks: Vec<BlockDesc>,
    /// Loops, parents before children.
    #[serde(default)]
    pub loops: Vec<LoopDesc>,
}

/// A basic block description.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDesc {
    /// Block label.
    pub name: String,
    /// Instructions in program order.
    #[serde(default)]
    pub insts: Vec<InstDesc>,
}

/// A loop description.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoopDesc {
    /// Header block; also names the loop.
    pub header: String,
    /// Latch block.
    pub latch: String,
    /// Exiting block. Defaults to the header.
    #[serde(default)]
    pub exiting: Option<String>,
    /// Set when the loop exits from more than one block.
    #[serde(default)]
    pub multiple_exits: bool,
    /// Member blocks, nested loops' blocks included.
    pub blocks: Vec<String>,
    /// Header of the enclosing loop.
    #[serde(default)]
    pub parent: Option<String>,
    /// Constant exit bound of the induction variable.
    #[serde(default)]
    pub bound: Option<i64>,
}

/// An operand: an integer literal or the name of a value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    /// Integer constant.
    Const(i64),
    /// Named value or symbol.
    Name(String),
}

const fn default_step() -> i64 {
    1
}

/// An instruction description, tagged by `op`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InstDesc {
    /// Canonical induction variable of the loop headed by this block.
    Induction {
        /// Value name.
        name: String,
        /// Initial value.
        #[serde(default)]
        start: i64,
        /// Per-iteration step.
        #[serde(default = "default_step")]
        step: i64,
    },
    /// Any other phi.
    Phi {
        /// Value name.
        name: String,
    },
    /// Addition.
    Add {
        /// Value name.
        name: String,
        /// Left operand.
        lhs: Operand,
        /// Right operand.
        rhs: Operand,
    },
    /// Subtraction.
    Sub {
        /// Value name.
        name: String,
        /// Left operand.
        lhs: Operand,
        /// Right operand.
        rhs: Operand,
    },
    /// Multiplication.
    Mul {
        /// Value name.
        name: String,
        /// Left operand.
        lhs: Operand,
        /// Right operand.
        rhs: Operand,
    },
    /// Comparison.
    Cmp {
        /// Value name.
        name: String,
        /// Left operand.
        lhs: Operand,
        /// Right operand.
        rhs: Operand,
    },
    /// Memory addressing expression.
    Address {
        /// Value name.
        name: String,
        /// Base followed by indices.
        operands: Vec<Operand>,
    },
    /// Load through an address.
    Load {
        /// Value name.
        name: String,
        /// Address value.
        address: String,
    },
    /// Store through an address.
    Store {
        /// Address value.
        address: String,
        /// Stored value.
        value: Operand,
    },
    /// Call or other value the analyzer cannot see through.
    Call {
        /// Value name.
        name: String,
    },
    /// Unconditional branch.
    Jump {
        /// Target block.
        target: String,
    },
    /// Conditional branch.
    Branch {
        /// Target when taken.
        then: String,
        /// Fallthrough target.
        #[serde(rename = "else")]
        otherwise: String,
    },
    /// Return.
    Return,
}

/// Name tables used while lowering a description.
struct Scope {
    blocks: HashMap<String, BlockId>,
    loops: HashMap<String, LoopId>,
    values: HashMap<String, ValueId>,
}

impl Scope {
    fn block(&self, name: &str) -> Result<BlockId, IrError> {
        self.blocks.get(name).copied().ok_or_else(|| IrError::Undefined {
            kind: "block",
            name: name.to_string(),
        })
    }

    fn loop_id(&self, name: &str) -> Result<LoopId, IrError> {
        self.loops.get(name).copied().ok_or_else(|| IrError::Undefined {
            kind: "loop",
            name: name.to_string(),
        })
    }

    fn value(&self, name: &str) -> Result<ValueId, IrError> {
        self.values.get(name).copied().ok_or_else(|| IrError::Undefined {
            kind: "value",
            name: name.to_string(),
        })
    }

    fn operand(&self, builder: &mut FunctionBuilder, operand: &Operand) -> Result<ValueId, IrError> {
        match operand {
            Operand::Const(c) => Ok(builder.constant(*c)),
            Operand::Name(name) => self.value(name),
        }
    }

    fn bind(&mut self, name: &str, id: ValueId) -> Result<(), IrError> {
        if self.values.insert(name.to_string(), id).is_some() {
            return Err(IrError::Duplicate {
                kind: "value",
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl FunctionDesc {
    /// Lowers the description into a validated [`Function`].
    ///
    /// # Errors
    ///
    /// Returns an [`IrError`] for undefined or duplicate names and for any
    /// inconsistency [`FunctionBuilder::finish`] detects.
    pub fn build(&self) -> Result<Function, IrError> {
        let mut builder = FunctionBuilder::new(self.name.clone());
        let mut scope = Scope {
            blocks: HashMap::new(),
            loops: HashMap::new(),
            values: HashMap::new(),
        };

        for block in &self.blocks {
            let id = builder.block(block.name.clone());
            if scope.blocks.insert(block.name.clone(), id).is_some() {
                return Err(IrError::Duplicate {
                    kind: "block",
                    name: block.name.clone(),
                });
            }
        }

        let mut headed_by = HashMap::new();
        for desc in &self.loops {
            let header = scope.block(&desc.header)?;
            let latch = scope.block(&desc.latch)?;
            let exiting = if desc.multiple_exits {
                None
            } else {
                Some(desc.exiting.as_deref().map_or(Ok(header), |b| scope.block(b))?)
            };
            let blocks = desc
                .blocks
                .iter()
                .map(|b| scope.block(b))
                .collect::<Result<Vec<_>, _>>()?;
            let mut spec = LoopSpec::new(header, latch, blocks).exiting(exiting);
            if let Some(parent) = &desc.parent {
                spec = spec.within(scope.loop_id(parent)?);
            }
            let id = builder.add_loop(spec);
            if let Some(bound) = desc.bound {
                builder.set_exit_bound(id, bound);
            }
            if scope.loops.insert(desc.header.clone(), id).is_some() {
                return Err(IrError::HeaderReused(desc.header.clone()));
            }
            let _ = headed_by.insert(header, id);
        }

        for symbol in &self.symbols {
            let id = builder.symbol(symbol.clone());
            scope.bind(symbol, id)?;
        }

        for block in &self.blocks {
            let bb = scope.block(&block.name)?;
            for inst in &block.insts {
                lower_inst(&mut builder, &mut scope, &headed_by, (bb, &block.name), inst)?;
            }
        }

        builder.finish()
    }
}

fn lower_binary(
    builder: &mut FunctionBuilder,
    scope: &mut Scope,
    bb: BlockId,
    name: &str,
    op: BinOp,
    (lhs, rhs): (&Operand, &Operand),
) -> Result<(), IrError> {
    let lhs = scope.operand(builder, lhs)?;
    let rhs = scope.operand(builder, rhs)?;
    let id = builder.binary(bb, name, op, lhs, rhs);
    scope.bind(name, id)
}

fn lower_inst(
    builder: &mut FunctionBuilder,
    scope: &mut Scope,
    headed_by: &HashMap<BlockId, LoopId>,
    (bb, block_name): (BlockId, &str),
    inst: &InstDesc,
) -> Result<(), IrError> {
    match inst {
        InstDesc::Induction { name, start, step } => {
            let loop_id = headed_by.get(&bb).copied().ok_or_else(|| IrError::Undefined {
                kind: "loop headed by block",
                name: block_name.to_string(),
            })?;
            let id = builder.induction(loop_id, name.clone(), *start, *step);
            scope.bind(name, id)
        }
        InstDesc::Phi { name } => {
            let id = builder.phi(bb, name.clone());
            scope.bind(name, id)
        }
        InstDesc::Add { name, lhs, rhs } => {
            lower_binary(builder, scope, bb, name, BinOp::Add, (lhs, rhs))
        }
        InstDesc::Sub { name, lhs, rhs } => {
            lower_binary(builder, scope, bb, name, BinOp::Sub, (lhs, rhs))
        }
        InstDesc::Mul { name, lhs, rhs } => {
            lower_binary(builder, scope, bb, name, BinOp::Mul, (lhs, rhs))
        }
        InstDesc::Cmp { name, lhs, rhs } => {
            lower_binary(builder, scope, bb, name, BinOp::Cmp, (lhs, rhs))
        }
        InstDesc::Address { name, operands } => {
            let operands = operands
                .iter()
                .map(|o| scope.operand(builder, o))
                .collect::<Result<Vec<_>, _>>()?;
            let id = builder.address(bb, name.clone(), &operands);
            scope.bind(name, id)
        }
        InstDesc::Load { name, address } => {
            let address = scope.value(address)?;
            let id = builder.load(bb, name.clone(), address);
            scope.bind(name, id)
        }
        InstDesc::Store { address, value } => {
            let address = scope.value(address)?;
            let value = scope.operand(builder, value)?;
            builder.store(bb, address, value);
            Ok(())
        }
        InstDesc::Call { name } => {
            let id = builder.opaque(bb, name.clone());
            scope.bind(name, id)
        }
        InstDesc::Jump { target } => {
            builder.jump(bb, scope.block(target)?);
            Ok(())
        }
        InstDesc::Branch { then, otherwise } => {
            builder.branch(bb, scope.block(then)?, scope.block(otherwise)?);
            Ok(())
        }
        InstDesc::Return => {
            builder.ret(bb);
            Ok(())
        }
    }
}

