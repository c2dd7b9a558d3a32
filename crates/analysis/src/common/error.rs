//! Error and rejection definitions.
//!
//! This module defines the failure types of the crate. It provides:
//! 1. **IR Errors:** Problems found while building or decoding a function description.
//! 2. **Config Errors:** Problems reading or parsing an analysis configuration.
//! 3. **Nest Rejections:** Why a loop nest was refused by the cost model. These are
//!    recorded and logged, never returned as errors: a rejected nest reports the
//!    sentinel cost for each of its loops.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::ids::{BlockId, LoopId, ValueId};

/// Errors raised while constructing or decoding a [`Function`](crate::ir::Function).
#[derive(Debug, Error)]
pub enum IrError {
    /// A block id does not refer to a block of the function.
    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    /// A loop id does not refer to a loop of the function.
    #[error("unknown loop {0}")]
    UnknownLoop(LoopId),

    /// A value id does not refer to a value of the function.
    #[error("unknown value {0}")]
    UnknownValue(ValueId),

    /// A name used in a textual description was never defined.
    #[error("undefined {kind} `{name}`")]
    Undefined {
        /// What kind of entity was looked up (block, loop, value).
        kind: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// The same name was defined twice.
    #[error("duplicate {kind} `{name}`")]
    Duplicate {
        /// What kind of entity was redefined.
        kind: &'static str,
        /// The redefined name.
        name: String,
    },

    /// An addressing expression was declared without operands.
    #[error("address `{0}` has no operands")]
    EmptyAddress(String),

    /// A loop's member blocks do not include its header, latch, or exiting block.
    #[error("loop headed by `{loop_name}` does not contain its {role} block")]
    MissingLoopBlock {
        /// Name of the loop's header block.
        loop_name: String,
        /// Which block is missing: `"header"`, `"latch"`, or `"exiting"`.
        role: &'static str,
    },

    /// A child loop owns a block its parent does not.
    #[error("loop `{child}` is not contained in its parent `{parent}`")]
    NotNested {
        /// Header name of the child loop.
        child: String,
        /// Header name of the parent loop.
        parent: String,
    },

    /// A block heads more than one loop.
    #[error("block `{0}` is already the header of a loop")]
    HeaderReused(String),

    /// The JSON description could not be parsed.
    #[error("malformed function description: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading a [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The configuration text is not valid.
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reasons the cost model refuses a loop nest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum NestRejection {
    /// The nest has no loops.
    #[error("loop nest is empty")]
    Empty,

    /// The nest names a loop the function does not have.
    #[error("{0} is not a loop of this function")]
    UnknownLoop(LoopId),

    /// The loops do not form a perfect nest.
    #[error("loops do not form a perfect nest")]
    NotPerfect,

    /// The innermost body is not exactly one non-trivial basic block.
    #[error("innermost loop {0} body is not a single basic block")]
    NoSingleBody(LoopId),
}
