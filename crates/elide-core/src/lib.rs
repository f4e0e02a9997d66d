/*! Core IR and GC barrier elision analysis for a JIT compiler.
 *
 * A concurrent, relocating collector needs a barrier on every reference load, store and atomic
 * exchange. Most of them are redundant: an earlier access to the same field, or a fresh allocation,
 * already established the invariant with no safepoint in between. This crate provides the IR, the
 * dominance and safepoint analyses, and the engine that decides which barriers can go.
 */

pub mod analysis;
pub mod barrier;
pub mod block;
pub mod builder;
pub mod config;
pub mod format;
pub mod instructions;
pub mod method;
pub mod module;
pub mod types;
pub mod values;

pub use barrier::{
    AccessKey, AccessKind, BarrierAnnotation, BarrierCounts, BarrierElisionEngine, BarrierStrength,
    ObjectIdentity,
};
pub use block::{BasicBlock, BlockId, Terminator};
pub use builder::{BlockBuilder, MethodBuilder, ModuleBuilder};
pub use config::ElisionConfig;
pub use instructions::{FieldSelector, Instruction};
pub use method::{Method, MethodBody, Node};
pub use module::Module;
pub use types::Type;
pub use values::{NodeId, Operand, ValueId};

use thiserror::Error;

/// Internal invariant failures. Any of these aborts the analysis of the
/// affected method: no partial annotation is ever produced.
#[derive(Error, Debug)]
pub enum IrError {
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),
    #[error("Malformed control flow graph: {0}")]
    MalformedCfg(String),
    #[error("Irreducible control flow: edge {from} -> {to} re-enters a loop {to} does not dominate")]
    IrreducibleCfg { from: BlockId, to: BlockId },
    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
