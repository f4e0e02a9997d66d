//! Barrier strengths, the access catalog, and the elision engine.

pub mod access;
pub mod annotation;
pub mod catalog;
pub mod engine;
pub mod strength;

pub use access::{Access, AccessKey, AccessKind, ObjectIdentity};
pub use annotation::{
    AccessAnnotation, BarrierAnnotation, BarrierCounts, ElisionReason, StrengthCounts,
};
pub use catalog::{AccessCatalog, DominatingFact};
pub use engine::BarrierElisionEngine;
pub use strength::BarrierStrength;
