use super::strength::BarrierStrength;
use crate::instructions::{FieldSelector, Instruction};
use crate::method::Node;
use crate::types::Type;
use crate::values::{NodeId, ValueId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the object an access goes through. Two accesses share an
/// identity only when they use the same SSA value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectIdentity(pub ValueId);

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessKey {
    pub object: ObjectIdentity,
    pub selector: FieldSelector,
}

impl AccessKey {
    pub fn new(object: ValueId, selector: FieldSelector) -> Self {
        Self {
            object: ObjectIdentity(object),
            selector,
        }
    }

    /// Keys with a computed index never match anything, themselves included.
    pub fn is_trackable(&self) -> bool {
        self.selector.is_known()
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.selector {
            FieldSelector::Offset(offset) => write!(f, "{}+{}", self.object, offset),
            FieldSelector::Element(index) => write!(f, "{}[{}]", self.object, index),
            FieldSelector::UnknownIndex(index) => write!(f, "{}[{}]", self.object, index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Load,
    Store,
    Atomic,
}

impl AccessKind {
    pub const ALL: [AccessKind; 3] = [AccessKind::Load, AccessKind::Store, AccessKind::Atomic];

    /// Strength of the invariant an executed access of this kind leaves
    /// behind for later accesses to the same key.
    pub fn establishes(&self) -> BarrierStrength {
        match self {
            AccessKind::Load => BarrierStrength::Weak,
            AccessKind::Store | AccessKind::Atomic => BarrierStrength::Strong,
        }
    }

    /// Fact strength needed to drop this access's barrier entirely.
    pub fn required(&self) -> BarrierStrength {
        match self {
            AccessKind::Load => BarrierStrength::Weak,
            AccessKind::Store | AccessKind::Atomic => BarrierStrength::Strong,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AccessKind::Load => "load",
            AccessKind::Store => "store",
            AccessKind::Atomic => "atomic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A memory access node, seen through its barrier-relevant parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub node: NodeId,
    pub kind: AccessKind,
    pub key: AccessKey,
    pub ty: Type,
}

impl Access {
    pub fn from_node(node: &Node) -> Option<Self> {
        let (kind, object, selector, ty) = match &node.inst {
            Instruction::Load {
                object,
                selector,
                ty,
                ..
            } => (AccessKind::Load, object, selector, ty),
            Instruction::Store {
                object,
                selector,
                ty,
                ..
            } => (AccessKind::Store, object, selector, ty),
            Instruction::AtomicExchange {
                object,
                selector,
                ty,
                ..
            } => (AccessKind::Atomic, object, selector, ty),
            _ => return None,
        };

        Some(Self {
            node: node.id,
            kind,
            key: AccessKey::new(*object, *selector),
            ty: *ty,
        })
    }

    pub fn object(&self) -> ValueId {
        self.key.object.0
    }
}
