use super::access::{AccessKey, AccessKind};
use super::strength::BarrierStrength;
use crate::block::BlockId;
use crate::values::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an access ended up with its strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ElisionReason {
    FreshAllocation { allocation: NodeId },
    Dominated { by: Vec<NodeId> },
    /// Read half covered by a dominating load, write half kept.
    PartiallyDominated { by: Vec<NodeId> },
    /// A dominating fact exists but is weaker than this access needs.
    InsufficientFact { by: Vec<NodeId> },
    NoDominatingFact,
    UnknownIndex,
    Unreachable,
    NotReference,
}

impl fmt::Display for ElisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn nodes(list: &[NodeId]) -> String {
            list.iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            ElisionReason::FreshAllocation { allocation } => {
                write!(f, "fresh allocation {}", allocation)
            }
            ElisionReason::Dominated { by } => write!(f, "dominated by {}", nodes(by)),
            ElisionReason::PartiallyDominated { by } => {
                write!(f, "read side dominated by {}", nodes(by))
            }
            ElisionReason::InsufficientFact { by } => {
                write!(f, "only weaker fact from {}", nodes(by))
            }
            ElisionReason::NoDominatingFact => f.write_str("no dominating fact"),
            ElisionReason::UnknownIndex => f.write_str("unknown index"),
            ElisionReason::Unreachable => f.write_str("unreachable"),
            ElisionReason::NotReference => f.write_str("not a reference"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessAnnotation {
    pub node: NodeId,
    pub block: BlockId,
    pub kind: AccessKind,
    pub key: AccessKey,
    pub strength: BarrierStrength,
    pub reason: ElisionReason,
}

/// Per-strength tally for one access kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthCounts {
    pub none: usize,
    pub elided: usize,
    pub weak: usize,
    pub strong: usize,
}

impl StrengthCounts {
    pub fn get(&self, strength: BarrierStrength) -> usize {
        match strength {
            BarrierStrength::None => self.none,
            BarrierStrength::Elided => self.elided,
            BarrierStrength::Weak => self.weak,
            BarrierStrength::Strong => self.strong,
        }
    }

    fn bump(&mut self, strength: BarrierStrength) {
        match strength {
            BarrierStrength::None => self.none += 1,
            BarrierStrength::Elided => self.elided += 1,
            BarrierStrength::Weak => self.weak += 1,
            BarrierStrength::Strong => self.strong += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.none + self.elided + self.weak + self.strong
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierCounts {
    pub loads: StrengthCounts,
    pub stores: StrengthCounts,
    pub atomics: StrengthCounts,
}

impl BarrierCounts {
    pub fn of(&self, kind: AccessKind) -> &StrengthCounts {
        match kind {
            AccessKind::Load => &self.loads,
            AccessKind::Store => &self.stores,
            AccessKind::Atomic => &self.atomics,
        }
    }

    pub fn get(&self, kind: AccessKind, strength: BarrierStrength) -> usize {
        self.of(kind).get(strength)
    }

    /// Barriers code generation still has to emit.
    pub fn emitted(&self) -> usize {
        [&self.loads, &self.stores, &self.atomics]
            .iter()
            .map(|c| c.weak + c.strong)
            .sum()
    }

    pub fn elided(&self) -> usize {
        self.loads.elided + self.stores.elided + self.atomics.elided
    }

    pub fn add(&mut self, other: &BarrierCounts) {
        for (mine, theirs) in [
            (&mut self.loads, &other.loads),
            (&mut self.stores, &other.stores),
            (&mut self.atomics, &other.atomics),
        ] {
            mine.none += theirs.none;
            mine.elided += theirs.elided;
            mine.weak += theirs.weak;
            mine.strong += theirs.strong;
        }
    }
}

/// Barrier decision for every access of one method, ordered by node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierAnnotation {
    pub method: String,
    #[serde(with = "indexmap::map::serde_seq")]
    entries: IndexMap<NodeId, AccessAnnotation>,
}

impl BarrierAnnotation {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, annotation: AccessAnnotation) {
        self.entries.insert(annotation.node, annotation);
    }

    pub(crate) fn sort(&mut self) {
        self.entries.sort_keys();
    }

    pub fn get(&self, node: NodeId) -> Option<&AccessAnnotation> {
        self.entries.get(&node)
    }

    pub fn strength_of(&self, node: NodeId) -> Option<BarrierStrength> {
        self.entries.get(&node).map(|a| a.strength)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessAnnotation> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> BarrierCounts {
        let mut counts = BarrierCounts::default();
        for entry in self.entries.values() {
            let bucket = match entry.kind {
                AccessKind::Load => &mut counts.loads,
                AccessKind::Store => &mut counts.stores,
                AccessKind::Atomic => &mut counts.atomics,
            };
            bucket.bump(entry.strength);
        }
        counts
    }

    /// How many accesses of `kind` got `strength`.
    pub fn count(&self, kind: AccessKind, strength: BarrierStrength) -> usize {
        self.entries
            .values()
            .filter(|a| a.kind == kind && a.strength == strength)
            .count()
    }
}
