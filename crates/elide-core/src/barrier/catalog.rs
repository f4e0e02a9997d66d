use super::access::AccessKey;
use super::strength::BarrierStrength;
use crate::block::BlockId;
use crate::values::NodeId;
use indexmap::IndexMap;
use tracing::trace;

/// A barrier invariant known to hold for one key, established by the
/// `definers`. After a merge there is one definer per incoming path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominatingFact {
    pub key: AccessKey,
    pub strength: BarrierStrength,
    pub definers: Vec<NodeId>,
}

/// Facts available at one program point. The engine keeps one catalog per
/// block and threads it through the block's nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessCatalog {
    facts: IndexMap<AccessKey, DominatingFact>,
}

impl AccessCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &AccessKey) -> Option<&DominatingFact> {
        if !key.is_trackable() {
            return None;
        }
        self.facts.get(key)
    }

    /// Replaces any fact for `key` with one anchored at `node`.
    pub fn record(&mut self, key: AccessKey, strength: BarrierStrength, node: NodeId) {
        if !key.is_trackable() || strength < BarrierStrength::Weak {
            return;
        }
        self.facts.insert(
            key,
            DominatingFact {
                key,
                strength,
                definers: vec![node],
            },
        );
    }

    /// Drops every fact. A fresh allocation is tracked through its definition
    /// instead of through the catalog, so nothing here survives a safepoint.
    pub fn invalidate_across_safepoint(&mut self) -> usize {
        let dropped = self.facts.len();
        self.facts.clear();
        dropped
    }

    /// Meet over the catalogs reaching `block`: a key survives only if every
    /// incoming catalog has it, at the weakest incoming strength.
    pub fn merge_at(block: BlockId, incoming: &[&AccessCatalog]) -> AccessCatalog {
        let Some((first, rest)) = incoming.split_first() else {
            return AccessCatalog::new();
        };

        let mut merged = AccessCatalog::new();
        'keys: for (key, fact) in &first.facts {
            let mut strength = fact.strength;
            let mut definers = fact.definers.clone();

            for other in rest {
                let Some(other_fact) = other.facts.get(key) else {
                    continue 'keys;
                };
                strength = strength.min(other_fact.strength);
                definers.extend(other_fact.definers.iter().copied());
            }

            definers.sort_unstable();
            definers.dedup();
            merged.facts.insert(
                *key,
                DominatingFact {
                    key: *key,
                    strength,
                    definers,
                },
            );
        }

        trace!(
            %block,
            incoming = incoming.len(),
            surviving = merged.len(),
            "merged access catalogs"
        );
        merged
    }

    pub fn retain_valid<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&DominatingFact) -> bool,
    {
        let before = self.facts.len();
        self.facts.retain(|_, fact| keep(fact));
        before - self.facts.len()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DominatingFact> {
        self.facts.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::FieldSelector;
    use crate::values::ValueId;

    fn key(offset: i64) -> AccessKey {
        AccessKey::new(ValueId(0), FieldSelector::Offset(offset))
    }

    #[test]
    fn test_record_and_lookup() {
        let mut catalog = AccessCatalog::new();
        catalog.record(key(8), BarrierStrength::Weak, NodeId(1));
        catalog.record(key(8), BarrierStrength::Strong, NodeId(2));

        let fact = catalog.lookup(&key(8)).unwrap();
        assert_eq!(fact.strength, BarrierStrength::Strong);
        assert_eq!(fact.definers, vec![NodeId(2)]);
        assert!(catalog.lookup(&key(16)).is_none());
    }

    #[test]
    fn test_unknown_index_never_recorded() {
        let mut catalog = AccessCatalog::new();
        let unknown = AccessKey::new(ValueId(0), FieldSelector::UnknownIndex(ValueId(3)));
        catalog.record(unknown, BarrierStrength::Strong, NodeId(1));
        assert!(catalog.is_empty());
        assert!(catalog.lookup(&unknown).is_none());
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let mut catalog = AccessCatalog::new();
        catalog.record(key(8), BarrierStrength::Strong, NodeId(1));
        catalog.record(key(16), BarrierStrength::Weak, NodeId(2));
        assert_eq!(catalog.invalidate_across_safepoint(), 2);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_merge_is_a_meet() {
        let mut left = AccessCatalog::new();
        left.record(key(8), BarrierStrength::Strong, NodeId(1));
        left.record(key(16), BarrierStrength::Strong, NodeId(2));
        let mut right = AccessCatalog::new();
        right.record(key(8), BarrierStrength::Weak, NodeId(3));

        let merged = AccessCatalog::merge_at(BlockId(3), &[&left, &right]);
        assert_eq!(merged.len(), 1);
        let fact = merged.lookup(&key(8)).unwrap();
        assert_eq!(fact.strength, BarrierStrength::Weak);
        assert_eq!(fact.definers, vec![NodeId(1), NodeId(3)]);

        assert!(AccessCatalog::merge_at(BlockId(3), &[]).is_empty());
    }

    #[test]
    fn test_retain_valid() {
        let mut catalog = AccessCatalog::new();
        catalog.record(key(8), BarrierStrength::Strong, NodeId(1));
        catalog.record(key(16), BarrierStrength::Strong, NodeId(2));
        let dropped = catalog.retain_valid(|fact| fact.definers.contains(&NodeId(2)));
        assert_eq!(dropped, 1);
        assert!(catalog.lookup(&key(16)).is_some());
    }
}
