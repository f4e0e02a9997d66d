//! Publication points of freshly allocated objects.
//!
//! An allocation stays unpublished until its reference is stored into the
//! heap or handed to a callee, directly or through a phi. This is only the
//! list of those points, enough for the fresh-object barrier rule.

use super::def_use::DefUseChains;
use crate::instructions::Instruction;
use crate::method::MethodBody;
use crate::values::{NodeId, ValueId};
use indexmap::IndexMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct EscapeAnalysis {
    publications: IndexMap<ValueId, HashSet<NodeId>>,
}

impl EscapeAnalysis {
    pub fn build(body: &MethodBody, def_use: &DefUseChains) -> Self {
        let mut publications = IndexMap::new();

        for node in body.nodes() {
            let Instruction::Allocate { result, .. } = &node.inst else {
                continue;
            };

            let aliases = Self::phi_closure(body, def_use, *result);
            let mut points = HashSet::new();
            for alias in &aliases {
                for site in def_use.uses(*alias) {
                    let Some(use_node) = site.node.and_then(|id| body.node(id)) else {
                        continue;
                    };
                    if use_node.inst.published_values().contains(alias) {
                        points.insert(use_node.id);
                    }
                }
            }

            publications.insert(*result, points);
        }

        Self { publications }
    }

    /// The allocation result plus every phi it flows into, transitively.
    fn phi_closure(body: &MethodBody, def_use: &DefUseChains, root: ValueId) -> HashSet<ValueId> {
        let mut closure = HashSet::from([root]);
        let mut worklist = vec![root];

        while let Some(value) = worklist.pop() {
            for site in def_use.uses(value) {
                let Some(node) = site.node.and_then(|id| body.node(id)) else {
                    continue;
                };
                if let Instruction::Phi { result, .. } = &node.inst {
                    if closure.insert(*result) {
                        worklist.push(*result);
                    }
                }
            }
        }

        closure
    }

    pub fn publication_points(&self, allocation: ValueId) -> Option<&HashSet<NodeId>> {
        self.publications.get(&allocation)
    }

    pub fn is_publication(&self, allocation: ValueId, node: NodeId) -> bool {
        self.publications
            .get(&allocation)
            .map_or(false, |points| points.contains(&node))
    }
}
