/*! Barrier elision over one method.
 *
 * Blocks are visited in reverse postorder so every block is seen after all
 * of its dominators. Each block starts from the catalog of its forward
 * predecessors (inherited or met), drops facts that do not reach the block
 * top safepoint-free, and then threads the catalog through its nodes.
 */

use super::access::{Access, AccessKind};
use super::annotation::{AccessAnnotation, BarrierAnnotation, ElisionReason};
use super::catalog::AccessCatalog;
use super::strength::BarrierStrength;
use crate::analysis::{
    ControlFlowGraph, DefUseChains, DominatorTree, EscapeAnalysis, LoopAnalysis, SafepointMap,
};
use crate::block::BlockId;
use crate::config::ElisionConfig;
use crate::method::{Method, Node};
use crate::values::NodeId;
use crate::{IrError, Result};
use std::collections::HashMap;
use tracing::{debug, info, trace};

struct Classification {
    strength: BarrierStrength,
    reason: ElisionReason,
    /// Strength of the fact this access leaves behind.
    establishes: BarrierStrength,
}

pub struct BarrierElisionEngine<'a> {
    method: &'a Method,
    cfg: &'a ControlFlowGraph,
    domtree: &'a DominatorTree,
    safepoints: &'a SafepointMap,
    def_use: DefUseChains,
    escape: EscapeAnalysis,
    config: ElisionConfig,
}

impl<'a> BarrierElisionEngine<'a> {
    pub fn new(
        method: &'a Method,
        cfg: &'a ControlFlowGraph,
        domtree: &'a DominatorTree,
        safepoints: &'a SafepointMap,
        config: &ElisionConfig,
    ) -> Result<Self> {
        let def_use = DefUseChains::build(&method.body)?;
        let escape = EscapeAnalysis::build(&method.body, &def_use);

        Ok(Self {
            method,
            cfg,
            domtree,
            safepoints,
            def_use,
            escape,
            config: config.clone(),
        })
    }

    /// Builds every analysis the engine needs and runs it.
    pub fn run(method: &Method, config: &ElisionConfig) -> Result<BarrierAnnotation> {
        let cfg = ControlFlowGraph::build(&method.body)?;
        let domtree = DominatorTree::build(&cfg);
        let loops = LoopAnalysis::build(&method.body, &cfg, &domtree, config.counted_loops_poll)?;
        let safepoints = SafepointMap::build(&method.body, &cfg, &loops);

        BarrierElisionEngine::new(method, &cfg, &domtree, &safepoints, config)?.analyze()
    }

    pub fn analyze(&self) -> Result<BarrierAnnotation> {
        let mut annotation = BarrierAnnotation::new(self.method.name());
        let mut out: HashMap<BlockId, AccessCatalog> = HashMap::new();

        for &block in self.cfg.reverse_postorder() {
            let mut catalog = self.entry_catalog(block, &out)?;

            for id in self.cfg.block_nodes(block) {
                let node = self.method.body.try_node(*id)?;
                self.visit(node, &mut catalog, &mut annotation)?;
            }

            out.insert(block, catalog);
        }

        for node in self.method.body.memory_accesses() {
            if self.cfg.is_reachable(node.block) {
                continue;
            }
            if let Some(access) = Access::from_node(node) {
                let strength = if access.ty.is_reference() {
                    BarrierStrength::Strong
                } else {
                    BarrierStrength::None
                };
                annotation.insert(self.annotate(node, &access, strength, ElisionReason::Unreachable));
            }
        }

        annotation.sort();

        let counts = annotation.counts();
        info!(
            method = %self.method.name(),
            accesses = annotation.len(),
            elided = counts.elided(),
            emitted = counts.emitted(),
            "barrier elision finished"
        );

        Ok(annotation)
    }

    fn entry_catalog(
        &self,
        block: BlockId,
        out: &HashMap<BlockId, AccessCatalog>,
    ) -> Result<AccessCatalog> {
        if block == self.cfg.entry() {
            return Ok(AccessCatalog::new());
        }

        let reachable_preds: Vec<BlockId> = self
            .cfg
            .predecessors(block)
            .iter()
            .copied()
            .filter(|p| self.cfg.is_reachable(*p))
            .collect();
        let visited: Vec<&AccessCatalog> = reachable_preds
            .iter()
            .filter_map(|p| out.get(p))
            .collect();

        if visited.is_empty() {
            return Err(IrError::MalformedCfg(format!(
                "{} is reached before any of its predecessors",
                block
            )));
        }

        if reachable_preds.len() == 1 {
            return Ok(visited[0].clone());
        }

        let mut catalog = AccessCatalog::merge_at(block, &visited);
        let dropped = catalog.retain_valid(|fact| {
            self.safepoints
                .paths_into_block_are_free(&fact.definers, block)
        });
        if dropped > 0 {
            trace!(%block, dropped, "facts do not survive into block");
        }

        Ok(catalog)
    }

    fn visit(
        &self,
        node: &Node,
        catalog: &mut AccessCatalog,
        annotation: &mut BarrierAnnotation,
    ) -> Result<()> {
        if self.safepoints.is_safepoint(node.id) {
            let dropped = catalog.invalidate_across_safepoint();
            if dropped > 0 {
                trace!(node = %node.id, dropped, "safepoint invalidates facts");
            }
        }

        let Some(access) = Access::from_node(node) else {
            return Ok(());
        };

        let classified = self.classify(&access, catalog)?;
        debug!(
            node = %node.id,
            kind = %access.kind,
            key = %access.key,
            strength = %classified.strength,
            "classified access"
        );

        if access.ty.is_reference() {
            catalog.record(access.key, classified.establishes, node.id);
        }
        annotation.insert(self.annotate(node, &access, classified.strength, classified.reason));

        Ok(())
    }

    fn classify(&self, access: &Access, catalog: &AccessCatalog) -> Result<Classification> {
        let establishes = access.kind.establishes();

        if !access.ty.is_reference() {
            return Ok(Classification {
                strength: BarrierStrength::None,
                reason: ElisionReason::NotReference,
                establishes: BarrierStrength::None,
            });
        }

        if self.config.fresh_object_elision {
            if let Some(allocation) = self.fresh_allocation(access)? {
                return Ok(Classification {
                    strength: BarrierStrength::Elided,
                    reason: ElisionReason::FreshAllocation { allocation },
                    establishes,
                });
            }
        }

        if !access.key.is_trackable() {
            return Ok(Classification {
                strength: BarrierStrength::Strong,
                reason: ElisionReason::UnknownIndex,
                establishes,
            });
        }

        if self.config.dominating_access_elision {
            if let Some(fact) = catalog.lookup(&access.key) {
                if self
                    .safepoints
                    .path_is_free(&fact.definers, access.node, |_| false)
                {
                    let by = fact.definers.clone();
                    let (strength, reason) = self.match_fact(access.kind, fact.strength, by);
                    return Ok(Classification {
                        strength,
                        reason,
                        establishes: establishes.max(fact.strength),
                    });
                }
            }
        }

        Ok(Classification {
            strength: BarrierStrength::Strong,
            reason: ElisionReason::NoDominatingFact,
            establishes,
        })
    }

    fn match_fact(
        &self,
        kind: AccessKind,
        fact: BarrierStrength,
        by: Vec<NodeId>,
    ) -> (BarrierStrength, ElisionReason) {
        if fact >= kind.required() {
            return (BarrierStrength::Elided, ElisionReason::Dominated { by });
        }

        match kind {
            AccessKind::Atomic
                if self.config.atomic_partial_elision && fact >= BarrierStrength::Weak =>
            {
                (
                    BarrierStrength::Weak,
                    ElisionReason::PartiallyDominated { by },
                )
            }
            _ => (
                BarrierStrength::Strong,
                ElisionReason::InsufficientFact { by },
            ),
        }
    }

    /// The allocation node whose object this access touches, if the object
    /// is still unpublished and no safepoint separates it from the access.
    fn fresh_allocation(&self, access: &Access) -> Result<Option<NodeId>> {
        let object = access.object();
        if !self.def_use.is_allocation(object) {
            return Ok(None);
        }
        let Some(allocation) = self.def_use.defining_node(object) else {
            return Ok(None);
        };
        let allocation_node = self.method.body.try_node(allocation)?;
        if !allocation_node.inst.is_allocation() {
            return Err(IrError::InvalidInstruction(format!(
                "{} is recorded as an allocation but is not one",
                object
            )));
        }

        if !self.domtree.node_dominates(self.cfg, allocation, access.node) {
            return Ok(None);
        }

        let publications = self.escape.publication_points(object);
        let free = self.safepoints.path_is_free(&[allocation], access.node, |n| {
            publications.map_or(false, |points| points.contains(&n))
        });

        Ok(free.then_some(allocation))
    }

    fn annotate(
        &self,
        node: &Node,
        access: &Access,
        strength: BarrierStrength,
        reason: ElisionReason,
    ) -> AccessAnnotation {
        AccessAnnotation {
            node: node.id,
            block: node.block,
            kind: access.kind,
            key: access.key,
            strength,
            reason,
        }
    }
}
