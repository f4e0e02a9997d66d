/*! Where the collector may run.
 *
 * A safepoint is any node at which a GC may happen (calls, allocations and
 * explicit polls) plus every back-edge that polls. A barrier fact survives
 * from its definer to a later point only if no path between them crosses a
 * safepoint, which is what the path queries here decide.
 */

use super::cfg::ControlFlowGraph;
use super::loops::LoopAnalysis;
use crate::block::BlockId;
use crate::method::MethodBody;
use crate::values::NodeId;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct SafepointMap {
    cfg: ControlFlowGraph,
    safepoints: HashSet<NodeId>,
    pollable_edges: HashSet<(BlockId, BlockId)>,
}

enum Scan {
    Source,
    Blocked,
    Clear,
}

impl SafepointMap {
    pub fn build(body: &MethodBody, cfg: &ControlFlowGraph, loops: &LoopAnalysis) -> Self {
        let safepoints = body
            .nodes()
            .iter()
            .filter(|n| n.inst.is_safepoint())
            .map(|n| n.id)
            .collect();

        Self {
            cfg: cfg.clone(),
            safepoints,
            pollable_edges: loops.pollable_edges().collect(),
        }
    }

    pub fn is_safepoint(&self, node: NodeId) -> bool {
        self.safepoints.contains(&node)
    }

    pub fn safepoint_count(&self) -> usize {
        self.safepoints.len()
    }

    pub fn edge_is_safepoint_bearing(&self, from: BlockId, to: BlockId) -> bool {
        self.pollable_edges.contains(&(from, to))
    }

    /// A block bears a safepoint if it contains one or leaves through a
    /// polling back-edge.
    pub fn block_is_safepoint_bearing(&self, block: BlockId) -> bool {
        self.cfg
            .block_nodes(block)
            .iter()
            .any(|n| self.is_safepoint(*n))
            || self
                .cfg
                .successors(block)
                .iter()
                .any(|s| self.edge_is_safepoint_bearing(block, *s))
    }

    /// Stricter than "no path from `from` to `to` crosses a safepoint":
    /// every path reaching `to` must also pass through `from`. When `from`
    /// does not dominate `to`, including when no path between them exists,
    /// the answer is `false`.
    pub fn path_is_safepoint_free(&self, from: NodeId, to: NodeId) -> bool {
        self.path_is_free(&[from], to, |_| false)
    }

    /// True when every path reaching `to` passes through one of `sources`
    /// and nothing between the nearest source and `to` is a safepoint, a
    /// polling edge, or a node rejected by `blocking`.
    pub fn path_is_free<F>(&self, sources: &[NodeId], to: NodeId, blocking: F) -> bool
    where
        F: Fn(NodeId) -> bool,
    {
        match self.cfg.position(to) {
            Some((block, index)) => self.walk(sources, block, index, &blocking),
            None => false,
        }
    }

    /// Same check as [`SafepointMap::path_is_free`], ending at the top of
    /// `block`.
    pub fn paths_into_block_are_free(&self, sources: &[NodeId], block: BlockId) -> bool {
        self.cfg.is_reachable(block) && self.walk(sources, block, 0, &|_| false)
    }

    fn walk(
        &self,
        sources: &[NodeId],
        start: BlockId,
        prefix: usize,
        blocking: &dyn Fn(NodeId) -> bool,
    ) -> bool {
        if sources.is_empty() {
            return false;
        }
        let sources: HashSet<NodeId> = sources.iter().copied().collect();

        match self.scan(start, prefix, &sources, blocking) {
            Scan::Source => return true,
            Scan::Blocked => return false,
            Scan::Clear => {}
        }

        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(block) = stack.pop() {
            if block == self.cfg.entry() {
                return false;
            }

            for &pred in self.cfg.predecessors(block) {
                if !self.cfg.is_reachable(pred) {
                    continue;
                }
                if self.edge_is_safepoint_bearing(pred, block) {
                    return false;
                }
                if !visited.insert(pred) {
                    continue;
                }

                let len = self.cfg.block_nodes(pred).len();
                match self.scan(pred, len, &sources, blocking) {
                    Scan::Source => {}
                    Scan::Blocked => return false,
                    Scan::Clear => stack.push(pred),
                }
            }
        }

        true
    }

    /// Scans the first `len` nodes of `block` from the bottom up.
    fn scan(
        &self,
        block: BlockId,
        len: usize,
        sources: &HashSet<NodeId>,
        blocking: &dyn Fn(NodeId) -> bool,
    ) -> Scan {
        let nodes = self.cfg.block_nodes(block);
        for node in nodes[..len.min(nodes.len())].iter().rev() {
            if sources.contains(node) {
                return Scan::Source;
            }
            if self.is_safepoint(*node) || blocking(*node) {
                return Scan::Blocked;
            }
        }
        Scan::Clear
    }
}
