use super::cfg::ControlFlowGraph;
use super::dominator::DominatorTree;
use crate::block::{BlockId, Terminator};
use crate::method::MethodBody;
use crate::{IrError, Result};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Edge from a latch back to the header that dominates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackEdge {
    pub latch: BlockId,
    pub header: BlockId,
    /// Whether the edge carries a safepoint poll.
    pub pollable: bool,
}

#[derive(Debug, Clone)]
pub struct Loop {
    pub header: BlockId,
    pub blocks: HashSet<BlockId>,
    pub latches: Vec<BlockId>,
    pub exits: Vec<BlockId>,
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct LoopAnalysis {
    loops: Vec<Loop>,
    back_edges: Vec<BackEdge>,
}

impl LoopAnalysis {
    pub fn build(
        body: &MethodBody,
        cfg: &ControlFlowGraph,
        domtree: &DominatorTree,
        counted_loops_poll: bool,
    ) -> Result<Self> {
        let mut back_edges = Vec::new();

        for &block in cfg.reverse_postorder() {
            let Some(from_index) = cfg.rpo_index(block) else {
                continue;
            };
            let terminator = body
                .get_block(block)
                .map(|b| &b.terminator)
                .ok_or(IrError::UnknownBlock(block))?;

            for &succ in cfg.successors(block) {
                let Some(to_index) = cfg.rpo_index(succ) else {
                    continue;
                };
                let retreating = to_index <= from_index;

                if retreating && !domtree.dominates(succ, block) {
                    return Err(IrError::IrreducibleCfg {
                        from: block,
                        to: succ,
                    });
                }

                if let Terminator::LoopBack { header, .. } = terminator {
                    if !retreating {
                        return Err(IrError::MalformedCfg(format!(
                            "loop_back from {} targets {}, which is not a loop header",
                            block, header
                        )));
                    }
                }

                if retreating {
                    let pollable = match terminator {
                        Terminator::LoopBack { counted: true, .. } => counted_loops_poll,
                        _ => true,
                    };
                    trace!(latch = %block, header = %succ, pollable, "back-edge");
                    back_edges.push(BackEdge {
                        latch: block,
                        header: succ,
                        pollable,
                    });
                }
            }
        }

        let loops = Self::natural_loops(cfg, &back_edges);

        Ok(Self { loops, back_edges })
    }

    fn natural_loops(cfg: &ControlFlowGraph, back_edges: &[BackEdge]) -> Vec<Loop> {
        let mut by_header: Vec<Loop> = Vec::new();

        for edge in back_edges {
            let blocks = Self::find_loop_blocks(cfg, edge.header, edge.latch);
            match by_header.iter_mut().find(|l| l.header == edge.header) {
                Some(existing) => {
                    existing.blocks.extend(blocks);
                    existing.latches.push(edge.latch);
                }
                None => by_header.push(Loop {
                    header: edge.header,
                    blocks,
                    latches: vec![edge.latch],
                    exits: Vec::new(),
                    depth: 0,
                }),
            }
        }

        for l in by_header.iter_mut() {
            let mut exits: Vec<BlockId> = l
                .blocks
                .iter()
                .flat_map(|b| cfg.successors(*b).iter().copied())
                .filter(|s| !l.blocks.contains(s))
                .collect();
            exits.sort_unstable();
            exits.dedup();
            l.exits = exits;
        }

        let headers: Vec<(BlockId, HashSet<BlockId>)> = by_header
            .iter()
            .map(|l| (l.header, l.blocks.clone()))
            .collect();
        for l in by_header.iter_mut() {
            l.depth = headers
                .iter()
                .filter(|(h, blocks)| *h != l.header && blocks.contains(&l.header))
                .count()
                + 1;
        }

        by_header
    }

    fn find_loop_blocks(
        cfg: &ControlFlowGraph,
        header: BlockId,
        latch: BlockId,
    ) -> HashSet<BlockId> {
        let mut blocks = HashSet::from([header]);
        if latch == header {
            return blocks;
        }

        blocks.insert(latch);
        let mut worklist = vec![latch];
        while let Some(block) = worklist.pop() {
            for &pred in cfg.predecessors(block) {
                if cfg.is_reachable(pred) && blocks.insert(pred) {
                    worklist.push(pred);
                }
            }
        }

        blocks
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn back_edges(&self) -> &[BackEdge] {
        &self.back_edges
    }

    pub fn is_back_edge(&self, from: BlockId, to: BlockId) -> bool {
        self.back_edges
            .iter()
            .any(|e| e.latch == from && e.header == to)
    }

    pub fn is_loop_header(&self, block: BlockId) -> bool {
        self.loops.iter().any(|l| l.header == block)
    }

    pub fn pollable_edges(&self) -> impl Iterator<Item = (BlockId, BlockId)> + '_ {
        self.back_edges
            .iter()
            .filter(|e| e.pollable)
            .map(|e| (e.latch, e.header))
    }

    /// Number of loops containing `block`; zero outside any loop.
    pub fn loop_depth(&self, block: BlockId) -> usize {
        self.loops
            .iter()
            .filter(|l| l.blocks.contains(&block))
            .count()
    }

    pub fn depths(&self) -> HashMap<BlockId, usize> {
        self.loops
            .iter()
            .flat_map(|l| l.blocks.iter().copied())
            .map(|b| (b, self.loop_depth(b)))
            .collect()
    }
}
