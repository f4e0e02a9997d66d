use crate::block::BlockId;
use crate::method::MethodBody;
use crate::values::NodeId;
use crate::{IrError, Result};
use std::collections::{HashMap, HashSet};

/// Block-level control-flow graph of one method, with the layout of every
/// node so analyses can reason about positions inside blocks.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    pub entry: BlockId,
    edges: HashMap<BlockId, Vec<BlockId>>,
    reverse_edges: HashMap<BlockId, Vec<BlockId>>,
    block_nodes: HashMap<BlockId, Vec<NodeId>>,
    layout: HashMap<NodeId, (BlockId, usize)>,
    rpo: Vec<BlockId>,
    rpo_index: HashMap<BlockId, usize>,
}

impl ControlFlowGraph {
    pub fn build(body: &MethodBody) -> Result<Self> {
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        let mut block_nodes = HashMap::new();
        let mut layout = HashMap::new();

        for (block_id, block) in &body.blocks {
            if !block.is_terminated() {
                return Err(IrError::MalformedCfg(format!(
                    "{} has no terminator",
                    block_id
                )));
            }

            let successors = block.successors();
            for succ in &successors {
                if !body.blocks.contains_key(succ) {
                    return Err(IrError::MalformedCfg(format!(
                        "{} branches to undefined {}",
                        block_id, succ
                    )));
                }
                let preds = reverse_edges.entry(*succ).or_default();
                if !preds.contains(block_id) {
                    preds.push(*block_id);
                }
            }
            edges.insert(*block_id, successors);

            for (index, node) in block.nodes.iter().enumerate() {
                layout.insert(*node, (*block_id, index));
            }
            block_nodes.insert(*block_id, block.nodes.clone());
        }

        let rpo = Self::reverse_postorder_from(&edges, body.entry_block);
        let rpo_index = rpo.iter().enumerate().map(|(i, b)| (*b, i)).collect();

        Ok(Self {
            entry: body.entry_block,
            edges,
            reverse_edges,
            block_nodes,
            layout,
            rpo,
            rpo_index,
        })
    }

    fn reverse_postorder_from(
        edges: &HashMap<BlockId, Vec<BlockId>>,
        entry: BlockId,
    ) -> Vec<BlockId> {
        let mut visited = HashSet::from([entry]);
        let mut postorder = Vec::new();
        let mut stack = vec![(entry, 0usize)];

        while let Some((block, next)) = stack.last_mut() {
            let succs = edges.get(block).map(|v| v.as_slice()).unwrap_or(&[]);
            if let Some(&succ) = succs.get(*next) {
                *next += 1;
                if visited.insert(succ) {
                    stack.push((succ, 0));
                }
            } else {
                postorder.push(*block);
                stack.pop();
            }
        }

        postorder.reverse();
        postorder
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        self.reverse_edges
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, block: BlockId) -> &[BlockId] {
        self.edges.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Reachable blocks, each listed after all of its dominators.
    pub fn reverse_postorder(&self) -> &[BlockId] {
        &self.rpo
    }

    pub fn rpo_index(&self, block: BlockId) -> Option<usize> {
        self.rpo_index.get(&block).copied()
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.rpo_index.contains_key(&block)
    }

    pub fn contains_block(&self, block: BlockId) -> bool {
        self.edges.contains_key(&block)
    }

    pub fn block_nodes(&self, block: BlockId) -> &[NodeId] {
        self.block_nodes
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Block and index of a node inside that block.
    pub fn position(&self, node: NodeId) -> Option<(BlockId, usize)> {
        self.layout.get(&node).copied()
    }
}
