use super::cfg::ControlFlowGraph;
use crate::block::BlockId;
use crate::values::NodeId;
use crate::{IrError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DominatorTree {
    root: BlockId,
    idom: HashMap<BlockId, BlockId>,
    children: HashMap<BlockId, Vec<BlockId>>,
    rpo_index: HashMap<BlockId, usize>,
}

impl DominatorTree {
    /// Cooper, Harvey and Kennedy's iterative scheme over reverse postorder.
    /// Unreachable blocks get no entry in the tree.
    pub fn build(cfg: &ControlFlowGraph) -> Self {
        let rpo = cfg.reverse_postorder();
        let root = cfg.entry();
        let mut doms: Vec<Option<usize>> = vec![None; rpo.len()];

        if !rpo.is_empty() {
            doms[0] = Some(0);
        }

        let mut changed = true;
        while changed {
            changed = false;

            for (index, &block) in rpo.iter().enumerate().skip(1) {
                let mut new_idom: Option<usize> = None;

                for pred in cfg.predecessors(block) {
                    let Some(pred_index) = cfg.rpo_index(*pred) else {
                        continue;
                    };
                    if doms[pred_index].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred_index,
                        Some(current) => Self::intersect(&doms, pred_index, current),
                    });
                }

                if new_idom.is_some() && doms[index] != new_idom {
                    doms[index] = new_idom;
                    changed = true;
                }
            }
        }

        let mut idom = HashMap::new();
        let mut children: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        for (index, &block) in rpo.iter().enumerate().skip(1) {
            if let Some(parent) = doms[index] {
                idom.insert(block, rpo[parent]);
                children.entry(rpo[parent]).or_default().push(block);
            }
        }

        let rpo_index = rpo.iter().enumerate().map(|(i, b)| (*b, i)).collect();

        Self {
            root,
            idom,
            children,
            rpo_index,
        }
    }

    fn intersect(doms: &[Option<usize>], mut a: usize, mut b: usize) -> usize {
        while a != b {
            while a > b {
                a = doms[a].unwrap_or(0);
            }
            while b > a {
                b = doms[b].unwrap_or(0);
            }
        }
        a
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn contains(&self, block: BlockId) -> bool {
        self.rpo_index.contains_key(&block)
    }

    /// Reflexive dominance. Blocks outside the tree dominate nothing and are
    /// dominated by nothing.
    pub fn dominates(&self, dominator: BlockId, dominated: BlockId) -> bool {
        let (Some(&a), Some(&b)) = (
            self.rpo_index.get(&dominator),
            self.rpo_index.get(&dominated),
        ) else {
            return false;
        };

        if a > b {
            return false;
        }

        let mut current = dominated;
        loop {
            if current == dominator {
                return true;
            }
            match self.idom.get(&current) {
                Some(&parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn strictly_dominates(&self, dominator: BlockId, dominated: BlockId) -> bool {
        dominator != dominated && self.dominates(dominator, dominated)
    }

    pub fn checked_dominates(&self, dominator: BlockId, dominated: BlockId) -> Result<bool> {
        for block in [dominator, dominated] {
            if !self.contains(block) {
                return Err(IrError::UnknownBlock(block));
            }
        }
        Ok(self.dominates(dominator, dominated))
    }

    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        self.idom.get(&block).copied()
    }

    pub fn children(&self, block: BlockId) -> &[BlockId] {
        self.children
            .get(&block)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn nearest_common_dominator(&self, a: BlockId, b: BlockId) -> Result<BlockId> {
        let mut a_index = *self.rpo_index.get(&a).ok_or(IrError::UnknownBlock(a))?;
        let mut b_index = *self.rpo_index.get(&b).ok_or(IrError::UnknownBlock(b))?;
        let mut a = a;
        let mut b = b;

        while a != b {
            if a_index > b_index {
                a = self.idom(a).unwrap_or(self.root);
                a_index = self.rpo_index.get(&a).copied().unwrap_or(0);
            } else {
                b = self.idom(b).unwrap_or(self.root);
                b_index = self.rpo_index.get(&b).copied().unwrap_or(0);
            }
        }

        Ok(a)
    }

    /// Dominator-tree preorder starting at the root.
    pub fn preorder(&self) -> Vec<BlockId> {
        let mut order = Vec::with_capacity(self.rpo_index.len());
        let mut stack = vec![self.root];

        while let Some(block) = stack.pop() {
            order.push(block);
            stack.extend(self.children(block).iter().rev().copied());
        }

        order
    }

    /// Dominance between instructions: same block compares positions.
    pub fn node_dominates(&self, cfg: &ControlFlowGraph, a: NodeId, b: NodeId) -> bool {
        match (cfg.position(a), cfg.position(b)) {
            (Some((block_a, index_a)), Some((block_b, index_b))) => {
                if block_a == block_b {
                    index_a <= index_b && self.contains(block_a)
                } else {
                    self.dominates(block_a, block_b)
                }
            }
            _ => false,
        }
    }
}
