use crate::block::{BasicBlock, BlockId, Terminator};
use crate::instructions::Instruction;
use crate::types::Type;
use crate::values::{NodeId, ValueId};
use crate::{IrError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One compilation unit: the analysis runs once per method and keeps no
/// state between methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: MethodBody,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: MethodBody::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_block(&self) -> BlockId {
        self.body.entry_block()
    }

    /// Adds a parameter, materialized as a `Param` node in the entry block.
    pub fn add_param(&mut self, value: ValueId, ty: Type) -> Result<NodeId> {
        let index = self.params.len() as u32;
        self.params.push(Parameter { value, ty });
        let entry = self.body.entry_block;
        self.body.append(
            entry,
            Instruction::Param {
                result: value,
                index,
                ty,
            },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub value: ValueId,
    pub ty: Type,
}

/// An instruction together with its identity and placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub block: BlockId,
    pub inst: Instruction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodBody {
    pub entry_block: BlockId,
    pub blocks: IndexMap<BlockId, BasicBlock>,
    nodes: Vec<Node>,
    next_block_id: u32,
    next_value_id: u32,
}

impl MethodBody {
    pub fn new() -> Self {
        let entry_block = BlockId(0);
        let mut blocks = IndexMap::new();
        blocks.insert(entry_block, BasicBlock::new(entry_block));

        Self {
            entry_block,
            blocks,
            nodes: Vec::new(),
            next_block_id: 1,
            next_value_id: 0,
        }
    }

    /// Body whose entry is `entry` instead of `block0`.
    pub fn with_entry(entry: BlockId) -> Self {
        let mut blocks = IndexMap::new();
        blocks.insert(entry, BasicBlock::new(entry));

        Self {
            entry_block: entry,
            blocks,
            nodes: Vec::new(),
            next_block_id: entry.0 + 1,
            next_value_id: 0,
        }
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn create_block_with_id(&mut self, id: BlockId) -> Result<BlockId> {
        if self.blocks.contains_key(&id) {
            return Err(IrError::BuilderError(format!("{} already exists", id)));
        }
        self.next_block_id = self.next_block_id.max(id.0 + 1);
        self.blocks.insert(id, BasicBlock::new(id));
        Ok(id)
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn entry_block(&self) -> BlockId {
        self.entry_block
    }

    pub fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value_id);
        self.next_value_id += 1;
        id
    }

    /// Keeps `fresh_value` from handing out `value` or anything below it.
    pub fn reserve_value(&mut self, value: ValueId) {
        self.next_value_id = self.next_value_id.max(value.0 + 1);
    }

    pub fn append(&mut self, block: BlockId, inst: Instruction) -> Result<NodeId> {
        let id = NodeId(self.nodes.len() as u32);
        let target = self
            .blocks
            .get_mut(&block)
            .ok_or(IrError::UnknownBlock(block))?;
        if target.is_terminated() {
            return Err(IrError::BuilderError(format!(
                "cannot append to terminated {}",
                block
            )));
        }
        target.nodes.push(id);
        if let Some(result) = inst.result() {
            self.next_value_id = self.next_value_id.max(result.0 + 1);
        }
        self.nodes.push(Node { id, block, inst });
        Ok(id)
    }

    pub fn set_terminator(&mut self, block: BlockId, term: Terminator) -> Result<()> {
        let target = self
            .blocks
            .get_mut(&block)
            .ok_or(IrError::UnknownBlock(block))?;
        target.set_terminator(term);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(IrError::UnknownNode(id))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn block_nodes(&self, block: BlockId) -> impl Iterator<Item = &Node> + '_ {
        self.blocks
            .get(&block)
            .into_iter()
            .flat_map(|b| b.nodes.iter())
            .filter_map(|id| self.nodes.get(id.index()))
    }

    pub fn memory_accesses(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|n| n.inst.is_memory_access())
    }
}

impl Default for MethodBody {
    fn default() -> Self {
        Self::new()
    }
}
