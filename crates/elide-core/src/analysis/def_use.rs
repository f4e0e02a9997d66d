use crate::{
    block::BlockId,
    instructions::Instruction,
    method::MethodBody,
    values::{NodeId, ValueId},
    IrError, Result,
};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct DefUseChains {
    definitions: HashMap<ValueId, Definition>,
    uses: HashMap<ValueId, Vec<Use>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Definition {
    pub node: NodeId,
    pub block: BlockId,
    pub kind: DefKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Use {
    pub block: BlockId,
    /// `None` when the value is read by the block terminator.
    pub node: Option<NodeId>,
    pub kind: UseKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    Parameter(u32),
    Constant,
    Allocation,
    Phi,
    Instruction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseKind {
    Address,
    StoreValue,
    Argument,
    Operand,
    Terminator,
}

impl DefUseChains {
    /// Fails if a value is defined twice.
    pub fn build(body: &MethodBody) -> Result<Self> {
        let mut definitions = HashMap::new();
        let mut uses: HashMap<ValueId, Vec<Use>> = HashMap::new();

        for node in body.nodes() {
            if let Some(result) = node.inst.result() {
                let def = Definition {
                    node: node.id,
                    block: node.block,
                    kind: Self::def_kind(&node.inst),
                };
                if definitions.insert(result, def).is_some() {
                    return Err(IrError::InvalidInstruction(format!(
                        "{} is defined more than once",
                        result
                    )));
                }
            }

            for (value, kind) in Self::extract_uses(&node.inst) {
                uses.entry(value).or_default().push(Use {
                    block: node.block,
                    node: Some(node.id),
                    kind,
                });
            }
        }

        for (block_id, block) in &body.blocks {
            for value in block.terminator.operands() {
                uses.entry(value).or_default().push(Use {
                    block: *block_id,
                    node: None,
                    kind: UseKind::Terminator,
                });
            }
        }

        Ok(Self { definitions, uses })
    }

    fn def_kind(inst: &Instruction) -> DefKind {
        match inst {
            Instruction::Param { index, .. } => DefKind::Parameter(*index),
            Instruction::Iconst { .. } => DefKind::Constant,
            Instruction::Allocate { .. } => DefKind::Allocation,
            Instruction::Phi { .. } => DefKind::Phi,
            _ => DefKind::Instruction,
        }
    }

    fn extract_uses(inst: &Instruction) -> Vec<(ValueId, UseKind)> {
        match inst {
            Instruction::Load { object, .. } => {
                let mut uses = vec![(*object, UseKind::Address)];
                uses.extend(
                    inst.operands()
                        .into_iter()
                        .skip(1)
                        .map(|v| (v, UseKind::Operand)),
                );
                uses
            }
            Instruction::Store { object, value, .. }
            | Instruction::AtomicExchange { object, value, .. } => inst
                .operands()
                .into_iter()
                .enumerate()
                .map(|(i, v)| {
                    let kind = if i == 0 && v == *object {
                        UseKind::Address
                    } else if v == *value {
                        UseKind::StoreValue
                    } else {
                        UseKind::Operand
                    };
                    (v, kind)
                })
                .collect(),
            Instruction::Call { args, .. } => {
                args.iter().map(|v| (*v, UseKind::Argument)).collect()
            }
            _ => inst
                .operands()
                .into_iter()
                .map(|v| (v, UseKind::Operand))
                .collect(),
        }
    }

    pub fn definition(&self, value: ValueId) -> Option<&Definition> {
        self.definitions.get(&value)
    }

    pub fn defining_node(&self, value: ValueId) -> Option<NodeId> {
        self.definitions.get(&value).map(|d| d.node)
    }

    pub fn is_allocation(&self, value: ValueId) -> bool {
        matches!(
            self.definition(value).map(|d| d.kind),
            Some(DefKind::Allocation)
        )
    }

    pub fn uses(&self, value: ValueId) -> &[Use] {
        self.uses.get(&value).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_used(&self, value: ValueId) -> bool {
        !self.uses(value).is_empty()
    }

    /// Values read somewhere but never defined, sorted.
    pub fn undefined_uses(&self) -> Vec<ValueId> {
        let mut undefined: Vec<ValueId> = self
            .uses
            .keys()
            .filter(|v| !self.definitions.contains_key(v))
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        undefined.sort_unstable();
        undefined
    }
}
