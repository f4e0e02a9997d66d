use crate::types::Type;
use crate::values::{Operand, ValueId};
use serde::{Deserialize, Serialize};

/// Which slot of an object an access touches.
///
/// `UnknownIndex` marks an array element addressed by a computed index. It
/// never matches another selector, not even another `UnknownIndex` over the
/// same index value: no index-equality proof exists to justify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldSelector {
    Offset(i64),
    Element(u64),
    UnknownIndex(ValueId),
}

impl FieldSelector {
    pub fn is_known(&self) -> bool {
        !matches!(self, FieldSelector::UnknownIndex(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Param {
        result: ValueId,
        index: u32,
        ty: Type,
    },
    Iconst {
        result: ValueId,
        value: i64,
    },
    Allocate {
        result: ValueId,
        class: String,
        length: Option<Operand>,
    },
    Load {
        result: ValueId,
        object: ValueId,
        selector: FieldSelector,
        ty: Type,
    },
    Store {
        object: ValueId,
        selector: FieldSelector,
        value: ValueId,
        ty: Type,
    },
    AtomicExchange {
        result: ValueId,
        object: ValueId,
        selector: FieldSelector,
        value: ValueId,
        ty: Type,
    },
    Call {
        result: Option<ValueId>,
        callee: String,
        args: Vec<ValueId>,
    },
    SafepointPoll,
    Phi {
        result: ValueId,
        incoming: Vec<(crate::block::BlockId, ValueId)>,
    },
}

impl Instruction {
    pub fn result(&self) -> Option<ValueId> {
        match self {
            Instruction::Param { result, .. }
            | Instruction::Iconst { result, .. }
            | Instruction::Allocate { result, .. }
            | Instruction::Load { result, .. }
            | Instruction::AtomicExchange { result, .. }
            | Instruction::Phi { result, .. } => Some(*result),
            Instruction::Call { result, .. } => *result,
            Instruction::Store { .. } | Instruction::SafepointPoll => None,
        }
    }

    /// Values read by this instruction, in operand order.
    pub fn operands(&self) -> Vec<ValueId> {
        let mut values = Vec::new();

        match self {
            Instruction::Param { .. } | Instruction::Iconst { .. } | Instruction::SafepointPoll => {}
            Instruction::Allocate { length, .. } => {
                values.extend(length.and_then(|l| l.as_value()));
            }
            Instruction::Load {
                object, selector, ..
            } => {
                values.push(*object);
                push_selector(&mut values, selector);
            }
            Instruction::Store {
                object,
                selector,
                value,
                ..
            }
            | Instruction::AtomicExchange {
                object,
                selector,
                value,
                ..
            } => {
                values.push(*object);
                push_selector(&mut values, selector);
                values.push(*value);
            }
            Instruction::Call { args, .. } => values.extend(args.iter().copied()),
            Instruction::Phi { incoming, .. } => {
                values.extend(incoming.iter().map(|(_, v)| *v));
            }
        }

        values
    }

    /// Instructions at which the collector may run: opaque calls, the
    /// allocation slow path, and explicit polls.
    pub fn is_safepoint(&self) -> bool {
        matches!(
            self,
            Instruction::Call { .. } | Instruction::Allocate { .. } | Instruction::SafepointPoll
        )
    }

    pub fn is_memory_access(&self) -> bool {
        matches!(
            self,
            Instruction::Load { .. } | Instruction::Store { .. } | Instruction::AtomicExchange { .. }
        )
    }

    pub fn is_allocation(&self) -> bool {
        matches!(self, Instruction::Allocate { .. })
    }

    /// Reference value this instruction writes into the heap or hands to a
    /// callee, if any.
    pub fn published_values(&self) -> Vec<ValueId> {
        match self {
            Instruction::Store {
                value,
                ty: Type::Ref,
                ..
            }
            | Instruction::AtomicExchange {
                value,
                ty: Type::Ref,
                ..
            } => vec![*value],
            Instruction::Call { args, .. } => args.clone(),
            _ => Vec::new(),
        }
    }
}

fn push_selector(values: &mut Vec<ValueId>, selector: &FieldSelector) {
    if let FieldSelector::UnknownIndex(index) = selector {
        values.push(*index);
    }
}
