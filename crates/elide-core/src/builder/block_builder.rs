use crate::{
    block::{BlockId, Terminator},
    instructions::{FieldSelector, Instruction},
    method::MethodBody,
    types::Type,
    values::{NodeId, Operand, ValueId},
    IrError,
};

/// Node and SSA value of an instruction that produces a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltValue {
    pub node: NodeId,
    pub value: ValueId,
}

pub struct BlockBuilder<'a> {
    pub block_id: BlockId,
    body: &'a mut MethodBody,
    errors: &'a mut Vec<IrError>,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(block_id: BlockId, body: &'a mut MethodBody, errors: &'a mut Vec<IrError>) -> Self {
        Self {
            block_id,
            body,
            errors,
        }
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    fn push_instruction(&mut self, inst: Instruction) -> NodeId {
        match self.body.append(self.block_id, inst) {
            Ok(node) => node,
            Err(e) => {
                self.errors.push(e);
                NodeId(u32::MAX)
            }
        }
    }

    fn push_with_result(&mut self, make: impl FnOnce(ValueId) -> Instruction) -> BuiltValue {
        let value = self.body.fresh_value();
        let node = self.push_instruction(make(value));
        BuiltValue { node, value }
    }

    pub fn iconst(&mut self, value: i64) -> ValueId {
        self.push_with_result(|result| Instruction::Iconst { result, value })
            .value
    }

    pub fn allocate(&mut self, class: &str) -> BuiltValue {
        self.push_with_result(|result| Instruction::Allocate {
            result,
            class: class.to_string(),
            length: None,
        })
    }

    pub fn allocate_array(&mut self, class: &str, length: Operand) -> BuiltValue {
        self.push_with_result(|result| Instruction::Allocate {
            result,
            class: class.to_string(),
            length: Some(length),
        })
    }

    pub fn load(&mut self, object: ValueId, selector: FieldSelector, ty: Type) -> BuiltValue {
        self.push_with_result(|result| Instruction::Load {
            result,
            object,
            selector,
            ty,
        })
    }

    pub fn store(
        &mut self,
        object: ValueId,
        selector: FieldSelector,
        value: ValueId,
        ty: Type,
    ) -> NodeId {
        self.push_instruction(Instruction::Store {
            object,
            selector,
            value,
            ty,
        })
    }

    pub fn atomic_exchange(
        &mut self,
        object: ValueId,
        selector: FieldSelector,
        value: ValueId,
        ty: Type,
    ) -> BuiltValue {
        self.push_with_result(|result| Instruction::AtomicExchange {
            result,
            object,
            selector,
            value,
            ty,
        })
    }

    pub fn call(&mut self, callee: &str, args: Vec<ValueId>) -> NodeId {
        self.push_instruction(Instruction::Call {
            result: None,
            callee: callee.to_string(),
            args,
        })
    }

    pub fn call_value(&mut self, callee: &str, args: Vec<ValueId>) -> BuiltValue {
        self.push_with_result(|result| Instruction::Call {
            result: Some(result),
            callee: callee.to_string(),
            args,
        })
    }

    pub fn safepoint_poll(&mut self) -> NodeId {
        self.push_instruction(Instruction::SafepointPoll)
    }

    pub fn phi(&mut self, incoming: Vec<(BlockId, ValueId)>) -> ValueId {
        self.push_with_result(|result| Instruction::Phi { result, incoming })
            .value
    }

    fn terminate(&mut self, term: Terminator) {
        if let Err(e) = self.body.set_terminator(self.block_id, term) {
            self.errors.push(e);
        }
    }

    pub fn jump(&mut self, target: BlockId) {
        self.terminate(Terminator::Jump(target));
    }

    pub fn branch(&mut self, condition: ValueId, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::Branch {
            condition,
            then_block,
            else_block,
        });
    }

    pub fn loop_back(&mut self, header: BlockId, counted: bool) {
        self.terminate(Terminator::LoopBack { header, counted });
    }

    pub fn return_(&mut self, value: Option<ValueId>) {
        self.terminate(Terminator::Return(value));
    }
}
