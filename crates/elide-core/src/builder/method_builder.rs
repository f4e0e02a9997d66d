use super::BlockBuilder;
use crate::{
    block::BlockId,
    method::Method,
    types::Type,
    values::ValueId,
    IrError, Result,
};

pub struct MethodBuilder {
    method: Method,
    errors: Vec<IrError>,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            method: Method::new(name),
            errors: Vec::new(),
        }
    }

    pub fn param(&mut self, ty: Type) -> ValueId {
        let value = self.method.body.fresh_value();
        if let Err(e) = self.method.add_param(value, ty) {
            self.errors.push(e);
        }
        value
    }

    pub fn create_block(&mut self) -> BlockId {
        self.method.body.create_block()
    }

    pub fn entry_block(&mut self) -> BlockBuilder<'_> {
        let entry = self.method.body.entry_block;
        self.block(entry)
    }

    pub fn block(&mut self, block_id: BlockId) -> BlockBuilder<'_> {
        if self.method.body.get_block(block_id).is_none() {
            self.errors.push(IrError::UnknownBlock(block_id));
        }
        BlockBuilder::new(block_id, &mut self.method.body, &mut self.errors)
    }

    pub fn current_method(&self) -> &Method {
        &self.method
    }

    /// Finishes the method, reporting the first construction error and
    /// rejecting blocks left without a terminator.
    pub fn build(mut self) -> Result<Method> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        if let Some(block) = self
            .method
            .body
            .blocks
            .values()
            .find(|block| !block.is_terminated())
        {
            return Err(IrError::BuilderError(format!(
                "{} in method {} has no terminator",
                block.id, self.method.name
            )));
        }

        Ok(self.method)
    }
}
