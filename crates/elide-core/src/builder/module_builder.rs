use crate::{method::Method, module::Module};

pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Module::new(name),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.module.add_method(method);
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}
