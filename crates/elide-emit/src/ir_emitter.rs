use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
use elide_core::format::format_signature;
use elide_core::{Instruction, Method, Module, Node};
use std::io::Write;

/// Trailing comment for one instruction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineComment {
    pub text: String,
    pub color: &'static str,
}

/// Hooks that let other emitters add markers and comments to the plain text
/// without changing anything the parser reads back.
pub trait LineDecorator {
    /// Comment lines written above the method signature.
    fn method_header(&self, _method: &Method) -> Vec<String> {
        Vec::new()
    }

    fn node_prefix(&self, _node: &Node) -> Option<String> {
        None
    }

    fn node_comment(&self, _node: &Node) -> Option<LineComment> {
        None
    }
}

pub struct Undecorated;

impl LineDecorator for Undecorated {}

/// Prints modules in the textual IR accepted by `elide-parser`.
#[derive(Debug, Clone)]
pub struct IrEmitter {
    config: EmitterConfig,
}

impl IrEmitter {
    pub fn new() -> Self {
        Self {
            config: EmitterConfig::plain(),
        }
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn emit_method<W: Write>(
        &self,
        method: &Method,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        self.emit_method_with(method, writer, context, &Undecorated)
    }

    pub fn emit_method_with<W: Write, D: LineDecorator + ?Sized>(
        &self,
        method: &Method,
        writer: &mut W,
        context: &mut EmitContext,
        decorator: &D,
    ) -> EmitResult {
        for line in decorator.method_header(method) {
            EmitHelper::write_comment(writer, context, &line)?;
        }

        EmitHelper::write_block(writer, context, &format_signature(method), |w, ctx| {
            let body = ctx.nested();
            for (block_id, block) in &method.body.blocks {
                EmitHelper::write_line(w, ctx, &format!("{}:", block_id))?;

                for node in method.body.block_nodes(*block_id) {
                    if matches!(node.inst, Instruction::Param { .. }) {
                        continue;
                    }
                    let line = Self::decorated_line(node, &body, decorator);
                    EmitHelper::write_line(w, &body, &line)?;
                }

                EmitHelper::write_line(w, &body, &block.terminator.to_string())?;
            }
            Ok(())
        })
    }

    fn decorated_line<D: LineDecorator + ?Sized>(
        node: &Node,
        context: &EmitContext,
        decorator: &D,
    ) -> String {
        let mut line = String::new();
        if let Some(prefix) = decorator.node_prefix(node) {
            line.push_str(&prefix);
            line.push(' ');
        }
        line.push_str(&node.inst.to_string());
        if let Some(comment) = decorator.node_comment(node) {
            line.push(' ');
            line.push_str(&EmitHelper::colorize(
                context,
                &format!("; {}", comment.text),
                comment.color,
            ));
        }
        line
    }
}

impl Default for IrEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter for IrEmitter {
    type Item = Module;

    fn emit<W: Write>(
        &self,
        module: &Module,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        for (index, method) in module.methods.values().enumerate() {
            if index > 0 {
                writeln!(writer)?;
            }
            self.emit_method(method, writer, context)?;
        }
        Ok(())
    }

    fn context(&self) -> EmitContext {
        EmitContext::from_config(&self.config)
    }
}
