use crate::{
    block::Terminator,
    instructions::{FieldSelector, Instruction},
    method::Method,
    values::ValueId,
};
use std::fmt::{self, Write};

pub struct Address<'a> {
    pub object: ValueId,
    pub selector: &'a FieldSelector,
}

impl fmt::Display for Address<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.selector {
            FieldSelector::Offset(offset) => write!(f, "{}+{}", self.object, offset),
            FieldSelector::Element(index) => write!(f, "{}[{}]", self.object, index),
            FieldSelector::UnknownIndex(index) => write!(f, "{}[{}]", self.object, index),
        }
    }
}

fn join_values(values: &[ValueId]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Param { result, index, ty } => {
                write!(f, "{} = param.{} {}", result, ty, index)
            }
            Instruction::Iconst { result, value } => write!(f, "{} = iconst {}", result, value),
            Instruction::Allocate {
                result,
                class,
                length,
            } => match length {
                Some(length) => write!(f, "{} = new {}[{}]", result, class, length),
                None => write!(f, "{} = new {}", result, class),
            },
            Instruction::Load {
                result,
                object,
                selector,
                ty,
            } => write!(
                f,
                "{} = load.{} {}",
                result,
                ty,
                Address {
                    object: *object,
                    selector
                }
            ),
            Instruction::Store {
                object,
                selector,
                value,
                ty,
            } => write!(
                f,
                "store.{} {}, {}",
                ty,
                Address {
                    object: *object,
                    selector
                },
                value
            ),
            Instruction::AtomicExchange {
                result,
                object,
                selector,
                value,
                ty,
            } => write!(
                f,
                "{} = atomic_xchg.{} {}, {}",
                result,
                ty,
                Address {
                    object: *object,
                    selector
                },
                value
            ),
            Instruction::Call {
                result,
                callee,
                args,
            } => {
                if let Some(result) = result {
                    write!(f, "{} = ", result)?;
                }
                write!(f, "call @{}({})", callee, join_values(args))
            }
            Instruction::SafepointPoll => f.write_str("safepoint"),
            Instruction::Phi { result, incoming } => {
                let arms = incoming
                    .iter()
                    .map(|(block, value)| format!("[{}: {}]", block, value))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{} = phi {}", result, arms)
            }
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Jump(target) => write!(f, "jump {}", target),
            Terminator::Branch {
                condition,
                then_block,
                else_block,
            } => write!(f, "brif {}, {}, {}", condition, then_block, else_block),
            Terminator::LoopBack { header, counted } => {
                if *counted {
                    write!(f, "loop_back.counted {}", header)
                } else {
                    write!(f, "loop_back {}", header)
                }
            }
            Terminator::Return(Some(value)) => write!(f, "return {}", value),
            Terminator::Return(None) => f.write_str("return"),
            Terminator::Invalid => f.write_str("; <unterminated>"),
        }
    }
}

pub fn format_signature(method: &Method) -> String {
    let params = method
        .params
        .iter()
        .map(|p| format!("{}: {}", p.value, p.ty))
        .collect::<Vec<_>>()
        .join(", ");
    format!("method @{}({})", method.name, params)
}

/// Textual form of a method, accepted back by the parser.
pub fn format_method(method: &Method) -> String {
    let mut output = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(&mut output, "{} {{", format_signature(method));

    for (block_id, block) in &method.body.blocks {
        let _ = writeln!(&mut output, "{}:", block_id);
        for node in method.body.block_nodes(*block_id) {
            if matches!(node.inst, Instruction::Param { .. }) {
                continue;
            }
            let _ = writeln!(&mut output, "    {}", node.inst);
        }
        let _ = writeln!(&mut output, "    {}", block.terminator);
    }

    output.push_str("}\n");
    output
}
