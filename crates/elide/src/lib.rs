/*! Barrier elision analysis behind a single import.
 *
 * Parse textual IR, run the elision engine over every method, and print the result as annotated
 * text or a JSON report. The member crates stay reachable for anything finer grained.
 */

pub use elide_core as core;
pub use elide_emit as emit;
pub use elide_parser as parser;

pub use elide_core::{
    AccessKind, BarrierAnnotation, BarrierCounts, BarrierElisionEngine, BarrierStrength,
    BlockId, ElisionConfig, FieldSelector, Instruction, IrError, Method, MethodBuilder, Module,
    NodeId, Terminator, Type,
};

pub use elide_emit::{AnnotatedEmitter, Emitter, IrEmitter, JsonReport};

pub use elide_parser::{parse_annotated, parse_module, ParseError};

/// Parses `input` and runs the engine on each of its methods, in order.
pub fn analyze_text(input: &str, config: &ElisionConfig) -> anyhow::Result<Vec<BarrierAnnotation>> {
    let module = parse_module(input)?;
    let annotations = module
        .methods
        .values()
        .map(|method| BarrierElisionEngine::run(method, config))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(annotations)
}
