/*! Turn analyzed IR back into text.
 *
 * Barrier decisions are easiest to review next to the code they apply to. The plain emitter prints
 * the textual IR the parser reads; the annotated emitter adds position markers, a per-method summary
 * and a `; barrier:` comment on every access, and the JSON report serves scripts and dashboards.
 */

pub mod annotated_emitter;
pub mod config;
pub mod emitter;
pub mod ir_emitter;
pub mod output;

pub use annotated_emitter::{AnnotatedEmitter, VisualCue};
pub use config::{AnnotationConfig, EmitterConfig, IndentStyle, VerbosityLevel};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use ir_emitter::{IrEmitter, LineComment, LineDecorator};
pub use output::{count_lines, JsonReport, MethodReport, OutputFormat};
