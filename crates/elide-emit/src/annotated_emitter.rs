use crate::config::{AnnotationConfig, EmitterConfig, VerbosityLevel};
use crate::emitter::{EmitContext, EmitResult, Emitter};
use crate::ir_emitter::{IrEmitter, LineComment, LineDecorator};
use anyhow::{Context, Result};
use elide_core::{
    AccessKind, BarrierAnnotation, BarrierElisionEngine, BarrierStrength, ElisionConfig,
    Instruction, Method, Module, Node,
};
use indexmap::IndexMap;
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub enum VisualCue {
    Strong,
    Weak,
    Elided,
    NoBarrier,
}

impl VisualCue {
    pub fn for_strength(strength: BarrierStrength) -> Self {
        match strength {
            BarrierStrength::Strong => Self::Strong,
            BarrierStrength::Weak => Self::Weak,
            BarrierStrength::Elided => Self::Elided,
            BarrierStrength::None => Self::NoBarrier,
        }
    }

    fn to_emoji(self) -> &'static str {
        match self {
            Self::Strong => "🔴",
            Self::Weak => "🟡",
            Self::Elided => "🟢",
            Self::NoBarrier => "⚪",
        }
    }

    fn to_ascii(self) -> &'static str {
        match self {
            Self::Strong => "[STRONG]",
            Self::Weak => "[WEAK]",
            Self::Elided => "[ELIDED]",
            Self::NoBarrier => "[NONE]",
        }
    }

    pub fn format(self, use_ascii: bool) -> &'static str {
        if use_ascii {
            self.to_ascii()
        } else {
            self.to_emoji()
        }
    }
}

fn strength_color(strength: BarrierStrength) -> &'static str {
    match strength {
        BarrierStrength::Strong => "red",
        BarrierStrength::Weak => "yellow",
        BarrierStrength::Elided => "green",
        BarrierStrength::None => "bright black",
    }
}

fn kind_label(kind: AccessKind) -> &'static str {
    match kind {
        AccessKind::Load => "loads",
        AccessKind::Store => "stores",
        AccessKind::Atomic => "atomics",
    }
}

/// Textual IR with a barrier summary per method and the chosen strength on
/// every access. With colors off the output parses back, and the parser
/// reads each `; barrier:` comment as an expectation.
pub struct AnnotatedEmitter {
    base_emitter: IrEmitter,
    annotation_config: AnnotationConfig,
    annotations: IndexMap<String, BarrierAnnotation>,
}

impl AnnotatedEmitter {
    pub fn new(annotations: impl IntoIterator<Item = BarrierAnnotation>) -> Self {
        Self {
            base_emitter: IrEmitter::new(),
            annotation_config: AnnotationConfig::default(),
            annotations: annotations
                .into_iter()
                .map(|a| (a.method.clone(), a))
                .collect(),
        }
    }

    /// Runs the elision engine on every method of `module`.
    pub fn analyze(module: &Module, config: &ElisionConfig) -> Result<Self> {
        let annotations = module
            .methods
            .values()
            .map(|method| {
                BarrierElisionEngine::run(method, config)
                    .with_context(|| format!("barrier elision failed for method @{}", method.name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(annotations))
    }

    pub fn with_config(mut self, config: EmitterConfig) -> Self {
        self.base_emitter = IrEmitter::with_config(config);
        self
    }

    pub fn with_annotation_config(mut self, config: AnnotationConfig) -> Self {
        self.annotation_config = config;
        self
    }

    pub fn annotation(&self, method: &str) -> Option<&BarrierAnnotation> {
        self.annotations.get(method)
    }

    pub fn annotations(&self) -> impl Iterator<Item = &BarrierAnnotation> {
        self.annotations.values()
    }

    fn decorator<'a>(&'a self, method: &Method) -> MethodDecorator<'a> {
        MethodDecorator {
            annotation: self.annotations.get(&method.name),
            config: &self.annotation_config,
            verbosity: self.base_emitter.config().verbosity,
        }
    }
}

impl Emitter for AnnotatedEmitter {
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
            let decorator = self.decorator(method);
            self.base_emitter
                .emit_method_with(method, writer, context, &decorator)?;
        }
        Ok(())
    }

    fn context(&self) -> EmitContext {
        self.base_emitter.context()
    }
}

struct MethodDecorator<'a> {
    annotation: Option<&'a BarrierAnnotation>,
    config: &'a AnnotationConfig,
    verbosity: VerbosityLevel,
}

impl MethodDecorator<'_> {
    fn summary(&self, annotation: &BarrierAnnotation) -> Vec<String> {
        let counts = annotation.counts();
        let mut lines = Vec::new();

        for strength in BarrierStrength::ALL.into_iter().rev() {
            let per_kind: Vec<String> = AccessKind::ALL
                .into_iter()
                .filter_map(|kind| {
                    let n = counts.get(kind, strength);
                    (n > 0).then(|| format!("{} {}", kind_label(kind), n))
                })
                .collect();
            if per_kind.is_empty() {
                continue;
            }

            let total: usize = AccessKind::ALL
                .into_iter()
                .map(|kind| counts.get(kind, strength))
                .sum();
            let cue = if self.config.emit_visual_cues {
                format!(
                    "{} ",
                    VisualCue::for_strength(strength).format(self.config.use_ascii_cues)
                )
            } else {
                String::new()
            };
            lines.push(format!(
                "- {}{}: {} ({})",
                cue,
                strength,
                total,
                per_kind.join(", ")
            ));
        }

        lines.push(format!(
            "- barriers emitted: {}, elided: {}",
            counts.emitted(),
            counts.elided()
        ));
        lines
    }
}

impl LineDecorator for MethodDecorator<'_> {
    fn method_header(&self, method: &Method) -> Vec<String> {
        if !self.config.emit_method_headers {
            return Vec::new();
        }

        let mut lines = vec![format!("### Method: {}", method.name)];
        match self.annotation {
            None => lines.push("- not analyzed".to_string()),
            Some(annotation) if annotation.is_empty() => {
                lines.push("- no memory accesses".to_string())
            }
            Some(annotation) => lines.extend(self.summary(annotation)),
        }
        lines
    }

    fn node_prefix(&self, node: &Node) -> Option<String> {
        self.config
            .emit_position_markers
            .then(|| node.id.to_string())
    }

    fn node_comment(&self, node: &Node) -> Option<LineComment> {
        let entry = self
            .annotation
            .filter(|_| self.config.emit_barrier_comments)
            .and_then(|annotation| annotation.get(node.id));

        if let Some(entry) = entry {
            let mut text = format!("barrier: {}", entry.strength);
            match (
                self.verbosity.should_print_reasons(),
                self.verbosity.should_print_keys(),
            ) {
                (true, true) => text.push_str(&format!(" ({}, key {})", entry.reason, entry.key)),
                (true, false) => text.push_str(&format!(" ({})", entry.reason)),
                _ => {}
            }
            return Some(LineComment {
                text,
                color: strength_color(entry.strength),
            });
        }

        let marks_safepoint = self.verbosity.should_print_safepoints()
            && node.inst.is_safepoint()
            && !matches!(node.inst, Instruction::SafepointPoll);
        marks_safepoint.then(|| LineComment {
            text: "safepoint".to_string(),
            color: "magenta",
        })
    }
}
