/*! Parse the textual IR into `elide-core` methods.
 *
 * Barrier scenarios are far easier to write, diff and review as text than as builder calls. This
 * crate reads that text back into a [`Module`], rejecting duplicate or undefined values and
 * blocks, and collects any `; barrier: <strength>` notes so a file can state the result it
 * expects from the analysis.
 */

use elide_core::{IrError, Module};
use pest::Parser;
use pest_derive::Parser;
use std::path::Path;
use thiserror::Error;

pub mod annotations;
mod lower;

pub use annotations::BarrierExpectation;
pub use lower::ParsedModule;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct ElideParser;

pub type ParseResult<T> = Result<T, Box<pest::error::Error<Rule>>>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("@{method}: {value} is defined more than once")]
    DuplicateDefinition { method: String, value: String },
    #[error("@{method}: use of undefined value {value}")]
    UndefinedValue { method: String, value: String },
    #[error("@{method}: reference to undefined {block}")]
    UndefinedBlock { method: String, block: String },
    #[error("@{method}: {block} is declared twice")]
    DuplicateBlock { method: String, block: String },
    #[error("Method @{0} is declared twice")]
    DuplicateMethod(String),
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("Malformed input: {0}")]
    Malformed(String),
    #[error(transparent)]
    Ir(#[from] IrError),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub fn parse(input: &str) -> ParseResult<pest::iterators::Pairs<'_, Rule>> {
    ElideParser::parse(Rule::module, input).map_err(Box::new)
}

pub fn check(input: &str) -> bool {
    parse(input).is_ok()
}

/// Parses and lowers `input`, keeping any barrier notes found in the text.
pub fn parse_annotated(name: &str, input: &str) -> Result<ParsedModule, ParseError> {
    let mut pairs = parse(input)?;
    let module = pairs
        .next()
        .ok_or_else(|| ParseError::Malformed("empty parse result".to_string()))?;
    lower::lower_module(name, module)
}

pub fn parse_module(input: &str) -> Result<Module, ParseError> {
    parse_annotated("module", input).map(|parsed| parsed.module)
}

/// Reads and lowers a file; the module is named after the file stem.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedModule, ParseError> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());
    parse_annotated(&name, &input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elide_core::{BlockId, FieldSelector, Instruction, Terminator, Type, ValueId};

    #[test]
    fn test_empty_module() {
        assert!(check(""));
        assert!(parse_module("; nothing here\n").unwrap().methods.is_empty());
    }

    #[test]
    fn test_simple_method() {
        let input = r"
method @copy(v0: ref, v1: ref) {
block0:
    v2 = load.ref v0+16
    store.ref v1+16, v2
    return v2
}
";
        let module = parse_module(input).unwrap();
        let method = module.get_method("copy").unwrap();
        assert_eq!(method.params.len(), 2);
        assert_eq!(method.body.memory_accesses().count(), 2);

        let store = method.body.nodes().iter().find(|n| matches!(n.inst, Instruction::Store { .. })).unwrap();
        assert_eq!(
            store.inst,
            Instruction::Store {
                object: ValueId(1),
                selector: FieldSelector::Offset(16),
                value: ValueId(2),
                ty: Type::Ref,
            }
        );
    }

    #[test]
    fn test_every_instruction_form() {
        let input = r"
method @all(v0: ref, v1: ref) {
block0:
    v2 = load.ref v0+16
    v3 = load.int v0+-8
    store.ref v0+16, v1
    v4 = atomic_xchg.ref v0+16, v1
    v5 = new Outer
    v10 = iconst 3
    v6 = new Inner[v10]
    v7 = load.ref v6[3]
    v8 = load.ref v6[v10]
    call @blackhole(v2, v4)
    v9 = call @make()
    safepoint
    brif v10, block1, block2
block1:
    v11 = phi [block0: v2], [block1: v11]
    loop_back.counted block1
block2:
    return v2
}
";
        let module = parse_module(input).unwrap();
        let method = module.get_method("all").unwrap();
        assert_eq!(method.body.blocks.len(), 3);
        assert_eq!(
            method.body.get_block(BlockId(1)).unwrap().terminator,
            Terminator::LoopBack {
                header: BlockId(1),
                counted: true
            }
        );
        let selectors: Vec<FieldSelector> = method
            .body
            .nodes()
            .iter()
            .filter_map(|n| match &n.inst {
                Instruction::Load { selector, .. } => Some(*selector),
                _ => None,
            })
            .collect();
        assert_eq!(
            selectors,
            vec![
                FieldSelector::Offset(16),
                FieldSelector::Offset(-8),
                FieldSelector::Element(3),
                FieldSelector::UnknownIndex(ValueId(10)),
            ]
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_module("method @broken( {").unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }

    #[test]
    fn test_duplicate_definition() {
        let input = r"
method @dup(v0: ref) {
block0:
    v1 = load.ref v0+8
    v1 = load.ref v0+8
    return
}
";
        assert!(matches!(
            parse_module(input),
            Err(ParseError::DuplicateDefinition { .. })
        ));
    }

    #[test]
    fn test_undefined_value_and_block() {
        let undefined_value = r"
method @m(v0: ref) {
block0:
    store.ref v0+8, v9
    return
}
";
        assert!(matches!(
            parse_module(undefined_value),
            Err(ParseError::UndefinedValue { .. })
        ));

        let undefined_block = r"
method @m(v0: ref) {
block0:
    jump block4
}
";
        assert!(matches!(
            parse_module(undefined_block),
            Err(ParseError::UndefinedBlock { .. })
        ));
    }

    #[test]
    fn test_barrier_notes_become_expectations() {
        let input = r"
method @m(v0: ref) {
block0:
    [1] v1 = load.ref v0+8 ; barrier: strong (no dominating fact)
    [2] v2 = load.ref v0+8 ; barrier: elided
    ; an ordinary comment
    return
}
";
        let parsed = parse_annotated("notes", input).unwrap();
        assert_eq!(parsed.module.name, "notes");
        assert_eq!(parsed.expectations.len(), 2);
        assert_eq!(parsed.expectations[1].node, elide_core::NodeId(2));
        assert_eq!(
            parsed.expectations[0].note.as_deref(),
            Some("no dominating fact")
        );
    }
}
