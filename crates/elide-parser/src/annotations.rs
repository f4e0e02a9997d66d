use crate::Rule;
use elide_core::{BarrierStrength, NodeId};
use pest::iterators::Pair;

/// A `; barrier: <strength>` note attached to an instruction in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierExpectation {
    pub method: String,
    pub node: NodeId,
    pub strength: BarrierStrength,
    pub note: Option<String>,
}

/// Value of a `[n]` position marker on a line, if present.
pub fn extract_position(pair: &Pair<Rule>) -> Option<usize> {
    pair.clone()
        .into_inner()
        .find(|p| p.as_rule() == Rule::position)
        .and_then(|p| {
            p.as_str()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse()
                .ok()
        })
}

/// Strength and trailing text of a `barrier_note` pair.
pub fn parse_barrier_note(pair: Pair<Rule>) -> Option<(BarrierStrength, Option<String>)> {
    let mut strength = None;
    let mut note = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::strength_name => strength = BarrierStrength::from_name(inner.as_str()),
            Rule::note_rest => {
                let text = inner
                    .as_str()
                    .trim()
                    .trim_start_matches('(')
                    .trim_end_matches(')')
                    .trim();
                if !text.is_empty() {
                    note = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    strength.map(|s| (s, note))
}
