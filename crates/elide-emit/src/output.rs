use anyhow::Result;
use elide_core::barrier::AccessAnnotation;
use elide_core::{AccessKind, BarrierAnnotation, BarrierCounts, BarrierStrength};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodReport {
    pub name: String,
    pub counts: BarrierCounts,
    pub barriers_emitted: usize,
    pub barriers_elided: usize,
    pub accesses: Vec<AccessAnnotation>,
}

impl MethodReport {
    pub fn from_annotation(annotation: &BarrierAnnotation) -> Self {
        let counts = annotation.counts();
        Self {
            name: annotation.method.clone(),
            counts,
            barriers_emitted: counts.emitted(),
            barriers_elided: counts.elided(),
            accesses: annotation.iter().cloned().collect(),
        }
    }
}

/// Machine-readable form of one module's barrier decisions.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub module: String,
    pub methods: Vec<MethodReport>,
    pub totals: BarrierCounts,
}

impl JsonReport {
    pub fn new<'a>(
        module: impl Into<String>,
        annotations: impl IntoIterator<Item = &'a BarrierAnnotation>,
    ) -> Self {
        let methods: Vec<MethodReport> = annotations
            .into_iter()
            .map(MethodReport::from_annotation)
            .collect();
        let mut totals = BarrierCounts::default();
        for method in &methods {
            totals.add(&method.counts);
        }
        Self {
            module: module.into(),
            methods,
            totals,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

/// `method kind strength count` lines, one per kind and strength.
pub fn count_lines(annotation: &BarrierAnnotation) -> Vec<String> {
    let counts = annotation.counts();
    AccessKind::ALL
        .into_iter()
        .flat_map(|kind| BarrierStrength::ALL.into_iter().map(move |s| (kind, s)))
        .map(|(kind, strength)| {
            format!(
                "{} {} {} {}",
                annotation.method,
                kind,
                strength,
                counts.get(kind, strength)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use elide_core::{FieldSelector, MethodBuilder, Type};

    fn annotation() -> BarrierAnnotation {
        let mut builder = MethodBuilder::new("twice");
        let o = builder.param(Type::Ref);
        {
            let mut entry = builder.entry_block();
            entry.load(o, FieldSelector::Offset(16), Type::Ref);
            entry.load(o, FieldSelector::Offset(16), Type::Ref);
            entry.return_(None);
        }
        let method = builder.build().unwrap();
        elide_core::BarrierElisionEngine::run(&method, &Default::default()).unwrap()
    }

    #[test]
    fn test_count_lines_cover_every_pair() {
        let lines = count_lines(&annotation());
        assert_eq!(lines.len(), 12);
        assert!(lines.contains(&"twice load strong 1".to_string()));
        assert!(lines.contains(&"twice load elided 1".to_string()));
        assert!(lines.contains(&"twice atomic weak 0".to_string()));
    }

    #[test]
    fn test_json_report_totals() {
        let annotation = annotation();
        let report = JsonReport::new("demo", [&annotation, &annotation]);
        assert_eq!(report.totals.loads.strong, 2);
        assert_eq!(report.totals.loads.elided, 2);

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["module"], "demo");
        assert_eq!(value["methods"][0]["barriers_emitted"], 1);
        assert_eq!(value["methods"][0]["accesses"][1]["strength"], "elided");
        assert_eq!(value["methods"][0]["accesses"][1]["reason"]["rule"], "dominated");
    }
}
