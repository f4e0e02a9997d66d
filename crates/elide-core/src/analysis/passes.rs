use super::{
    AnalysisID, AnalysisPass, ControlFlowGraph, DominatorTree, LoopAnalysis, SafepointMap,
};
use crate::barrier::{BarrierAnnotation, BarrierElisionEngine};
use crate::config::ElisionConfig;
use crate::method::Method;
use anyhow::{Context, Result};

pub struct ControlFlowAnalysisPass;

impl AnalysisPass for ControlFlowAnalysisPass {
    type Result = ControlFlowGraph;

    fn name(&self) -> &'static str {
        "control-flow-analysis"
    }

    fn analyze(&mut self, method: &Method) -> Result<Self::Result> {
        Ok(ControlFlowGraph::build(&method.body)?)
    }

    fn analysis_id(&self) -> AnalysisID {
        AnalysisID::ControlFlow
    }
}

pub struct DominatorAnalysisPass;

impl AnalysisPass for DominatorAnalysisPass {
    type Result = DominatorTree;

    fn name(&self) -> &'static str {
        "dominator-analysis"
    }

    fn analyze(&mut self, method: &Method) -> Result<Self::Result> {
        let cfg = ControlFlowGraph::build(&method.body)?;
        Ok(DominatorTree::build(&cfg))
    }

    fn analysis_id(&self) -> AnalysisID {
        AnalysisID::Dominator
    }
}

#[derive(Default)]
pub struct LoopAnalysisPass {
    pub counted_loops_poll: bool,
}

impl AnalysisPass for LoopAnalysisPass {
    type Result = LoopAnalysis;

    fn name(&self) -> &'static str {
        "loop-analysis"
    }

    fn description(&self) -> &'static str {
        "Finds back-edges, rejects irreducible control flow and marks polling edges"
    }

    fn analyze(&mut self, method: &Method) -> Result<Self::Result> {
        let cfg = ControlFlowGraph::build(&method.body)?;
        let domtree = DominatorTree::build(&cfg);
        Ok(LoopAnalysis::build(
            &method.body,
            &cfg,
            &domtree,
            self.counted_loops_poll,
        )?)
    }

    fn analysis_id(&self) -> AnalysisID {
        AnalysisID::LoopAnalysis
    }

    fn cache_tag(&self) -> String {
        format!("counted_loops_poll={}", self.counted_loops_poll)
    }
}

#[derive(Default)]
pub struct SafepointAnalysisPass {
    pub counted_loops_poll: bool,
}

impl AnalysisPass for SafepointAnalysisPass {
    type Result = SafepointMap;

    fn name(&self) -> &'static str {
        "safepoint-analysis"
    }

    fn analyze(&mut self, method: &Method) -> Result<Self::Result> {
        let cfg = ControlFlowGraph::build(&method.body)?;
        let domtree = DominatorTree::build(&cfg);
        let loops = LoopAnalysis::build(&method.body, &cfg, &domtree, self.counted_loops_poll)?;
        Ok(SafepointMap::build(&method.body, &cfg, &loops))
    }

    fn analysis_id(&self) -> AnalysisID {
        AnalysisID::Safepoint
    }

    fn cache_tag(&self) -> String {
        format!("counted_loops_poll={}", self.counted_loops_poll)
    }
}

#[derive(Default)]
pub struct BarrierElisionPass {
    pub config: ElisionConfig,
}

impl BarrierElisionPass {
    pub fn new(config: ElisionConfig) -> Self {
        Self { config }
    }
}

impl AnalysisPass for BarrierElisionPass {
    type Result = BarrierAnnotation;

    fn name(&self) -> &'static str {
        "barrier-elision"
    }

    fn description(&self) -> &'static str {
        "Classifies every reference access as elided, weak or strong"
    }

    fn analyze(&mut self, method: &Method) -> Result<Self::Result> {
        BarrierElisionEngine::run(method, &self.config)
            .with_context(|| format!("barrier elision failed for method @{}", method.name))
    }

    fn analysis_id(&self) -> AnalysisID {
        AnalysisID::BarrierElision
    }

    fn cache_tag(&self) -> String {
        format!("{:?}", self.config)
    }
}
