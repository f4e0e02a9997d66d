use crate::{method::Method, module::Module};
use anyhow::Result;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisID {
    ControlFlow,
    Dominator,
    LoopAnalysis,
    Safepoint,
    BarrierElision,
    Custom(&'static str),
}

/// A per-method analysis whose result the [`PassManager`] can cache.
pub trait AnalysisPass: Send + Sync {
    type Result: Clone + Any + Send + Sync;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn analyze(&mut self, method: &Method) -> Result<Self::Result>;

    fn analyze_module(&mut self, module: &Module) -> Result<IndexMap<String, Self::Result>> {
        let mut results = IndexMap::new();
        for (name, method) in &module.methods {
            results.insert(name.clone(), self.analyze(method)?);
        }
        Ok(results)
    }

    fn analysis_id(&self) -> AnalysisID;

    /// Settings that change the result. Results computed under different
    /// tags are cached apart.
    fn cache_tag(&self) -> String {
        String::new()
    }
}

type CacheKey = (AnalysisID, String, String);

#[derive(Debug, Clone)]
pub struct PassStatistics {
    pub name: String,
    pub method: String,
    pub duration: Duration,
}

pub struct PassManager {
    analysis_cache: HashMap<CacheKey, Box<dyn Any + Send + Sync>>,
    statistics: Vec<PassStatistics>,
    collect_stats: bool,
}

impl PassManager {
    pub fn new() -> Self {
        Self {
            analysis_cache: HashMap::new(),
            statistics: Vec::new(),
            collect_stats: false,
        }
    }

    pub fn enable_statistics(&mut self) {
        self.collect_stats = true;
    }

    /// Runs `pass` on every method of `module`, reusing cached results.
    /// Stops at the first method the pass fails on.
    pub fn run<A: AnalysisPass>(
        &mut self,
        pass: &mut A,
        module: &Module,
    ) -> Result<IndexMap<String, A::Result>> {
        let mut results = IndexMap::new();
        for (name, method) in &module.methods {
            let scope = Self::scope(module, name);
            let result = self.get_or_compute(pass, &scope, method)?;
            results.insert(name.clone(), result);
        }
        Ok(results)
    }

    /// Cache scope of one method: `module::method`.
    pub fn scope(module: &Module, method: &str) -> String {
        format!("{}::{}", module.name, method)
    }

    fn get_or_compute<A: AnalysisPass>(
        &mut self,
        pass: &mut A,
        scope: &str,
        method: &Method,
    ) -> Result<A::Result> {
        let key = (pass.analysis_id(), scope.to_string(), pass.cache_tag());

        if let Some(cached) = self
            .analysis_cache
            .get(&key)
            .and_then(|boxed| boxed.downcast_ref::<A::Result>())
        {
            debug!(pass = pass.name(), scope, "using cached analysis");
            return Ok(cached.clone());
        }

        let start = Instant::now();
        let result = pass.analyze(method)?;

        if self.collect_stats {
            self.statistics.push(PassStatistics {
                name: pass.name().to_string(),
                method: scope.to_string(),
                duration: start.elapsed(),
            });
        }

        self.analysis_cache.insert(key, Box::new(result.clone()));
        Ok(result)
    }

    pub fn is_analysis_valid(&self, scope: &str, analysis_id: AnalysisID) -> bool {
        self.analysis_cache
            .keys()
            .any(|(id, name, _)| *id == analysis_id && name == scope)
    }

    /// Forgets every analysis of one method, e.g. after it was rebuilt.
    pub fn invalidate(&mut self, scope: &str) {
        self.analysis_cache.retain(|(_, name, _), _| name != scope);
    }

    pub fn statistics(&self) -> &[PassStatistics] {
        &self.statistics
    }

    pub fn clear_cache(&mut self) {
        self.analysis_cache.clear();
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
