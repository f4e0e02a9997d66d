use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Switches for the barrier elision analysis. Every switch only ever makes
/// the analysis more conservative when turned off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElisionConfig {
    /// Elide barriers on objects allocated with no safepoint since.
    pub fresh_object_elision: bool,
    /// Elide barriers covered by an earlier access to the same key.
    pub dominating_access_elision: bool,
    /// Emit a `Weak` barrier for an atomic covered by an earlier load.
    pub atomic_partial_elision: bool,
    /// Treat back-edges of counted loops as pollable.
    pub counted_loops_poll: bool,
}

impl Default for ElisionConfig {
    fn default() -> Self {
        Self {
            fresh_object_elision: true,
            dominating_access_elision: true,
            atomic_partial_elision: true,
            counted_loops_poll: false,
        }
    }
}

impl ElisionConfig {
    /// Every elision disabled: all reference accesses stay `Strong`.
    pub fn conservative() -> Self {
        Self {
            fresh_object_elision: false,
            dominating_access_elision: false,
            atomic_partial_elision: false,
            counted_loops_poll: true,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::IrError::ConfigError(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::IrError::ConfigError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&content)
    }
}
