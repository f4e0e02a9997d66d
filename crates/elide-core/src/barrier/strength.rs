use serde::{Deserialize, Serialize};
use std::fmt;

/// Barrier required at an access, weakest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BarrierStrength {
    /// No barrier: the access is not a reference access.
    None,
    /// A barrier was needed and proven redundant.
    Elided,
    /// Read-side half only.
    Weak,
    /// Full barrier.
    Strong,
}

impl BarrierStrength {
    pub const ALL: [BarrierStrength; 4] = [
        BarrierStrength::None,
        BarrierStrength::Elided,
        BarrierStrength::Weak,
        BarrierStrength::Strong,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BarrierStrength::None => "none",
            BarrierStrength::Elided => "elided",
            BarrierStrength::Weak => "weak",
            BarrierStrength::Strong => "strong",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Whether code generation has to emit anything for this access.
    pub fn emits_barrier(&self) -> bool {
        matches!(self, BarrierStrength::Weak | BarrierStrength::Strong)
    }
}

impl fmt::Display for BarrierStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
