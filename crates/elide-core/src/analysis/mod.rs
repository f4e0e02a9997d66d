/*! Control-flow, dominance and safepoint analyses.
 *
 * Deciding whether a barrier is redundant needs to know which accesses dominate which, where the
 * collector may run, and which loops poll on their back-edges. These analyses answer those
 * questions for one method at a time and feed the barrier elision engine.
 */

pub mod cfg;
pub mod def_use;
pub mod dominator;
pub mod escape;
pub mod loops;
pub mod pass;
pub mod passes;
pub mod safepoint;

pub use cfg::ControlFlowGraph;
pub use def_use::{DefKind, DefUseChains, Definition, Use, UseKind};
pub use dominator::DominatorTree;
pub use escape::EscapeAnalysis;
pub use loops::{BackEdge, Loop, LoopAnalysis};
pub use pass::{AnalysisID, AnalysisPass, PassManager, PassStatistics};
pub use passes::{
    BarrierElisionPass, ControlFlowAnalysisPass, DominatorAnalysisPass, LoopAnalysisPass,
    SafepointAnalysisPass,
};
pub use safepoint::SafepointMap;
