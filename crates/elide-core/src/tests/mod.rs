/*! Barrier elision scenarios over hand-built methods.
 *
 * Every scenario builds a small method with the builder API, runs the full analysis stack and
 * checks the strength of each access. Together they pin down the matching table, the safepoint
 * rules, the loop handling and the failure modes.
 */

#![allow(unused_variables)]

mod config_tests;
mod fresh_object_tests;

use crate::barrier::{BarrierAnnotation, BarrierElisionEngine};
use crate::config::ElisionConfig;
use crate::method::Method;

pub(crate) fn analyze(method: &Method) -> BarrierAnnotation {
    analyze_with(method, &ElisionConfig::default())
}

pub(crate) fn analyze_with(method: &Method, config: &ElisionConfig) -> BarrierAnnotation {
    BarrierElisionEngine::run(method, config).unwrap()
}
