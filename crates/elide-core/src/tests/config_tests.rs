use super::{analyze, analyze_with};
use crate::barrier::{AccessKind, BarrierStrength};
use crate::builder::MethodBuilder;
use crate::config::ElisionConfig;
use crate::instructions::FieldSelector;
use crate::method::Method;
use crate::types::Type;

fn mixed_method() -> Method {
    let mut builder = MethodBuilder::new("mixed");
    let o = builder.param(Type::Ref);
    let v = builder.param(Type::Ref);
    {
        let mut entry = builder.entry_block();
        let fresh = entry.allocate("Box");
        entry.store(fresh.value, FieldSelector::Offset(8), v, Type::Ref);
        entry.load(o, FieldSelector::Offset(8), Type::Ref);
        entry.load(o, FieldSelector::Offset(8), Type::Ref);
        entry.atomic_exchange(o, FieldSelector::Offset(8), v, Type::Ref);
        entry.load(o, FieldSelector::Offset(16), Type::Int);
        entry.return_(None);
    }
    builder.build().unwrap()
}

#[test]
fn test_default_counts() {
    let annotation = analyze(&mixed_method());
    let counts = annotation.counts();

    assert_eq!(counts.get(AccessKind::Store, BarrierStrength::Elided), 1);
    assert_eq!(counts.get(AccessKind::Load, BarrierStrength::Strong), 1);
    assert_eq!(counts.get(AccessKind::Load, BarrierStrength::Elided), 1);
    assert_eq!(counts.get(AccessKind::Load, BarrierStrength::None), 1);
    assert_eq!(counts.get(AccessKind::Atomic, BarrierStrength::Weak), 1);
    assert_eq!(counts.emitted(), 2);
}

#[test]
fn test_conservative_config_keeps_every_barrier() {
    let annotation = analyze_with(&mixed_method(), &ElisionConfig::conservative());

    for entry in annotation.iter() {
        let expected = if entry.kind == AccessKind::Load && entry.key.selector == FieldSelector::Offset(16) {
            BarrierStrength::None
        } else {
            BarrierStrength::Strong
        };
        assert_eq!(entry.strength, expected, "{}", entry.node);
    }
}

#[test]
fn test_config_never_strengthens_below_default() {
    let method = mixed_method();
    let default = analyze(&method);
    let conservative = analyze_with(&method, &ElisionConfig::conservative());

    for entry in default.iter() {
        let other = conservative.strength_of(entry.node).unwrap();
        assert!(other >= entry.strength, "{} got weaker", entry.node);
    }
}
