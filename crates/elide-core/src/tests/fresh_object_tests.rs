use super::{analyze, analyze_with};
use crate::barrier::{BarrierStrength, ElisionReason};
use crate::builder::MethodBuilder;
use crate::config::ElisionConfig;
use crate::instructions::FieldSelector;
use crate::types::Type;
use crate::values::Operand;

const FIELD: FieldSelector = FieldSelector::Offset(8);

#[test]
fn test_fresh_store_and_load() {
    let mut builder = MethodBuilder::new("init");
    let v = builder.param(Type::Ref);
    let (store, load) = {
        let mut entry = builder.entry_block();
        let obj = entry.allocate("Pair");
        let store = entry.store(obj.value, FIELD, v, Type::Ref);
        let load = entry.load(obj.value, FieldSelector::Offset(16), Type::Ref).node;
        entry.return_(Some(obj.value));
        (store, load)
    };
    let method = builder.build().unwrap();
    let annotation = analyze(&method);

    assert_eq!(annotation.strength_of(store), Some(BarrierStrength::Elided));
    assert_eq!(annotation.strength_of(load), Some(BarrierStrength::Elided));
}

#[test]
fn test_call_ends_freshness() {
    let mut builder = MethodBuilder::new("call");
    let (before, after) = {
        let mut entry = builder.entry_block();
        let obj = entry.allocate("Box");
        let before = entry.load(obj.value, FIELD, Type::Ref).node;
        entry.call("gc", vec![]);
        let after = entry.load(obj.value, FIELD, Type::Ref).node;
        entry.return_(None);
        (before, after)
    };
    let method = builder.build().unwrap();
    let annotation = analyze(&method);

    assert_eq!(annotation.strength_of(before), Some(BarrierStrength::Elided));
    assert_eq!(annotation.strength_of(after), Some(BarrierStrength::Strong));
}

#[test]
fn test_publication_ends_freshness() {
    let mut builder = MethodBuilder::new("publish");
    let holder = builder.param(Type::Ref);
    let after = {
        let mut entry = builder.entry_block();
        let obj = entry.allocate("Box");
        entry.store(holder, FIELD, obj.value, Type::Ref);
        let after = entry.load(obj.value, FIELD, Type::Ref).node;
        entry.return_(None);
        after
    };
    let method = builder.build().unwrap();
    let annotation = analyze(&method);

    assert_eq!(annotation.strength_of(after), Some(BarrierStrength::Strong));
}

#[test]
fn test_publication_on_a_side_path() {
    let mut builder = MethodBuilder::new("sidePublish");
    let holder = builder.param(Type::Ref);
    let cond = builder.param(Type::Int);
    let publish = builder.create_block();
    let merge = builder.create_block();

    let obj = {
        let mut entry = builder.entry_block();
        let obj = entry.allocate("Box");
        entry.branch(cond, publish, merge);
        obj
    };
    {
        let mut b = builder.block(publish);
        b.store(holder, FIELD, obj.value, Type::Ref);
        b.jump(merge);
    }
    let load = {
        let mut b = builder.block(merge);
        let load = b.load(obj.value, FIELD, Type::Ref).node;
        b.return_(None);
        load
    };
    let method = builder.build().unwrap();
    let annotation = analyze(&method);

    assert_eq!(annotation.strength_of(load), Some(BarrierStrength::Strong));
}

#[test]
fn test_fresh_array_with_unknown_index() {
    let mut builder = MethodBuilder::new("array");
    let i = builder.param(Type::Int);
    let v = builder.param(Type::Ref);
    let (store, alloc) = {
        let mut entry = builder.entry_block();
        let n = entry.iconst(10);
        let arr = entry.allocate_array("Object", Operand::Value(n));
        let store = entry.store(arr.value, FieldSelector::UnknownIndex(i), v, Type::Ref);
        entry.return_(None);
        (store, arr.node)
    };
    let method = builder.build().unwrap();
    let annotation = analyze(&method);

    assert_eq!(
        annotation.get(store).unwrap().reason,
        ElisionReason::FreshAllocation { allocation: alloc }
    );
}

#[test]
fn test_fresh_elision_can_be_disabled() {
    let mut builder = MethodBuilder::new("disabled");
    let (first, second) = {
        let mut entry = builder.entry_block();
        let obj = entry.allocate("Box");
        let first = entry.load(obj.value, FIELD, Type::Ref).node;
        let second = entry.load(obj.value, FIELD, Type::Ref).node;
        entry.return_(None);
        (first, second)
    };
    let method = builder.build().unwrap();
    let config = ElisionConfig {
        fresh_object_elision: false,
        ..ElisionConfig::default()
    };
    let annotation = analyze_with(&method, &config);

    assert_eq!(annotation.strength_of(first), Some(BarrierStrength::Strong));
    assert_eq!(annotation.strength_of(second), Some(BarrierStrength::Elided));
}

#[test]
fn test_allocation_in_one_branch_is_not_fresh_at_merge() {
    let mut builder = MethodBuilder::new("branchAlloc");
    let o = builder.param(Type::Ref);
    let cond = builder.param(Type::Int);
    let make = builder.create_block();
    let merge = builder.create_block();

    builder.entry_block().branch(cond, make, merge);
    let fresh = {
        let mut b = builder.block(make);
        let fresh = b.allocate("Box");
        b.jump(merge);
        fresh
    };
    let load = {
        let mut b = builder.block(merge);
        let merged = b.phi(vec![
            (crate::BlockId(0), o),
            (make, fresh.value),
        ]);
        let load = b.load(merged, FIELD, Type::Ref).node;
        b.return_(None);
        load
    };
    let method = builder.build().unwrap();
    let annotation = analyze(&method);

    assert_eq!(annotation.strength_of(load), Some(BarrierStrength::Strong));
}
