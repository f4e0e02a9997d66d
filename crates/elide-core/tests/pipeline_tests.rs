use elide_core::{
    analysis::{BarrierElisionPass, PassManager, SafepointAnalysisPass},
    AccessKind, BarrierStrength, ElisionConfig, FieldSelector, MethodBuilder, ModuleBuilder,
    Type,
};

fn copy_field() -> elide_core::Method {
    let mut builder = MethodBuilder::new("copyField");
    let src = builder.param(Type::Ref);
    let dst = builder.param(Type::Ref);
    {
        let mut entry = builder.entry_block();
        let value = entry.load(src, FieldSelector::Offset(8), Type::Ref);
        entry.store(dst, FieldSelector::Offset(8), value.value, Type::Ref);
        entry.load(src, FieldSelector::Offset(8), Type::Ref);
        entry.call("log", vec![dst]);
        entry.store(dst, FieldSelector::Offset(8), value.value, Type::Ref);
        entry.return_(None);
    }
    builder.build().unwrap()
}

fn fresh_box() -> elide_core::Method {
    let mut builder = MethodBuilder::new("freshBox");
    let v = builder.param(Type::Ref);
    {
        let mut entry = builder.entry_block();
        let obj = entry.allocate("Box");
        entry.store(obj.value, FieldSelector::Offset(8), v, Type::Ref);
        entry.return_(Some(obj.value));
    }
    builder.build().unwrap()
}

#[test]
fn test_module_pipeline() {
    let module = ModuleBuilder::new("demo")
        .method(copy_field())
        .method(fresh_box())
        .build();

    let mut manager = PassManager::new();
    manager.enable_statistics();
    let results = manager
        .run(&mut BarrierElisionPass::new(ElisionConfig::default()), &module)
        .unwrap();

    let copy = &results["copyField"];
    assert_eq!(copy.count(AccessKind::Load, BarrierStrength::Strong), 1);
    assert_eq!(copy.count(AccessKind::Load, BarrierStrength::Elided), 1);
    assert_eq!(copy.count(AccessKind::Store, BarrierStrength::Strong), 2);

    let fresh = &results["freshBox"];
    assert_eq!(fresh.count(AccessKind::Store, BarrierStrength::Elided), 1);

    assert_eq!(manager.statistics().len(), 2);
}

#[test]
fn test_safepoint_pass_is_reusable() {
    let module = ModuleBuilder::new("demo").method(copy_field()).build();
    let mut manager = PassManager::new();
    let maps = manager
        .run(&mut SafepointAnalysisPass::default(), &module)
        .unwrap();
    assert_eq!(maps["copyField"].safepoint_count(), 1);
}

fn load_twice() -> elide_core::Method {
    let mut builder = MethodBuilder::new("loadTwice");
    let o = builder.param(Type::Ref);
    {
        let mut entry = builder.entry_block();
        entry.load(o, FieldSelector::Offset(16), Type::Ref);
        entry.load(o, FieldSelector::Offset(16), Type::Ref);
        entry.return_(None);
    }
    builder.build().unwrap()
}

#[test]
fn test_cached_results_follow_config() {
    let module = ModuleBuilder::new("demo").method(load_twice()).build();
    let mut manager = PassManager::new();

    let default = manager
        .run(&mut BarrierElisionPass::new(ElisionConfig::default()), &module)
        .unwrap();
    let conservative = manager
        .run(
            &mut BarrierElisionPass::new(ElisionConfig::conservative()),
            &module,
        )
        .unwrap();

    let elided = |a: &elide_core::BarrierAnnotation| a.count(AccessKind::Load, BarrierStrength::Elided);
    assert_eq!(elided(&default["loadTwice"]), 1);
    assert_eq!(elided(&conservative["loadTwice"]), 0);

    let again = manager
        .run(&mut BarrierElisionPass::new(ElisionConfig::default()), &module)
        .unwrap();
    assert_eq!(again["loadTwice"], default["loadTwice"]);
}

#[test]
fn test_same_method_name_in_two_modules() {
    let first = ModuleBuilder::new("first").method(load_twice()).build();
    let mut renamed = copy_field();
    renamed.name = "loadTwice".to_string();
    let second = ModuleBuilder::new("second").method(renamed).build();

    let mut manager = PassManager::new();
    let mut pass = BarrierElisionPass::new(ElisionConfig::default());
    let a = manager.run(&mut pass, &first).unwrap();
    let b = manager.run(&mut pass, &second).unwrap();

    assert_eq!(a["loadTwice"].len(), 2);
    assert_eq!(b["loadTwice"].len(), 4);
}

#[test]
fn test_safepoint_pass_cached_per_poll_setting() {
    let module = ModuleBuilder::new("demo").method(copy_field()).build();
    let mut manager = PassManager::new();
    manager.enable_statistics();

    manager
        .run(&mut SafepointAnalysisPass::default(), &module)
        .unwrap();
    manager
        .run(
            &mut SafepointAnalysisPass {
                counted_loops_poll: true,
            },
            &module,
        )
        .unwrap();
    manager
        .run(&mut SafepointAnalysisPass::default(), &module)
        .unwrap();

    assert_eq!(manager.statistics().len(), 2);
}
