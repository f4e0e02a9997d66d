use elide_emit::{EmitContext, Emitter, IndentStyle, IrEmitter, EmitterConfig};
use elide_parser::parse_module;
use pretty_assertions::assert_eq;

const CANONICAL: &str = "\
method @everything(v0: ref, v1: ref) {
block0:
    v2 = load.ref v0+16
    v3 = load.ref v0+16
    store.ref v0+16, v1
    v4 = atomic_xchg.ref v0+16, v1
    v5 = new Outer
    v6 = new Inner[v2]
    v7 = load.ref v6[3]
    v8 = load.ref v6[v2]
    call @blackhole(v2)
    v9 = call @make()
    safepoint
    v10 = iconst 1
    brif v10, block1, block2
block1:
    v11 = phi [block0: v2], [block1: v3]
    loop_back.counted block1
block2:
    return v2
}

method @empty() {
block0:
    return
}
";

#[test]
fn test_canonical_text_round_trips() {
    let module = parse_module(CANONICAL).unwrap();
    let output = IrEmitter::new().emit_to_string(&module).unwrap();
    assert_eq!(output, CANONICAL);

    let again = parse_module(&output).unwrap();
    assert_eq!(IrEmitter::new().emit_to_string(&again).unwrap(), output);
}

#[test]
fn test_tab_indentation() {
    let module = parse_module("method @m() {\nblock0:\n    safepoint\n    return\n}\n").unwrap();
    let emitter = IrEmitter::with_config(EmitterConfig {
        use_colors: false,
        indent_style: IndentStyle::Tabs,
        ..EmitterConfig::default()
    });
    let output = emitter.emit_to_string(&module).unwrap();
    assert_eq!(output, "method @m() {\nblock0:\n\tsafepoint\n\treturn\n}\n");
}

#[test]
fn test_nested_context_shifts_every_line() {
    let module = parse_module("method @m() {\nblock0:\n    return\n}\n").unwrap();
    let mut buffer = Vec::new();
    let mut context = EmitContext::new().nested();
    IrEmitter::new()
        .emit(&module, &mut buffer, &mut context)
        .unwrap();
    assert_eq!(
        String::from_utf8(buffer).unwrap(),
        "    method @m() {\n    block0:\n        return\n    }\n"
    );
}
