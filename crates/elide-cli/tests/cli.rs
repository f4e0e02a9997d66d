use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const LOAD_TWICE: &str = "\
method @loadTwice(v0: ref) {
block0:
    v1 = load.ref v0+16 ; barrier: strong
    v2 = load.ref v0+16 ; barrier: elided
    return
}
";

const WRONG_NOTE: &str = "\
method @afterCall(v0: ref) {
block0:
    v1 = load.ref v0+16
    call @blackhole(v1)
    v2 = load.ref v0+16 ; barrier: elided
    return
}
";

fn elide() -> Command {
    Command::cargo_bin("elide").unwrap()
}

fn write_fixture(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    elide()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("counts"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_analyze_prints_annotated_text() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "twice.eir", LOAD_TWICE);

    elide()
        .args(["analyze", "--no-color", "--ascii"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("; ### Method: loadTwice"))
        .stdout(predicate::str::contains(
            "[1] v1 = load.ref v0+16 ; barrier: strong (no dominating fact)",
        ))
        .stdout(predicate::str::contains(
            "[2] v2 = load.ref v0+16 ; barrier: elided (dominated by [1])",
        ));
}

#[test]
fn test_analyze_json_to_file() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "twice.eir", LOAD_TWICE);
    let output = dir.path().join("report.json");

    elide()
        .args(["analyze", "--json"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["module"], "twice");
    assert_eq!(report["totals"]["loads"]["elided"], 1);
    assert_eq!(report["methods"][0]["name"], "loadTwice");
}

#[test]
fn test_analyze_directory_collects_eir_files() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir, "a.eir", LOAD_TWICE);
    write_fixture(&dir, "b.eir", WRONG_NOTE);
    write_fixture(&dir, "notes.txt", "not ir");

    elide()
        .args(["analyze", "--json"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"module\": \"a\""))
        .stdout(predicate::str::contains("\"module\": \"b\""));
}

#[test]
fn test_analyze_with_config_disabling_elision() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "twice.eir", LOAD_TWICE);
    let config = write_fixture(
        &dir,
        "config.json",
        r#"{ "dominating_access_elision": false }"#,
    );

    elide()
        .args(["analyze", "--no-color"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("barrier: elided").not());
}

#[test]
fn test_counts_for_one_method() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "twice.eir", LOAD_TWICE);

    elide()
        .arg("counts")
        .arg(&input)
        .args(["--method", "loadTwice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("loadTwice load strong 1\n"))
        .stdout(predicate::str::contains("loadTwice load elided 1\n"))
        .stdout(predicate::str::contains("loadTwice store strong 0\n"));
}

#[test]
fn test_counts_unknown_method_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "twice.eir", LOAD_TWICE);

    elide()
        .arg("counts")
        .arg(&input)
        .args(["--method", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no method @missing"));
}

#[test]
fn test_validate_accepts_met_notes() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "twice.eir", LOAD_TWICE);

    elide()
        .arg("validate")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("VALID"));
}

#[test]
fn test_validate_reports_unmet_note() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "after_call.eir", WRONG_NOTE);

    elide()
        .arg("validate")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("INVALID"))
        .stdout(predicate::str::contains(
            "@afterCall [3]: expected elided, got strong (no dominating fact)",
        ));
}

#[test]
fn test_validate_rejects_syntax_error() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "broken.eir", "method @m( {\n");

    elide()
        .arg("validate")
        .arg(&input)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Parse Error"));
}
