use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn prints_generated_parser() {
    let mut cmd = cargo_bin_cmd!("peg2rs");
    cmd.arg(fixture_path("digits.peg"));

    let output_pred = predicate::str::contains("pub fn parse")
        .and(predicate::str::contains("pub fn Digits"))
        .and(predicate::str::contains("fn yy_nonterm1"));

    cmd.assert().success().stdout(output_pred);
}

#[test]
fn prints_normalized_grammar() {
    let mut cmd = cargo_bin_cmd!("peg2rs");
    cmd.arg(fixture_path("digits.peg"))
        .arg("--emit")
        .arg("grammar");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Digits() <- Digit+ ;"));
}

#[test]
fn writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("parser.rs");

    let mut cmd = cargo_bin_cmd!("peg2rs");
    cmd.arg(fixture_path("list.peg")).arg("-o").arg(&output);

    cmd.assert().success().stdout("");

    let code = fs::read_to_string(&output).unwrap();
    assert!(code.contains("use std :: fmt :: Write"), "{}", code);
    syn::parse_file(&code).unwrap();
}

#[test]
fn reports_compile_errors_with_location() {
    let path = fixture_path("undefined.peg");

    let mut cmd = cargo_bin_cmd!("peg2rs");
    cmd.arg(&path);

    cmd.assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains(format!(
            "{}:2:13: error: rule Name is not defined",
            path.display()
        )));
}

#[test]
fn reports_unreadable_grammar() {
    let mut cmd = cargo_bin_cmd!("peg2rs");
    cmd.arg(fixture_path("missing.peg"));

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing.peg: error:"));
}

#[test]
fn invalid_actions_can_be_skipped_when_emitting_grammar() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = dir.path().join("actions.peg");
    fs::write(&grammar, "A <- 'a' { not rust at all } ;\n").unwrap();

    let mut cmd = cargo_bin_cmd!("peg2rs");
    cmd.arg(&grammar).arg("--emit").arg("grammar");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("actions.peg:1:10: error:"));

    let mut cmd = cargo_bin_cmd!("peg2rs");
    cmd.arg(&grammar)
        .arg("--emit")
        .arg("grammar")
        .arg("--no-check-actions");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("{ not rust at all }"));
}
