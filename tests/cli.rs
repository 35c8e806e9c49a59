use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

fn workspace(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn spellclass(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("spellclass").unwrap();
    cmd.current_dir(dir.path()).arg("--no-color");
    cmd
}

const PROGRAM: &[u8] = b"// hello wrold\nvar s = \"the user\";\n";

#[test]
fn classify_prints_spans_as_json() {
    let dir = workspace(&[("Program.cs", PROGRAM)]);

    let output = spellclass(&dir)
        .args(["classify", "Program.cs", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["files_classified"], 1);

    let file = &json["files"][0];
    assert_eq!(file["classifier"], "CSharp");
    assert_eq!(file["spans"][0]["text"], "// hello wrold");
    assert_eq!(file["spans"][0]["classification"], "SingleLineComment");
    assert_eq!(file["spans"][1]["classification"], "NormalStringLiteral");
    assert_eq!(file["spans"][1]["start"], 23);
}

#[test]
fn classify_text_output() {
    let dir = workspace(&[("Program.cs", PROGRAM)]);

    spellclass(&dir)
        .args(["classify", "Program.cs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Program.cs (CSharp)"))
        .stdout(predicate::str::contains("SingleLineComment"))
        .stdout(predicate::str::contains("0..14"));
}

#[test]
fn check_reports_misspellings_and_fails() {
    let dir = workspace(&[("Program.cs", PROGRAM)]);

    spellclass(&dir)
        .args(["check", "Program.cs"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1:10 wrold [SingleLineComment]"))
        .stdout(predicate::str::contains("world"))
        .stdout(predicate::str::contains("1 error found in 1 file"));
}

#[test]
fn check_no_fail_and_ignored_words() {
    let dir = workspace(&[("Program.cs", PROGRAM)]);

    spellclass(&dir)
        .args(["check", "Program.cs", "--no-fail"])
        .assert()
        .success();

    spellclass(&dir)
        .args(["check", "Program.cs", "--ignore-word", "wrold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No spelling errors found in 1 file"));
}

#[test]
fn check_json_output() {
    let dir = workspace(&[("Program.cs", PROGRAM)]);

    let output = spellclass(&dir)
        .args(["check", "Program.cs", "-o", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_errors"], 1);
    let error = &json["files"][0]["errors"][0];
    assert_eq!(error["word"], "wrold");
    assert_eq!(error["offset"], 9);
    assert_eq!(error["line"], 1);
}

#[test]
fn directories_skip_binary_files() {
    let dir = workspace(&[
        ("logo.png", b"\x89PNG\r\n\x1a\n\x00\x00"),
        ("notes.txt", b"hello world"),
    ]);

    spellclass(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No spelling errors found in 1 file"));
}

#[test]
fn inline_directives_are_honored() {
    let dir = workspace(&[(
        "page.html",
        b"<!-- ignore spelling: wrold -->\n<p>hello wrold</p>\n",
    )]);

    spellclass(&dir).args(["check", "page.html"]).assert().success();
}

#[test]
fn rules_lists_extensions() {
    let dir = tempdir().unwrap();

    spellclass(&dir)
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains(".cs"))
        .stdout(predicate::str::contains("CSharp"))
        .stdout(predicate::str::contains("skipped"));
}

#[test]
fn custom_classifier_rules() {
    let dir = workspace(&[
        (
            "rules.toml",
            b"[extensions]\nlog = \"None\"\ncs = \"PlainText\"\n",
        ),
        ("Program.cs", PROGRAM),
    ]);

    spellclass(&dir)
        .args(["--classifier-rules", "rules.toml", "classify", "Program.cs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Program.cs (PlainText)"));
}

#[test]
fn dict_builds_a_usable_dictionary() {
    let dir = workspace(&[
        ("words.txt", b"hello\nwrold\nthe\nuser\n"),
        ("Program.cs", PROGRAM),
    ]);

    spellclass(&dir)
        .args(["dict", "words.txt", "words.fst"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4 words"));

    spellclass(&dir)
        .args(["check", "Program.cs", "--dictionary", "words.fst"])
        .assert()
        .success();
}

#[test]
fn completion_script() {
    let dir = tempdir().unwrap();

    spellclass(&dir)
        .args(["--completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spellclass"));
}
