use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::{CommandCargoExt, OutputAssertExt};
use predicates::prelude::predicate;
use serde_json::Value;
use tempfile::TempDir;

fn verso(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("verso").unwrap();
    cmd.current_dir(dir)
        .env_remove("VERSO_LOG")
        .env_remove("VERSO_AUTHOR")
        .env_remove("RUST_LOG");
    cmd
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    verso(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Repository initialized"));
    dir
}

fn json_output(dir: &Path, args: &[&str]) -> Value {
    let output = verso(dir)
        .args(args)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{args:?} failed: {output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn command_before_init_fails() {
    let dir = TempDir::new().unwrap();
    verso(dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a verso repository"));
}

#[test]
fn feature_branch_scenario() {
    let dir = init_repo();
    let d = dir.path();

    verso(d)
        .args(["stage", "f.txt", "--content", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("f.txt staged"));
    verso(d)
        .args(["commit", "-m", "msg", "-a", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^Commit [0-9a-f]{7} created").unwrap());
    verso(d)
        .args(["branch", "create", "feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Branch 'feature' created"));
    verso(d)
        .args(["checkout", "feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to 'feature'"));
    verso(d).args(["stage", "f.txt", "--content", "v2"]).assert().success();
    verso(d).args(["commit", "-m", "msg2", "-a", "bob"]).assert().success();

    let status = json_output(d, &["status"]);
    assert_eq!(status["commit_count"], 2);
    assert_eq!(status["current_branch"], "feature");
    assert_eq!(status["branch_names"], serde_json::json!(["main", "feature"]));

    verso(d).args(["checkout", "main"]).assert().success();
    let status = json_output(d, &["status"]);
    assert_eq!(status["staged_paths"], serde_json::json!([]));

    let main_log = json_output(d, &["log"]);
    assert_eq!(main_log.as_array().unwrap().len(), 1);
    let feature_log = json_output(d, &["log", "--branch", "feature"]);
    assert_eq!(feature_log.as_array().unwrap().len(), 2);
    assert_eq!(feature_log[0]["message"], "msg2");
}

#[test]
fn commit_with_nothing_staged_fails() {
    let dir = init_repo();
    verso(dir.path())
        .args(["commit", "-m", "empty"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to commit"));

    let output = verso(dir.path())
        .args(["commit", "-m", "empty", "--format", "json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Nothing to commit");
}

#[test]
fn delete_current_branch_fails() {
    let dir = init_repo();
    verso(dir.path())
        .args(["branch", "delete", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot delete current branch"));
}

#[test]
fn checkout_unknown_branch_fails() {
    let dir = init_repo();
    verso(dir.path())
        .args(["checkout", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Branch does not exist"));
    let status = json_output(dir.path(), &["status"]);
    assert_eq!(status["current_branch"], "main");
}

#[test]
fn default_author_comes_from_config_file() {
    let dir = init_repo();
    fs::write(dir.path().join("verso.toml"), "author = \"carol\"\n").unwrap();
    verso(dir.path())
        .args(["stage", "a.txt", "--content", "a"])
        .assert()
        .success();
    let body = json_output(dir.path(), &["commit", "-m", "configured"]);
    assert_eq!(body["commit"]["author"], "carol");
}

#[test]
fn add_walks_directories_and_skips_state() {
    let dir = init_repo();
    let d = dir.path();
    fs::create_dir_all(d.join("docs")).unwrap();
    fs::write(d.join("docs/guide.md"), "# guide").unwrap();
    fs::write(d.join("readme.txt"), "hello").unwrap();

    verso(d).args(["add", "."]).assert().success();
    let status = json_output(d, &["status"]);
    assert_eq!(
        status["staged_paths"],
        serde_json::json!(["docs/guide.md", "readme.txt"])
    );
}

#[test]
fn diff_two_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("old.txt"), "a\nb").unwrap();
    fs::write(dir.path().join("new.txt"), "a\nx").unwrap();

    verso(dir.path())
        .args(["diff", "old.txt", "new.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" a\n-b\n+x\n"));

    let body = json_output(dir.path(), &["diff", "old.txt", "new.txt"]);
    assert_eq!(body["lines"][1]["tag"], "removed");
    assert_eq!(body["lines"][2]["tag"], "added");
}

#[test]
fn diff_staged_against_last_commit() {
    let dir = init_repo();
    let d = dir.path();
    verso(d).args(["stage", "f.txt", "--content", "a\nb"]).assert().success();
    verso(d).args(["commit", "-m", "one"]).assert().success();
    verso(d).args(["stage", "f.txt", "--content", "a\nx"]).assert().success();

    verso(d)
        .args(["diff", "--staged", "f.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-b\n+x"));
}

#[test]
fn stats_of_two_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("old.txt"), "a\nb").unwrap();
    fs::write(dir.path().join("new.txt"), "a\nb\nc").unwrap();

    let stats = json_output(dir.path(), &["stats", "old.txt", "new.txt"]);
    assert_eq!(stats["additions"], 1);
    assert_eq!(stats["deletions"], -1);
}

#[test]
fn show_commit_by_prefix_with_diff() {
    let dir = init_repo();
    let d = dir.path();
    verso(d).args(["stage", "f.txt", "--content", "one"]).assert().success();
    let body = json_output(d, &["commit", "-m", "first"]);
    let id = body["commit"]["id"].as_str().unwrap().to_string();

    verso(d)
        .args(["show", &id[..10], "--diff"])
        .assert()
        .success()
        .stdout(predicate::str::contains("message: first"))
        .stdout(predicate::str::contains("+one"));
}

#[test]
fn init_recovers_from_corrupt_state() {
    let dir = TempDir::new().unwrap();
    let d = dir.path();
    fs::create_dir(d.join(".verso")).unwrap();
    fs::write(d.join(".verso/state.json"), "{not json").unwrap();

    verso(d).arg("status").assert().failure();
    verso(d)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Repository initialized"));

    let status = json_output(d, &["status"]);
    assert_eq!(status["current_branch"], "main");
    assert_eq!(status["commit_count"], 0);
}

#[test]
fn branch_list_reports_tips() {
    let dir = init_repo();
    let d = dir.path();
    verso(d).args(["stage", "f.txt", "--content", "v1"]).assert().success();
    let body = json_output(d, &["commit", "-m", "first"]);
    let id = body["commit"]["id"].as_str().unwrap().to_string();
    verso(d).args(["branch", "create", "feature"]).assert().success();

    let branches = json_output(d, &["branch"]);
    assert_eq!(branches[0]["name"], "main");
    assert_eq!(branches[0]["current"], true);
    assert_eq!(branches[1]["tip"], Value::String(id[..7].to_string()));
}
