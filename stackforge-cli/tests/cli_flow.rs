use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;

use stackforge_core::{store, RunId, Stage};
use tempfile::TempDir;

fn stackforge_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stackforge"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG");
    cmd
}

fn start_demo(home: &Path) {
    stackforge_cmd(home)
        .args([
            "start",
            "demo-run",
            "--project",
            "demo",
            "--credential",
            "infra=infra-secret-1",
            "--credential",
            "source_control=ghp_supersecret",
        ])
        .assert()
        .success()
        .stdout(contains("Created run 'demo-run'"))
        .stdout(contains("infra, source_control"))
        .stdout(contains("ghp_supersecret").not());
}

fn run_id() -> RunId {
    RunId::new("demo-run").unwrap()
}

#[test]
fn next_prints_init_command_and_moves_stage() {
    let home = TempDir::new().expect("home");
    start_demo(home.path());

    stackforge_cmd(home.path())
        .args(["next", "demo-run"])
        .assert()
        .success()
        .stdout(contains("mkdir -p ./demo"))
        .stdout(contains("Next stage: PROVISION_INFRA"));

    let run = store::load_run_at(home.path(), &run_id()).expect("load run");
    assert_eq!(run.stage, Stage::ProvisionInfra);
    let history = store::load_history_at(home.path(), &run_id()).expect("history");
    let actions: Vec<_> = history.iter().map(|e| e.action()).collect();
    assert_eq!(actions, ["start_build", "run"]);
}

#[test]
fn next_json_is_tagged_step() {
    let home = TempDir::new().expect("home");
    start_demo(home.path());

    let output = stackforge_cmd(home.path())
        .args(["next", "demo-run", "--json"])
        .output()
        .expect("run next");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(json["run"], "demo-run");
    assert_eq!(json["kind"], "command");
    assert_eq!(json["stage"], "INIT");
    assert!(json["script"].as_str().unwrap().contains("PROJECT_NAME=demo"));
}

#[test]
fn unconfigured_run_prompts_and_stays_put() {
    let home = TempDir::new().expect("home");
    stackforge_cmd(home.path())
        .args(["start", "bare"])
        .assert()
        .success()
        .stdout(contains("no build configuration yet"));

    stackforge_cmd(home.path())
        .args(["next", "bare", "--json"])
        .assert()
        .success()
        .stdout(contains("\"kind\": \"prompt\""))
        .stdout(contains("\"reason\": \"missing_configuration\""));

    let run = store::load_run_at(home.path(), &RunId::new("bare").unwrap()).expect("load");
    assert_eq!(run.stage, Stage::Init);
}

#[test]
fn exec_runs_init_and_records_output() {
    let home = TempDir::new().expect("home");
    let workspace = TempDir::new().expect("workspace");
    start_demo(home.path());

    stackforge_cmd(home.path())
        .current_dir(workspace.path())
        .args(["next", "demo-run", "--exec"])
        .assert()
        .success()
        .stdout(contains("✓ ok"));

    let env = fs::read_to_string(workspace.path().join("demo/.env")).expect(".env written");
    assert!(env.contains("PROJECT_NAME=demo\n"));
    assert!(env.contains("INFRA_API_TOKEN=infra-secret-1\n"));
    assert_eq!(
        fs::read_to_string(workspace.path().join("demo/cloud-key.json")).unwrap(),
        "{}\n"
    );

    let history = store::load_history_at(home.path(), &run_id()).expect("history");
    assert_eq!(history.last().map(|e| e.action()), Some("command_output"));
}

#[test]
fn full_run_finishes_with_success() {
    let home = TempDir::new().expect("home");
    start_demo(home.path());

    for _ in 0..7 {
        stackforge_cmd(home.path())
            .args(["next", "demo-run"])
            .assert()
            .success();
    }
    stackforge_cmd(home.path())
        .args(["next", "demo-run", "--json"])
        .assert()
        .success()
        .stdout(contains("\"kind\": \"finished\""))
        .stdout(contains("\"status\": \"success\""))
        .stdout(contains("\"project\": \"demo\""));

    stackforge_cmd(home.path())
        .args(["status", "demo-run"])
        .assert()
        .success()
        .stdout(contains("1 finished"))
        .stdout(contains("FINISHED"));
}

#[test]
fn history_masks_credentials() {
    let home = TempDir::new().expect("home");
    start_demo(home.path());
    // PUBLISH_SOURCE embeds the token in the remote URL.
    for _ in 0..6 {
        stackforge_cmd(home.path())
            .args(["next", "demo-run"])
            .assert()
            .success();
    }

    stackforge_cmd(home.path())
        .args(["history", "demo-run", "--json"])
        .assert()
        .success()
        .stdout(contains("start_build"))
        .stdout(contains("***"))
        .stdout(contains("ghp_supersecret").not())
        .stdout(contains("infra-secret-1").not());
}

#[test]
fn template_override_changes_emitted_command() {
    let home = TempDir::new().expect("home");
    let stages = home.path().join(".stackforge/templates/stages");
    fs::create_dir_all(&stages).unwrap();
    fs::write(
        stages.join("init.sh.tera"),
        "echo custom init for {{ project_name | shell_quote }}",
    )
    .unwrap();
    start_demo(home.path());

    stackforge_cmd(home.path())
        .args(["next", "demo-run"])
        .assert()
        .success()
        .stdout(contains("echo custom init for demo"));
}

#[test]
fn unknown_run_fails_with_context() {
    let home = TempDir::new().expect("home");
    stackforge_cmd(home.path())
        .args(["next", "nope"])
        .assert()
        .failure()
        .stderr(contains("failed to load run 'nope'"));
}

#[test]
fn invalid_run_id_is_rejected_by_the_parser() {
    let home = TempDir::new().expect("home");
    stackforge_cmd(home.path())
        .args(["start", "../escape"])
        .assert()
        .failure()
        .stderr(contains("invalid run id"));
}

#[test]
fn stages_lists_the_chain() {
    let home = TempDir::new().expect("home");
    stackforge_cmd(home.path())
        .arg("stages")
        .assert()
        .success()
        .stdout(contains("INIT"))
        .stdout(contains("PUBLISH_SOURCE"))
        .stdout(contains("source_control"))
        .stdout(contains("FINISHED"));
}
