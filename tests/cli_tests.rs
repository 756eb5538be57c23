#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("DUTY_ROSTER_DB")
        .env("DUTY_ROSTER_LOG", "off")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_generates_and_shows_a_month() {
    run_cli(
        "member add Ana\nmember add Bo #10B981 @bo\nholiday add 2025-09-01 Labour day\ngenerate 2025-09 7\nshow 2025-09\nquit\n",
    )
    .success()
    .stdout(str_contains("Added member 2 (Bo)."))
    .stdout(str_contains("Holiday 2025-09-01 set (Labour day)."))
    .stdout(str_contains("Generated (month=2025-09, days=21"))
    .stdout(str_contains("Labour day"));
}

#[test]
fn cli_reports_generation_without_members() {
    run_cli("generate 2025-09\nquit\n")
        .success()
        .stdout(str_contains("Generation error: no eligible members"));
}

#[test]
fn cli_rejects_bad_input_and_keeps_running() {
    run_cli("generate 2025-13\nassign tomorrow primary 1\nmember toggle x\nfrobnicate\nmembers\nquit\n")
        .success()
        .stdout(str_contains("Generation error:"))
        .stdout(str_contains("Invalid date (YYYY-MM-DD)"))
        .stdout(str_contains("Invalid id"))
        .stdout(str_contains("Unknown command. Type 'help'."));
}

#[test]
fn cli_manual_assignment_is_kept_on_generate() {
    run_cli(
        "member add Ana\nmember add Bo\nassign 2025-09-02 primary 2 wheel\ngenerate 2025-09 1\ntoday 2025-09-02\nquit\n",
    )
    .success()
    .stdout(str_contains("Assigned 2025-09-02 primary to Bo (wheel)."))
    .stdout(str_contains("Kept 2025-09-02 primary for member 2 (wheel)."))
    .stdout(str_contains("Primary   : Bo"));
}

#[test]
fn cli_unassign_and_stats() {
    run_cli(
        "member add Ana\ngenerate 2025-09 3\nunassign 2025-09-02 secondary\nunassign 2025-09-06\nstats 2025-09\nquit\n",
    )
    .success()
    .stdout(str_contains("Removed 1 assignment(s) on 2025-09-02."))
    .stdout(str_contains("Removed 0 assignment(s) on 2025-09-06."))
    .stdout(str_contains("| 1  | Ana  | 22      | 10        | 32    |"));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().replace('\\', "\\\\");
    let script = format!(
        "member add Keeper\nsave json {path}\nmember add Temp\nload json {path}\nmembers\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(
        output.contains("Snapshot loaded from"),
        "expected output to mention load completion"
    );
    let after_reload = output
        .split("Snapshot loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Keeper"));
    assert!(
        !after_reload.contains("Temp"),
        "temporary member should not appear after reload:\n{}",
        after_reload
    );
}

#[test]
fn cli_exports_csv() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    run_cli(&format!(
        "member add Ana\ngenerate 2025-09 5\nexport csv {path} 2025-09\nquit\n"
    ))
    .success()
    .stdout(str_contains("Exported 33 assignment(s)"));
    let contents = std::fs::read_to_string(tmp.path()).unwrap();
    assert!(contents.starts_with("date,duty,member_id,member_name,origin"));
}

#[cfg(feature = "sqlite")]
#[test]
fn cli_load_json_warns_when_leaving_the_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = dir.path().join("roster.db");
    let snapshot = dir.path().join("snapshot.json");
    let script = format!(
        "member add Keeper\nsave json {snap}\nload json {snap}\nmember add Later\nquit\n",
        snap = snapshot.display()
    );
    run_cli_with_db(&db, &script)
        .success()
        .stdout(str_contains("Snapshot loaded from"))
        .stdout(str_contains("Session is now in memory"));

    // The database keeps only what was written before the swap.
    run_cli_with_db(&db, "members\nquit\n")
        .success()
        .stdout(str_contains("Keeper"))
        .stdout(str_contains("Later").not());
}

#[cfg(feature = "sqlite")]
#[allow(deprecated)]
fn run_cli_with_db(db: &std::path::Path, script: &str) -> assert_cmd::assert::Assert {
    Command::cargo_bin("cli")
        .expect("cli binary")
        .env("DUTY_ROSTER_DB", db)
        .env("DUTY_ROSTER_LOG", "off")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_load_json_without_database_stays_quiet() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    run_cli(&format!("member add Ana\nsave json {path}\nload json {path}\nquit\n"))
        .success()
        .stdout(str_contains("Snapshot loaded from"))
        .stdout(str_contains("Session is now in memory").not());
}
