// CLI integration tests against a temp local store.
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn cmd(store: &Path) -> Command {
    let exe = env!("CARGO_BIN_EXE_liftlog");
    let mut command = Command::new(exe);
    command.arg("--store").arg(store);
    command
}

fn run(store: &Path, args: &[&str]) -> Output {
    cmd(store).args(args).output().expect("run liftlog")
}

fn parse_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    serde_json::from_str(line).expect("valid json")
}

#[test]
fn first_list_seeds_thirty_records() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");

    let list = run(&store, &["list", "--json"]);
    assert!(list.status.success());
    let page = parse_json_line(&list.stdout);
    assert_eq!(page["total"], 30);
    assert_eq!(page["page"], 1);
    assert_eq!(page["totalPages"], 3);
    let records = page["records"].as_array().expect("records");
    assert_eq!(records.len(), 10);
    assert_eq!(records[0]["id"], 1);
    assert_eq!(records[0]["date"], "2026-01-02");
    assert_eq!(records[0]["exercise"], "Squat");
    assert!(store.exists());
}

#[test]
fn add_edit_delete_flow() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");

    let add = run(
        &store,
        &[
            "add",
            "--date",
            "2026-02-10",
            "--exercise",
            "  Overhead Press ",
            "--sets",
            "4",
            "--reps",
            "6",
            "--weight",
            "95.5",
            "--json",
        ],
    );
    assert!(add.status.success(), "{}", String::from_utf8_lossy(&add.stderr));
    let created = parse_json_line(&add.stdout);
    assert_eq!(created["id"], 31);
    assert_eq!(created["exercise"], "Overhead Press");
    assert_eq!(created["weight"], 95.5);

    let edit = run(&store, &["edit", "31", "--reps", "8", "--json"]);
    assert!(edit.status.success(), "{}", String::from_utf8_lossy(&edit.stderr));
    let updated = parse_json_line(&edit.stdout);
    assert_eq!(updated["id"], 31);
    assert_eq!(updated["reps"], 8);
    assert_eq!(updated["sets"], 4);
    assert_eq!(updated["date"], "2026-02-10");

    let page4 = parse_json_line(&run(&store, &["list", "--page", "4", "--json"]).stdout);
    assert_eq!(page4["records"].as_array().expect("records").len(), 1);

    let delete = run(&store, &["delete", "31", "--page", "4", "--json"]);
    assert!(delete.status.success(), "{}", String::from_utf8_lossy(&delete.stderr));
    let after = parse_json_line(&delete.stdout);
    assert_eq!(after["page"], 3);
    assert_eq!(after["total"], 30);
    assert_eq!(after["records"].as_array().expect("records").len(), 10);
}

#[test]
fn human_list_prints_table_and_pager() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");

    let list = run(&store, &["list", "--page", "2"]);
    assert!(list.status.success());
    let text = String::from_utf8_lossy(&list.stdout);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("ID  DATE"));
    assert_eq!(lines.len(), 12);
    assert_eq!(lines[11], "< prev  Page 2 of 3  next >");
}

#[test]
fn stats_reports_total_and_average() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");

    let stats = run(&store, &["stats", "--json"]);
    assert!(stats.status.success());
    let value = parse_json_line(&stats.stdout);
    assert_eq!(value["total"], 30);
    let average = value["averageWeight"].as_f64().expect("average");
    assert!(average > 95.0 && average < 165.0);

    let plain = run(&store, &["stats"]);
    let text = String::from_utf8_lossy(&plain.stdout);
    assert!(text.lines().next().expect("line").ends_with(" 30"));
}

#[test]
fn invalid_workout_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");

    let add = run(
        &store,
        &[
            "add", "--exercise", "Squat", "--sets", "21", "--reps", "5", "--weight", "100",
        ],
    );
    assert_eq!(add.status.code(), Some(4));
    let err = parse_json_line(&add.stderr);
    assert_eq!(err["error"]["kind"], "Invalid");
    assert_eq!(err["error"]["message"], "sets must be between 1 and 20");

    let total = parse_json_line(&run(&store, &["stats", "--json"]).stdout);
    assert_eq!(total["total"], 30);
}

#[test]
fn not_found_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");

    let delete = run(&store, &["delete", "999"]);
    assert_eq!(delete.status.code(), Some(3));
    let err = parse_json_line(&delete.stderr);
    assert_eq!(err["error"]["kind"], "NotFound");

    let edit = run(&store, &["edit", "999", "--reps", "5"]);
    assert_eq!(edit.status.code(), Some(3));
}

#[test]
fn corrupt_store_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");
    std::fs::write(&store, "{not json").expect("write");

    let list = run(&store, &["list"]);
    assert_eq!(list.status.code(), Some(7));
    let err = parse_json_line(&list.stderr);
    assert_eq!(err["error"]["kind"], "Corrupt");
    assert_eq!(std::fs::read_to_string(&store).expect("read"), "{not json");
}

#[test]
fn usage_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");

    let edit = run(&store, &["edit", "3"]);
    assert_eq!(edit.status.code(), Some(2));

    let both = cmd(&store)
        .args(["--remote", "http://127.0.0.1:1", "list"])
        .output()
        .expect("run");
    assert_eq!(both.status.code(), Some(2));
    let err = parse_json_line(&both.stderr);
    assert_eq!(err["error"]["kind"], "Usage");

    let zero_limit = run(&store, &["--limit", "0", "list"]);
    assert_eq!(zero_limit.status.code(), Some(2));

    let zero_page = run(&store, &["list", "--page", "0"]);
    assert_eq!(zero_page.status.code(), Some(2));
    assert_eq!(parse_json_line(&zero_page.stderr)["error"]["kind"], "Usage");
    assert!(zero_page.stdout.is_empty());
}

#[test]
fn ids_are_not_reused_after_deleting_everything() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = temp.path().join("workouts.json");

    assert!(run(&store, &["list"]).status.success());
    for id in 1..=30 {
        let id = id.to_string();
        let delete = run(&store, &["delete", &id]);
        assert!(delete.status.success(), "{}", String::from_utf8_lossy(&delete.stderr));
    }
    let empty = parse_json_line(&run(&store, &["stats", "--json"]).stdout);
    assert_eq!(empty["total"], 0);

    let add = run(
        &store,
        &[
            "add", "--date", "2026-03-01", "--exercise", "Row", "--sets", "3", "--reps", "10",
            "--weight", "80", "--json",
        ],
    );
    assert!(add.status.success(), "{}", String::from_utf8_lossy(&add.stderr));
    assert_eq!(parse_json_line(&add.stdout)["id"], 31);
}
