use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn run_tracker(db_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tool-tracker"))
        .arg("--db")
        .arg(db_path)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("tool-tracker command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json_array(output: &Output) -> Vec<Value> {
    let value: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    value.as_array().expect("JSON output should be an array").clone()
}

fn add(db: &Path, machine: &str, tool: &str, date: &str) -> Output {
    run_tracker(
        db,
        &[
            "add",
            "--machine",
            machine,
            "--tool",
            tool,
            "--installed-date",
            date,
        ],
    )
}

#[test]
fn add_list_and_duplicate_paths() {
    let root = unique_workspace("tool-tracker-cli-dispatch");
    let db = root.join("nested/tool_tracker.db");

    let first = add(&db, "srv01", "drill", "2025-01-10");
    assert_success(&first);
    assert!(stdout(&first).contains("Installation record added successfully"));

    let duplicate = add(&db, "srv01", "drill", "2025-01-10");
    assert_failure(&duplicate);
    assert!(stderr(&duplicate).contains("already exists"));

    let listed = run_tracker(&db, &["list", "--json"]);
    assert_success(&listed);
    let rows = json_array(&listed);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["machine"], "srv01");
    assert_eq!(rows[0]["tool"], "drill");
    assert_eq!(rows[0]["installed_date"], "2025-01-10");
    assert!(rows[0]["removal_date"].is_null());

    let table = run_tracker(&db, &["list"]);
    assert_success(&table);
    let text = stdout(&table);
    assert!(text.contains("| Machine"));
    assert!(text.contains("Total records: 1"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn malformed_dates_are_rejected_before_writing() {
    let root = unique_workspace("tool-tracker-cli-dispatch");
    let db = root.join("tool_tracker.db");

    let bad_date = add(&db, "srv01", "drill", "10/01/2025");
    assert_failure(&bad_date);
    assert!(stderr(&bad_date).contains("expected YYYY-MM-DD"));

    let bad_time = run_tracker(
        &db,
        &[
            "add",
            "-m",
            "srv01",
            "-t",
            "drill",
            "--installed-date",
            "2025-01-10",
            "--installation-time",
            "8am",
        ],
    );
    assert_failure(&bad_time);
    assert!(stderr(&bad_time).contains("expected HH:MM:SS"));

    let stats = run_tracker(&db, &["stats", "--json"]);
    assert_success(&stats);
    let value: Value = serde_json::from_slice(&stats.stdout).expect("stats should be JSON");
    assert_eq!(value["total_records"], 0);
    assert_eq!(value["total_machines"], 0);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn search_stats_and_summaries() {
    let root = unique_workspace("tool-tracker-cli-dispatch");
    let db = root.join("tool_tracker.db");

    assert_success(&add(&db, "A", "t1", "2025-01-01"));
    assert_success(&add(&db, "A", "t2", "2025-01-02"));
    assert_success(&add(&db, "A", "t3", "2025-01-03"));
    assert_success(&add(&db, "B", "t1", "2025-01-04"));

    let unlimited = run_tracker(&db, &["list", "--limit", "0", "--json"]);
    assert_success(&unlimited);
    assert_eq!(json_array(&unlimited).len(), 4);

    let limited = run_tracker(&db, &["list", "--limit", "2", "--json"]);
    assert_success(&limited);
    assert_eq!(json_array(&limited).len(), 2);

    let search = run_tracker(&db, &["search", "--query", "T3", "--json"]);
    assert_success(&search);
    assert_eq!(json_array(&search).len(), 1);

    let empty = run_tracker(&db, &["search", "--query", "nothing"]);
    assert_success(&empty);
    assert!(stdout(&empty).contains("No records found matching 'nothing'"));

    let stats = run_tracker(&db, &["stats", "--json"]);
    assert_success(&stats);
    let value: Value = serde_json::from_slice(&stats.stdout).expect("stats should be JSON");
    assert_eq!(value["total_records"], 4);
    assert_eq!(value["total_machines"], 2);
    assert_eq!(value["total_tools"], 3);
    assert_eq!(value["tools_per_machine"][0]["machine"], "A");
    assert_eq!(value["tools_per_machine"][0]["count"], 3);
    assert_eq!(value["tools_per_machine"][1]["machine"], "B");

    let stats_text = run_tracker(&db, &["stats"]);
    assert_success(&stats_text);
    assert!(stdout(&stats_text).contains("Total Installation Records: 4"));

    let machines = run_tracker(&db, &["machines"]);
    assert_success(&machines);
    assert!(stdout(&machines).contains("- A (3 tool(s))"));

    let tools = run_tracker(&db, &["tools", "--tool", "t1"]);
    assert_success(&tools);
    assert!(stdout(&tools).contains("Installed on: 2 machine(s)"));

    let unknown = run_tracker(&db, &["machines", "--machine", "ghost"]);
    assert_success(&unknown);
    assert!(stdout(&unknown).contains("Unknown machine 'ghost'"));

    let unknown_tool = run_tracker(&db, &["tools", "--tool", "ghost", "--json"]);
    assert_success(&unknown_tool);
    assert!(json_array(&unknown_tool).is_empty());

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn remove_marks_installation_inactive() {
    let root = unique_workspace("tool-tracker-cli-dispatch");
    let db = root.join("tool_tracker.db");

    assert_success(&add(&db, "srv01", "drill", "2025-01-10"));
    assert_success(&add(&db, "srv01", "saw", "2025-01-11"));

    let remove_args = [
        "remove",
        "-m",
        "srv01",
        "-t",
        "drill",
        "--installed-date",
        "2025-01-10",
        "--removal-date",
        "2025-02-01",
    ];
    assert_success(&run_tracker(&db, &remove_args));
    assert_failure(&run_tracker(&db, &remove_args));

    let active = run_tracker(&db, &["list", "--active", "--json"]);
    assert_success(&active);
    let rows = json_array(&active);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["tool"], "saw");

    let all = run_tracker(&db, &["list", "--machine", "srv01", "--json"]);
    assert_success(&all);
    assert_eq!(json_array(&all).len(), 2);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn register_commands_create_entities_once() {
    let root = unique_workspace("tool-tracker-cli-dispatch");
    let db = root.join("tool_tracker.db");

    assert_success(&run_tracker(&db, &["register", "machine", "srv09"]));
    let again = run_tracker(&db, &["register", "machine", "srv09"]);
    assert_failure(&again);
    assert!(stderr(&again).contains("Machine 'srv09' already exists"));

    assert_success(&run_tracker(
        &db,
        &["register", "tool", "drill", "--tool-type", "power"],
    ));
    let tools = run_tracker(&db, &["tools"]);
    assert_success(&tools);
    assert!(stdout(&tools).contains("drill (power): installed on 0 machine(s)"));

    let idle = run_tracker(&db, &["machines", "--machine", "srv09"]);
    assert_success(&idle);
    assert!(stdout(&idle).contains("No records found for machine 'srv09'"));
    assert!(!stdout(&idle).contains("Unknown machine"));

    let _ = std::fs::remove_dir_all(root);
}
