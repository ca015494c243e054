use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(items_per_page: Option<&str>) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut cmd = Command::new(exe);
    match items_per_page {
        Some(v) => cmd.env("ROSTERD_ITEMS_PER_PAGE", v),
        None => cmd.env_remove("ROSTERD_ITEMS_PER_PAGE"),
    };
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}
fn send_line(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, line: &str) -> serde_json::Value {
    writeln!(stdin, "{}", line).expect("write request");
    stdin.flush().expect("flush request");

    let mut out = String::new();
    reader.read_line(&mut out).expect("read response line");
    assert!(!out.trim().is_empty(), "empty response for {}", line);
    serde_json::from_str(out.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    let value = send_line(stdin, reader, &payload.to_string());
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

fn ids(page: &serde_json::Value) -> Vec<i64> {
    page["rows"]
        .as_array()
        .expect("rows array")
        .iter()
        .filter_map(|r| r["id"].as_i64())
        .collect()
}

fn select_workspace(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, workspace: &Path) -> serde_json::Value {
    request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    )
}

#[test]
fn workspace_keeps_config_and_records_across_restarts() {
    let workspace = temp_dir("rosterd-persist");

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar(None);
        let selected = select_workspace(&mut stdin, &mut reader, &workspace);
        assert_eq!(selected["config"]["itemsPerPage"], 5);
        assert!(workspace.join("rosterd.sqlite3").is_file());

        let cfg = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "config.update",
            json!({ "patch": { "itemsPerPage": 2 } }),
        );
        assert_eq!(cfg["config"]["itemsPerPage"], 2);

        let budgets = request_ok(&mut stdin, &mut reader, "2", "budgets.open", json!({}));
        assert_eq!(budgets["totalCount"], 6);
        assert_eq!(budgets["itemsPerPage"], 2);
        assert_eq!(budgets["totalPages"], 3);

        let created = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "budgets.create",
            json!({
                "record": { "name": "Exam Papers", "category": "academic", "allocated": 8000, "spent": 0 }
            }),
        );
        assert_eq!(created["record"]["id"], 7);

        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "budgets.delete",
            json!({ "id": 1, "confirm": true }),
        );

        let summary = request_ok(&mut stdin, &mut reader, "5", "budgets.summary", json!({}));
        assert_eq!(summary["count"], 6);
        assert_eq!(summary["allocated"], 190000.0);
        assert_eq!(summary["spent"], 114500.0);
        assert_eq!(summary["overBudget"], json!([2]));

        let staff = request_ok(&mut stdin, &mut reader, "6", "staff.open", json!({}));
        let staff_ids: Vec<String> = staff["rows"]
            .as_array()
            .expect("rows")
            .iter()
            .map(|r| r["id"].as_str().expect("staff id").to_string())
            .collect();
        assert_eq!(staff_ids.len(), 2);
        for id in ["1700000000001", "1700000000002", "1700000000003", "1700000000004"] {
            let _ = request_ok(
                &mut stdin,
                &mut reader,
                &format!("del-{id}"),
                "staff.delete",
                json!({ "id": id, "confirm": true }),
            );
        }

        drop(stdin);
        let _ = child.wait();
    }

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar(None);
        let before = request_ok(&mut stdin, &mut reader, "0", "config.get", json!({}));
        assert_eq!(before["config"]["itemsPerPage"], 5);

        let selected = select_workspace(&mut stdin, &mut reader, &workspace);
        assert_eq!(selected["config"]["itemsPerPage"], 2);

        let budgets = request_ok(&mut stdin, &mut reader, "1", "budgets.open", json!({}));
        assert_eq!(budgets["totalCount"], 6);
        assert_eq!(ids(&budgets), vec![2, 3]);
        let last = request_ok(&mut stdin, &mut reader, "2", "budgets.page", json!({ "to": "last" }));
        assert_eq!(ids(&last), vec![6, 7]);

        let gone = request(&mut stdin, &mut reader, "3", "budgets.get", json!({ "id": 1 }));
        assert_eq!(error_code(&gone), Some("not_found"));

        let staff = request_ok(&mut stdin, &mut reader, "4", "staff.open", json!({}));
        assert_eq!(staff["totalCount"], 0);
        assert_eq!(staff["totalPages"], 1);

        let reseeded = request_ok(&mut stdin, &mut reader, "5", "staff.open", json!({ "seed": true }));
        assert_eq!(reseeded["totalCount"], 4);

        drop(stdin);
        let _ = child.wait();
    }

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn selecting_a_workspace_remounts_screens() {
    let workspace = temp_dir("rosterd-remount");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(Some("3"));

    let cfg = request_ok(&mut stdin, &mut reader, "1", "config.get", json!({}));
    assert_eq!(cfg["config"]["itemsPerPage"], 3);

    let students = request_ok(&mut stdin, &mut reader, "2", "students.open", json!({}));
    assert_eq!(students["totalPages"], 3);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.delete",
        json!({ "id": 8, "confirm": true }),
    );

    let _ = select_workspace(&mut stdin, &mut reader, &workspace);
    let closed = request(&mut stdin, &mut reader, "4", "students.query", json!({}));
    assert_eq!(error_code(&closed), Some("not_open"));

    // The workspace starts from its own demo data, not the in-memory edits.
    let reopened = request_ok(&mut stdin, &mut reader, "5", "students.open", json!({}));
    assert_eq!(reopened["totalCount"], 8);
    assert_eq!(reopened["itemsPerPage"], 3);

    let resized = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "config.update",
        json!({ "patch": { "itemsPerPage": 4 } }),
    );
    assert_eq!(resized["config"]["itemsPerPage"], 4);
    let page = request_ok(&mut stdin, &mut reader, "7", "students.query", json!({}));
    assert_eq!(page["itemsPerPage"], 4);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["currentPage"], 1);

    let unknown = request(
        &mut stdin,
        &mut reader,
        "8",
        "config.update",
        json!({ "patch": { "theme": "dark" } }),
    );
    assert_eq!(error_code(&unknown), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn opening_with_seeding_off_does_not_block_later_seeding() {
    let workspace = temp_dir("rosterd-seed-off");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(None);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "config.update",
        json!({ "patch": { "seedDemoData": false } }),
    );
    let empty = request_ok(&mut stdin, &mut reader, "2", "students.open", json!({}));
    assert_eq!(empty["totalCount"], 0);
    let _ = request_ok(&mut stdin, &mut reader, "3", "students.close", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "config.update",
        json!({ "patch": { "seedDemoData": true } }),
    );
    let seeded = request_ok(&mut stdin, &mut reader, "5", "students.open", json!({}));
    assert_eq!(seeded["totalCount"], 8);

    // Same sequence against a workspace database.
    let _ = select_workspace(&mut stdin, &mut reader, &workspace);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "config.update",
        json!({ "patch": { "seedDemoData": false } }),
    );
    let empty = request_ok(&mut stdin, &mut reader, "7", "teachers.open", json!({}));
    assert_eq!(empty["totalCount"], 0);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "config.update",
        json!({ "patch": { "seedDemoData": true } }),
    );
    let seeded = request_ok(&mut stdin, &mut reader, "9", "teachers.open", json!({}));
    assert_eq!(seeded["totalCount"], 4);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
