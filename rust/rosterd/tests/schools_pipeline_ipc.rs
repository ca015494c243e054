use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};


fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .env_remove("ROSTERD_ITEMS_PER_PAGE")
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

fn names(page: &serde_json::Value) -> Vec<String> {
    page["rows"]
        .as_array()
        .expect("rows array")
        .iter()
        .map(|r| r["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn schools_filter_sort_and_paginate() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(&mut stdin, &mut reader, "1", "schools.open", json!({}));
    assert_eq!(opened["totalCount"], 3);
    assert_eq!(opened["totalPages"], 1);
    assert_eq!(opened["canNext"], false);

    for n in 4..=11 {
        let created = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{n}"),
            "schools.create",
            json!({
                "record": {
                    "name": format!("School {n}"),
                    "code": format!("SCH-{n:02}"),
                    "email": format!("office@school{n}.edu"),
                    "address": format!("{n} Main Road"),
                }
            }),
        );
        assert_eq!(created["record"]["id"], n);
        assert_eq!(created["record"]["status"], "active");
    }

    let last = request_ok(&mut stdin, &mut reader, "2", "schools.page", json!({ "to": "last" }));
    assert_eq!(last["totalCount"], 11);
    assert_eq!(last["totalPages"], 3);
    assert_eq!(last["currentPage"], 3);
    assert_eq!(names(&last), vec!["School 11".to_string()]);
    assert_eq!(last["canPrev"], true);
    assert_eq!(last["canNext"], false);

    // Out-of-range targets clamp.
    let beyond = request_ok(&mut stdin, &mut reader, "3", "schools.page", json!({ "to": 99 }));
    assert_eq!(beyond["currentPage"], 3);
    let next = request_ok(&mut stdin, &mut reader, "4", "schools.page", json!({ "to": "next" }));
    assert_eq!(next["currentPage"], 3);

    let searched = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "schools.query",
        json!({ "search": "SCHOOL" }),
    );
    assert_eq!(searched["currentPage"], 1);
    assert_eq!(searched["filteredCount"], 9);
    assert_eq!(searched["totalPages"], 2);
    assert_eq!(names(&searched)[0], "Greenfield Public School");

    let green = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "schools.query",
        json!({ "search": "green", "filters": { "status": "active" } }),
    );
    assert_eq!(green["filteredCount"], 1);
    assert_eq!(names(&green), vec!["Greenfield Public School".to_string()]);
    assert_eq!(green["filter"]["categorical"]["status"], "active");

    let inactive = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "schools.query",
        json!({ "search": "", "filters": { "status": "inactive" } }),
    );
    assert_eq!(names(&inactive), vec!["Excellence International".to_string()]);

    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "schools.query",
        json!({ "filters": { "status": "all" }, "sort": { "key": "name", "direction": "desc" } }),
    );
    assert_eq!(cleared["filteredCount"], 11);
    assert_eq!(cleared["sort"]["direction"], "descending");
    let desc = names(&cleared);
    assert_eq!(desc[0], "Sunshine Academy");
    assert_eq!(desc[1], "School 9");

    let asc = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "schools.query",
        json!({ "sort": { "key": "name", "direction": "ascending" }, "page": 3 }),
    );
    assert_eq!(asc["currentPage"], 3);
    assert_eq!(names(&asc), vec!["Sunshine Academy".to_string()]);

    // Sorting leaves the page where it is; a no-op search does not reset it.
    let same = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "schools.query",
        json!({ "search": "", "sort": { "key": "code", "direction": "asc" } }),
    );
    assert_eq!(same["currentPage"], 3);

    let unsortable = request(
        &mut stdin,
        &mut reader,
        "11",
        "schools.query",
        json!({ "sort": { "key": "address", "direction": "asc" } }),
    );
    assert_eq!(error_code(&unsortable), Some("bad_params"));
    assert!(unsortable["error"]["details"]["sortable"].is_array());

    let unfilterable = request(
        &mut stdin,
        &mut reader,
        "12",
        "schools.query",
        json!({ "filters": { "name": "Sunshine Academy" } }),
    );
    assert_eq!(error_code(&unfilterable), Some("bad_params"));

    // Rejected queries leave the view untouched.
    let after = request_ok(&mut stdin, &mut reader, "13", "schools.query", json!({}));
    assert_eq!(after["currentPage"], 3);
    assert_eq!(after["sort"]["key"], "code");

    let nothing = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "schools.query",
        json!({ "search": "no such school" }),
    );
    assert_eq!(nothing["filteredCount"], 0);
    assert_eq!(nothing["totalPages"], 1);
    assert_eq!(nothing["currentPage"], 1);
    assert_eq!(nothing["canNext"], false);

    drop(stdin);
    let _ = child.wait();
}
