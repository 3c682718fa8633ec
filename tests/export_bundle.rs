use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_bulletind");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn bulletind");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
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
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn records() -> serde_json::Value {
    json!({
        "classes": [
            { "id": "c1", "name": "Tle D", "level": "Tle", "levelType": "secondary", "academicYear": "2024-2025" }
        ],
        "students": [
            { "id": "s1", "matricule": "M/01", "lastName": "Ouattara", "firstName": "Seydou", "classId": "c1" },
            { "id": "s2", "matricule": "", "lastName": "Konan", "firstName": "Aya", "classId": "c1", "status": "transferred" }
        ],
        "subjects": [
            { "id": "phy", "name": "Physique-Chimie", "coefficient": 5, "levels": ["Tle"] }
        ],
        "grades": [
            { "id": "g1", "studentId": "s1", "subjectId": "phy", "kind": "homework", "score": 13, "maxScore": 20, "period": 1, "academicYear": "2024-2025" },
            { "id": "g2", "studentId": "s2", "subjectId": "phy", "kind": "exam", "score": 11, "maxScore": 20, "period": 1, "academicYear": "2024-2025" }
        ]
    })
}

#[test]
fn exported_bundle_verifies() {
    let workspace = temp_dir("bulletind-export");
    let out = workspace.join("out").join("tle-d-t1.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({ "records": records() }),
    );

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "reports.exportClassBundle",
        json!({ "classId": "c1", "period": 1, "outPath": out.to_string_lossy() }),
    );
    assert_eq!(exported["bundleFormat"], "bulletind-class-bundle-v1");
    // statistics + two bulletins + manifest
    assert_eq!(exported["entryCount"], 4);
    assert!(out.is_file());
    let bundle_id = exported["bundleId"].as_str().expect("bundleId").to_string();

    let verified = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "reports.verifyBundle",
        json!({ "inPath": out.to_string_lossy() }),
    );
    assert_eq!(verified["valid"], true);
    assert_eq!(verified["bundleId"], bundle_id.as_str());
    assert_eq!(verified["entryCount"], 3);
    assert_eq!(verified["mismatches"].as_array().map(|a| a.len()), Some(0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn export_and_verify_report_failures() {
    let workspace = temp_dir("bulletind-export-fail");
    let not_a_zip = workspace.join("garbage.zip");
    std::fs::write(&not_a_zip, b"not a zip").expect("write garbage");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({ "records": records() }),
    );

    let missing_out = request(
        &mut stdin,
        &mut reader,
        "2",
        "reports.exportClassBundle",
        json!({ "classId": "c1", "period": 1 }),
    );
    assert_eq!(missing_out["error"]["code"], "bad_params");

    // A directory cannot be opened as the output file.
    let into_dir = request(
        &mut stdin,
        &mut reader,
        "3",
        "reports.exportClassBundle",
        json!({ "classId": "c1", "period": 1, "outPath": workspace.to_string_lossy() }),
    );
    assert_eq!(into_dir["error"]["code"], "export_failed");

    let garbage = request(
        &mut stdin,
        &mut reader,
        "4",
        "reports.verifyBundle",
        json!({ "inPath": not_a_zip.to_string_lossy() }),
    );
    assert_eq!(garbage["error"]["code"], "io_failed");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
