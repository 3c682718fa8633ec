use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

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

fn request_ok(
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
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn tied_records() -> serde_json::Value {
    let student = |id: &str| {
        json!({ "id": id, "matricule": format!("M-{}", id), "lastName": id, "firstName": "x", "classId": "c1" })
    };
    let exam = |id: &str, student: &str, score: f64| {
        json!({
            "id": id,
            "studentId": student,
            "subjectId": "math",
            "kind": "exam",
            "score": score,
            "maxScore": 20,
            "period": 2,
            "academicYear": "2024-2025",
        })
    };
    json!({
        "classes": [
            { "id": "c1", "name": "3e B", "level": "3e", "levelType": "secondary", "academicYear": "2024-2025" }
        ],
        "students": [student("a"), student("b"), student("c")],
        "subjects": [
            { "id": "math", "name": "Mathématiques", "coefficient": 2, "levels": ["3e"] }
        ],
        "grades": [
            exam("g1", "a", 15.0),
            exam("g2", "b", 15.0),
            exam("g3", "c", 10.0)
        ]
    })
}

fn ranks(result: &serde_json::Value) -> Vec<(String, Option<u64>, String)> {
    result["ranking"]
        .as_array()
        .expect("ranking")
        .iter()
        .map(|r| {
            (
                r["studentId"].as_str().unwrap_or("").to_string(),
                r["rank"].as_u64(),
                r["rankLabel"].as_str().unwrap_or("").to_string(),
            )
        })
        .collect()
}

#[test]
fn sequential_ranking_breaks_ties_by_roster_order() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({ "records": tied_records() }),
    );

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "calc.classRanking",
        json!({ "classId": "c1", "period": 2 }),
    );
    assert_eq!(
        ranks(&r),
        vec![
            ("a".to_string(), Some(1), "1er".to_string()),
            ("b".to_string(), Some(2), "2e".to_string()),
            ("c".to_string(), Some(3), "3e".to_string()),
        ]
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn competition_ranking_shares_rank_per_request_and_per_session() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({ "records": tied_records() }),
    );

    let per_request = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "calc.classRanking",
        json!({ "classId": "c1", "period": 2, "config": { "ranking": "competition" } }),
    );
    let expected = vec![
        ("a".to_string(), Some(1), "1er".to_string()),
        ("b".to_string(), Some(1), "1er".to_string()),
        ("c".to_string(), Some(3), "3e".to_string()),
    ];
    assert_eq!(ranks(&per_request), expected);

    // The override does not stick.
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "calc.classRanking",
        json!({ "classId": "c1", "period": 2 }),
    );
    assert_eq!(again["ranking"][1]["rank"], 2);

    let cfg = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "config.set",
        json!({ "config": { "ranking": "competition" } }),
    );
    assert_eq!(cfg["config"]["ranking"], "competition");
    assert_eq!(cfg["config"]["policies"]["secondary"], "bucketBlend");

    let session = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "calc.classRanking",
        json!({ "classId": "c1", "period": 2 }),
    );
    assert_eq!(ranks(&session), expected);

    drop(stdin);
    let _ = child.wait();
}
