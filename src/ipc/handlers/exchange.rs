use std::path::PathBuf;

use crate::export::{export_class_bundle, verify_class_bundle};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::{class_scope, request_config, required_str, snapshot};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_export_class_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    let snap = match snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let config = match request_config(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scope = match class_scope(snap, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let run = match scope.run(&config) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };

    match export_class_bundle(&run, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "ok": true,
                "path": out_path.to_string_lossy(),
                "bundleFormat": summary.bundle_format,
                "bundleId": summary.bundle_id,
                "entryCount": summary.entry_count,
            }),
        ),
        Err(e) => err(
            &req.id,
            "export_failed",
            format!("{e:#}"),
            Some(json!({ "outPath": out_path.to_string_lossy() })),
        ),
    }
}

fn handle_verify_bundle(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match required_str(req, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    match verify_class_bundle(&in_path) {
        Ok(summary) => ok(&req.id, json!(summary)),
        Err(e) => err(
            &req.id,
            "io_failed",
            format!("{e:#}"),
            Some(json!({ "inPath": in_path.to_string_lossy() })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.exportClassBundle" => Some(handle_export_class_bundle(state, req)),
        "reports.verifyBundle" => Some(handle_verify_bundle(state, req)),
        _ => None,
    }
}
