use crate::config::CalcConfig;
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::Records;
use crate::snapshot::Snapshot;
use serde_json::json;
use std::path::PathBuf;

fn skip_invalid(req: &Request) -> bool {
    req.params
        .get("skipInvalid")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "snapshotLoaded": state.snapshot.is_some(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    if !path.is_dir() {
        return err(
            &req.id,
            "bad_params",
            "workspace path is not a directory",
            Some(json!({ "path": path.to_string_lossy() })),
        );
    }

    let records = match Snapshot::read_workspace_records(&path) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "io_failed", format!("{e:#}"), None),
    };
    let loaded = match records {
        Some(records) => match Snapshot::from_records(records, skip_invalid(req)) {
            Ok(v) => Some(v),
            Err(e) => return calc_err(&req.id, e),
        },
        None => None,
    };

    // Best-effort: a broken config file must not prevent the workspace from opening.
    let config = match CalcConfig::load_from_workspace(&path) {
        Ok(Some(cfg)) => cfg,
        Ok(None) => CalcConfig::default(),
        Err(e) => {
            tracing::warn!("ignoring workspace config: {e:#}");
            CalcConfig::default()
        }
    };

    tracing::info!(path = %path.to_string_lossy(), records = loaded.is_some(), "workspace selected");
    state.workspace = Some(path.clone());
    state.config = config;
    // Without a school.json, records loaded earlier through snapshot.load stay.
    let summary = match loaded {
        Some((snap, summary)) => {
            state.snapshot = Some(snap);
            Some(summary)
        }
        None => None,
    };

    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "snapshotLoaded": state.snapshot.is_some(),
            "summary": summary,
            "config": state.config,
        }),
    )
}

fn handle_snapshot_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("records") else {
        return err(&req.id, "bad_params", "missing records", None);
    };
    let records: Records = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("records are malformed: {e}"),
                None,
            )
        }
    };

    match Snapshot::from_records(records, skip_invalid(req)) {
        Ok((snap, summary)) => {
            tracing::info!(
                students = summary.students,
                grades = summary.grades,
                rejected = summary.rejected.len(),
                "snapshot loaded"
            );
            state.snapshot = Some(snap);
            ok(&req.id, json!(summary))
        }
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "config": state.config }))
}

fn handle_config_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(patch) = req.params.get("config") else {
        return err(&req.id, "bad_params", "missing config", None);
    };
    match state.config.merged(patch) {
        Ok(cfg) => {
            state.config = cfg;
            ok(&req.id, json!({ "config": state.config }))
        }
        Err(e) => err(&req.id, "bad_params", format!("invalid config: {e}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "snapshot.load" => Some(handle_snapshot_load(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        "config.set" => Some(handle_config_set(state, req)),
        _ => None,
    }
}
