use std::borrow::Cow;

use serde_json::json;

use crate::bulletin::ClassRun;
use crate::calc::CalcError;
use crate::config::CalcConfig;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::{ClassInfo, GradeEntry, Period, Student, Subject};
use crate::snapshot::Snapshot;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn required_period(req: &Request) -> Result<Period, serde_json::Value> {
    let Some(raw) = req.params.get("period") else {
        return Err(err(&req.id, "bad_params", "missing period", None));
    };
    raw.as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .and_then(Period::new)
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                "period must be 1, 2 or 3",
                Some(json!({ "period": raw })),
            )
        })
}

pub fn snapshot<'a>(state: &'a AppState, req: &Request) -> Result<&'a Snapshot, serde_json::Value> {
    state.snapshot.as_ref().ok_or_else(|| {
        err(
            &req.id,
            "no_snapshot",
            "select a workspace or load records first",
            None,
        )
    })
}

/// Workspace config with the request's `config` object laid over it.
pub fn request_config(state: &AppState, req: &Request) -> Result<CalcConfig, serde_json::Value> {
    match req.params.get("config") {
        None => Ok(state.config),
        Some(v) if v.is_null() => Ok(state.config),
        Some(v) => state
            .config
            .merged(v)
            .map_err(|e| err(&req.id, "bad_params", format!("invalid config: {e}"), None)),
    }
}

/// Inputs of one class for one period, resolved from the snapshot.
pub struct ClassScope<'a> {
    pub class: &'a ClassInfo,
    pub cohort: Vec<&'a Student>,
    pub subjects: Vec<Subject>,
    pub grades: Cow<'a, [GradeEntry]>,
    pub period: Period,
}

impl ClassScope<'_> {
    pub fn run(&self, config: &CalcConfig) -> Result<ClassRun<'_>, CalcError> {
        ClassRun::new(
            self.class,
            self.cohort.clone(),
            self.subjects.clone(),
            &self.grades,
            self.period,
            config,
        )
    }
}

pub fn class_scope<'a>(
    snap: &'a Snapshot,
    req: &Request,
) -> Result<ClassScope<'a>, serde_json::Value> {
    let class_id = required_str(req, "classId")?;
    let period = required_period(req)?;
    let Some(class) = snap.class(&class_id) else {
        return Err(err(
            &req.id,
            "not_found",
            "class not found",
            Some(json!({ "classId": class_id })),
        ));
    };
    let academic_year = optional_str(req, "academicYear");

    Ok(ClassScope {
        class,
        cohort: snap.cohort(&class.id),
        subjects: snap.applicable_subjects(class),
        grades: snap.class_grades(class, academic_year.as_deref()),
        period,
    })
}
