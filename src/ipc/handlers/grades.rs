use crate::calc::{self, AveragePolicy};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::{optional_str, request_config, required_period, required_str, snapshot};
use crate::ipc::types::{AppState, Request};
use crate::model::{ClassInfo, GradeEntry};
use crate::snapshot::Snapshot;
use crate::validate::validate_grade;
use serde_json::json;

/// The class a student belongs to; it decides policy and academic year.
fn student_class<'a>(
    snap: &'a Snapshot,
    req: &Request,
    student_id: &str,
) -> Result<&'a ClassInfo, serde_json::Value> {
    let Some(student) = snap.student(student_id) else {
        return Err(err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "studentId": student_id })),
        ));
    };
    snap.class(&student.class_id).ok_or_else(|| {
        err(
            &req.id,
            "not_found",
            "class of student not found",
            Some(json!({ "classId": student.class_id })),
        )
    })
}

fn handle_grades_validate(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("grade") else {
        return err(&req.id, "bad_params", "missing grade", None);
    };
    let grade: GradeEntry = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return ok(
                &req.id,
                json!({
                    "valid": false,
                    "issues": [{ "entity": "grade", "id": "", "field": "", "message": e.to_string() }],
                }),
            )
        }
    };
    let issues = validate_grade(&grade);
    ok(
        &req.id,
        json!({ "valid": issues.is_empty(), "issues": issues }),
    )
}

fn handle_calc_subject_average(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snap = match snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let period = match required_period(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let config = match request_config(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if snap.subject(&subject_id).is_none() {
        return err(
            &req.id,
            "not_found",
            "subject not found",
            Some(json!({ "subjectId": subject_id })),
        );
    }

    let class = match student_class(snap, req, &student_id) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let policy = match req.params.get("policy").filter(|v| !v.is_null()) {
        Some(v) => match serde_json::from_value::<AveragePolicy>(v.clone()) {
            Ok(p) => p,
            Err(_) => {
                return err(
                    &req.id,
                    "bad_params",
                    "policy must be bucketBlend or flatMean",
                    Some(json!({ "policy": v })),
                )
            }
        },
        None => config.policies.for_level(class.level_type),
    };

    let academic_year = optional_str(req, "academicYear");
    let grades = snap.class_grades(class, academic_year.as_deref());
    let buckets = calc::bucket_averages(&grades, &student_id, &subject_id, period);
    ok(
        &req.id,
        json!({
            "studentId": student_id,
            "subjectId": subject_id,
            "period": period,
            "policy": policy,
            "buckets": buckets,
            "average": buckets.average(policy),
        }),
    )
}

fn handle_calc_period_aggregate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snap = match snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let period = match required_period(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let config = match request_config(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class = match student_class(snap, req, &student_id) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let policy = config.policies.for_level(class.level_type);
    let subjects = snap.applicable_subjects(class);
    let academic_year = optional_str(req, "academicYear");
    let grades = snap.class_grades(class, academic_year.as_deref());
    match calc::student_period_aggregate(&grades, &student_id, &subjects, period, policy) {
        Ok((aggregate, averages)) => ok(
            &req.id,
            json!({
                "period": period,
                "policy": policy,
                "aggregate": aggregate,
                "subjects": averages,
            }),
        ),
        Err(e) => calc_err(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.validate" => Some(handle_grades_validate(state, req)),
        "calc.subjectAverage" => Some(handle_calc_subject_average(state, req)),
        "calc.periodAggregate" => Some(handle_calc_period_aggregate(state, req)),
        _ => None,
    }
}
