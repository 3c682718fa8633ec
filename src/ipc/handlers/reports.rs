use std::collections::HashSet;

use crate::bulletin::{class_results_model, ClassRun};
use crate::calc;
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::helpers::{class_scope, request_config, required_str, snapshot, ClassScope};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Resolves the class, its period inputs and the effective config, then
/// runs `f` over the computed class run.
fn with_class_run(
    state: &AppState,
    req: &Request,
    f: impl FnOnce(&ClassScope<'_>, &ClassRun<'_>) -> serde_json::Value,
) -> serde_json::Value {
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
    f(&scope, &run)
}

fn handle_class_ranking(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_class_run(state, req, |scope, run| {
        ok(
            &req.id,
            json!({
                "classId": scope.class.id,
                "period": run.period(),
                "policy": run.policy(),
                "ranking": run.ranking(),
                "aggregates": run.aggregates(),
            }),
        )
    })
}

fn handle_period_statistics(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_class_run(state, req, |scope, run| {
        ok(
            &req.id,
            json!({
                "classId": scope.class.id,
                "period": run.period(),
                "policy": run.policy(),
                "statistics": run.statistics(),
            }),
        )
    })
}

fn handle_bulletin_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    with_class_run(state, req, |scope, run| {
        let Some(student) = scope.cohort.iter().find(|s| s.id == student_id) else {
            return err(
                &req.id,
                "not_found",
                "student not found in class",
                Some(json!({ "studentId": student_id, "classId": scope.class.id })),
            );
        };
        match run.bulletin(student) {
            Ok(model) => ok(&req.id, json!(model)),
            Err(e) => calc_err(&req.id, e),
        }
    })
}

fn handle_class_bulletins_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_class_run(state, req, |_, run| match run.bulletins() {
        Ok(bulletins) => ok(
            &req.id,
            json!({
                "class": run.class_summary(),
                "period": run.period(),
                "policy": run.policy(),
                "statistics": run.statistics(),
                "bulletins": bulletins,
            }),
        ),
        Err(e) => calc_err(&req.id, e),
    })
}

fn handle_class_results_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snap = match snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scope = match class_scope(snap, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match class_results_model(
        scope.class,
        &scope.cohort,
        scope.subjects.clone(),
        &scope.grades,
        scope.period,
    ) {
        Ok(model) => ok(&req.id, json!(model)),
        Err(e) => calc_err(&req.id, e),
    }
}

fn handle_evaluation_counts(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snap = match snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scope = match class_scope(snap, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let students: HashSet<&str> = scope.cohort.iter().map(|s| s.id.as_str()).collect();
    let counts = calc::evaluation_counts(&scope.grades, &students, scope.period);
    ok(
        &req.id,
        json!({
            "classId": scope.class.id,
            "period": scope.period,
            "counts": counts,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calc.classRanking" => Some(handle_class_ranking(state, req)),
        "calc.periodStatistics" => Some(handle_period_statistics(state, req)),
        "reports.bulletinModel" => Some(handle_bulletin_model(state, req)),
        "reports.classBulletinsModel" => Some(handle_class_bulletins_model(state, req)),
        "reports.classResultsModel" => Some(handle_class_results_model(state, req)),
        "reports.evaluationCounts" => Some(handle_evaluation_counts(state, req)),
        _ => None,
    }
}
