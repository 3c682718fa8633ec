use super::subject::{subject_average, AveragePolicy};
use super::CalcError;
use crate::model::{GradeEntry, Period, Subject};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAverage {
    pub subject_id: String,
    pub average: Option<f64>,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodAggregate {
    pub student_id: String,
    pub period_average: f64,
    pub total_weighted_points: f64,
    pub total_coefficients: f64,
    pub graded_subjects: usize,
}

impl PeriodAggregate {
    /// A zero `period_average` with no coefficients is "no data", not a low score.
    pub fn is_graded(&self) -> bool {
        self.total_coefficients > 0.0
    }
}

pub fn period_aggregate(
    student_id: &str,
    subjects: &[SubjectAverage],
) -> Result<PeriodAggregate, CalcError> {
    let mut weighted_points = 0.0_f64;
    let mut total_coefficients = 0.0_f64;
    let mut graded_subjects = 0_usize;

    for s in subjects {
        if !(s.coefficient.is_finite() && s.coefficient > 0.0) {
            return Err(CalcError::invalid_input("subject coefficient must be positive")
                .with_details(json!({ "subjectId": s.subject_id, "coefficient": s.coefficient })));
        }
        let Some(avg) = s.average else {
            continue;
        };
        if !avg.is_finite() {
            return Err(CalcError::invalid_input("subject average is not a number")
                .with_details(json!({ "subjectId": s.subject_id })));
        }
        weighted_points += avg * s.coefficient;
        total_coefficients += s.coefficient;
        graded_subjects += 1;
    }

    let period_average = if total_coefficients > 0.0 {
        weighted_points / total_coefficients
    } else {
        0.0
    };

    Ok(PeriodAggregate {
        student_id: student_id.to_string(),
        period_average,
        total_weighted_points: weighted_points,
        total_coefficients,
        graded_subjects,
    })
}

pub fn subject_averages(
    grades: &[GradeEntry],
    student_id: &str,
    subjects: &[Subject],
    period: Period,
    policy: AveragePolicy,
) -> Vec<SubjectAverage> {
    subjects
        .iter()
        .map(|s| SubjectAverage {
            subject_id: s.id.clone(),
            average: subject_average(grades, student_id, &s.id, period, policy),
            coefficient: s.coefficient,
        })
        .collect()
}

pub fn student_period_aggregate(
    grades: &[GradeEntry],
    student_id: &str,
    subjects: &[Subject],
    period: Period,
    policy: AveragePolicy,
) -> Result<(PeriodAggregate, Vec<SubjectAverage>), CalcError> {
    let averages = subject_averages(grades, student_id, subjects, period, policy);
    let aggregate = period_aggregate(student_id, &averages)?;
    Ok((aggregate, averages))
}
