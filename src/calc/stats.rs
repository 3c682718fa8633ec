use super::aggregate::PeriodAggregate;
use crate::model::{EvaluationKind, GradeEntry, Period};
use serde::Serialize;
use std::collections::HashSet;

/// Class-wide extremes and mean of the period averages. Only students with at
/// least one graded subject take part; an empty field yields zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStatistics {
    pub min_average: f64,
    pub max_average: f64,
    pub mean_average: f64,
    pub cohort_size: usize,
    pub graded_count: usize,
}

pub fn period_statistics(aggregates: &[PeriodAggregate]) -> PeriodStatistics {
    let graded: Vec<f64> = aggregates
        .iter()
        .filter(|a| a.is_graded())
        .map(|a| a.period_average)
        .collect();
    if graded.is_empty() {
        return PeriodStatistics {
            cohort_size: aggregates.len(),
            ..PeriodStatistics::default()
        };
    }

    let max_average = graded.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_average = graded.iter().copied().fold(f64::INFINITY, f64::min);
    let mean_average = graded.iter().sum::<f64>() / (graded.len() as f64);

    PeriodStatistics {
        min_average,
        max_average,
        mean_average,
        cohort_size: aggregates.len(),
        graded_count: graded.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationCounts {
    pub homework: usize,
    pub exam: usize,
    pub oral: usize,
    pub total: usize,
}

pub fn evaluation_counts(
    grades: &[GradeEntry],
    students: &HashSet<&str>,
    period: Period,
) -> EvaluationCounts {
    let mut counts = EvaluationCounts::default();
    for g in grades
        .iter()
        .filter(|g| g.period == period && students.contains(g.student_id.as_str()))
    {
        match g.kind {
            EvaluationKind::Homework => counts.homework += 1,
            EvaluationKind::Exam => counts.exam += 1,
            EvaluationKind::Oral => counts.oral += 1,
        }
        counts.total += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(id: &str, avg: f64, coef: f64) -> PeriodAggregate {
        PeriodAggregate {
            student_id: id.into(),
            period_average: avg,
            total_weighted_points: avg * coef,
            total_coefficients: coef,
            graded_subjects: usize::from(coef > 0.0),
        }
    }

    #[test]
    fn min_max_mean_over_cohort() {
        let s = period_statistics(&[agg("a", 12.0, 1.0), agg("b", 8.0, 1.0), agg("c", 20.0, 1.0)]);
        assert_eq!(s.min_average, 8.0);
        assert_eq!(s.max_average, 20.0);
        assert!((s.mean_average - 40.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.graded_count, 3);
    }

    #[test]
    fn empty_cohort_is_all_zero() {
        let s = period_statistics(&[]);
        assert_eq!(s, PeriodStatistics::default());
    }

    #[test]
    fn ungraded_students_do_not_drag_the_minimum() {
        let s = period_statistics(&[agg("a", 14.0, 2.0), agg("b", 0.0, 0.0)]);
        assert_eq!(s.min_average, 14.0);
        assert_eq!(s.mean_average, 14.0);
        assert_eq!(s.cohort_size, 2);
        assert_eq!(s.graded_count, 1);
    }

    #[test]
    fn counts_kinds_for_the_given_students_and_period() {
        let p1 = Period::new(1).expect("period");
        let p2 = Period::new(2).expect("period");
        let mk = |student: &str, kind, period| GradeEntry {
            id: String::new(),
            student_id: student.into(),
            subject_id: "math".into(),
            class_id: None,
            kind,
            score: 10.0,
            max_score: 20.0,
            period,
            academic_year: String::new(),
        };
        let grades = vec![
            mk("s1", EvaluationKind::Homework, p1),
            mk("s1", EvaluationKind::Exam, p1),
            mk("s2", EvaluationKind::Oral, p1),
            mk("s2", EvaluationKind::Oral, p2),
            mk("other", EvaluationKind::Exam, p1),
        ];
        let students: HashSet<&str> = ["s1", "s2"].into_iter().collect();
        let c = evaluation_counts(&grades, &students, p1);
        assert_eq!(
            c,
            EvaluationCounts {
                homework: 1,
                exam: 1,
                oral: 1,
                total: 3
            }
        );
    }
}
