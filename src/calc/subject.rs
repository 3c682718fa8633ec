use crate::model::{EvaluationKind, GradeEntry, Period};
use serde::{Deserialize, Serialize};

/// How the entries of one subject are folded into a single average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AveragePolicy {
    /// Mean of the homework bucket and the exam bucket, each bucket counting
    /// for half whatever its entry count. Oral entries are reported but not blended.
    BucketBlend,
    /// Plain mean over every entry of the subject, whatever its kind.
    FlatMean,
}

#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / (self.count as f64))
        } else {
            None
        }
    }
}

/// Per-kind means (20-point scale) for one student, subject and period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAverages {
    pub homework: Option<f64>,
    pub exam: Option<f64>,
    pub oral: Option<f64>,
    pub flat: Option<f64>,
    pub entry_count: usize,
    pub excluded_count: usize,
}

impl BucketAverages {
    pub fn average(&self, policy: AveragePolicy) -> Option<f64> {
        match policy {
            AveragePolicy::BucketBlend => match (self.homework, self.exam) {
                (Some(h), Some(e)) => Some((h + e) / 2.0),
                (Some(h), None) => Some(h),
                (None, Some(e)) => Some(e),
                (None, None) => None,
            },
            AveragePolicy::FlatMean => self.flat,
        }
    }
}

pub fn bucket_averages(
    grades: &[GradeEntry],
    student_id: &str,
    subject_id: &str,
    period: Period,
) -> BucketAverages {
    let mut homework = Mean::default();
    let mut exam = Mean::default();
    let mut oral = Mean::default();
    let mut flat = Mean::default();
    let mut excluded_count = 0_usize;

    for g in grades {
        if g.student_id != student_id || g.subject_id != subject_id || g.period != period {
            continue;
        }
        // A zero maximum cannot be normalized; such entries never count.
        let Some(v) = g.normalized() else {
            excluded_count += 1;
            continue;
        };
        match g.kind {
            EvaluationKind::Homework => homework.push(v),
            EvaluationKind::Exam => exam.push(v),
            EvaluationKind::Oral => oral.push(v),
        }
        flat.push(v);
    }

    BucketAverages {
        homework: homework.value(),
        exam: exam.value(),
        oral: oral.value(),
        flat: flat.value(),
        entry_count: flat.count,
        excluded_count,
    }
}

/// `None` means "not graded" and must never be read as a zero.
pub fn subject_average(
    grades: &[GradeEntry],
    student_id: &str,
    subject_id: &str,
    period: Period,
    policy: AveragePolicy,
) -> Option<f64> {
    bucket_averages(grades, student_id, subject_id, period).average(policy)
}
