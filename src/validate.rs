use crate::model::{ClassInfo, GradeEntry, Records, Student, Subject};
use serde::Serialize;

pub const MIN_COEFFICIENT: f64 = 0.5;
pub const MAX_COEFFICIENT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub entity: &'static str,
    pub id: String,
    pub field: &'static str,
    pub message: String,
}

struct Issues<'a> {
    entity: &'static str,
    id: &'a str,
    out: Vec<ValidationIssue>,
}

impl<'a> Issues<'a> {
    fn new(entity: &'static str, id: &'a str) -> Self {
        Self {
            entity,
            id,
            out: Vec::new(),
        }
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.out.push(ValidationIssue {
            entity: self.entity,
            id: self.id.to_string(),
            field,
            message: message.into(),
        });
    }

    fn required(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, format!("{field} is required"));
        }
    }
}

pub fn validate_grade(g: &GradeEntry) -> Vec<ValidationIssue> {
    let mut issues = Issues::new("grade", &g.id);
    issues.required("studentId", &g.student_id);
    issues.required("subjectId", &g.subject_id);
    issues.required("academicYear", &g.academic_year);

    if !g.max_score.is_finite() || g.max_score < 1.0 {
        issues.push("maxScore", "maxScore must be at least 1");
    }
    if !g.score.is_finite() {
        issues.push("score", "score must be a number");
    } else if g.score < 0.0 {
        issues.push("score", "score must not be negative");
    } else if g.max_score.is_finite() && g.score > g.max_score {
        issues.push(
            "score",
            format!("score {} exceeds maxScore {}", g.score, g.max_score),
        );
    }
    issues.out
}

pub fn validate_subject(s: &Subject) -> Vec<ValidationIssue> {
    let mut issues = Issues::new("subject", &s.id);
    issues.required("id", &s.id);
    issues.required("name", &s.name);
    if !(MIN_COEFFICIENT..=MAX_COEFFICIENT).contains(&s.coefficient) {
        issues.push(
            "coefficient",
            format!("coefficient must be between {MIN_COEFFICIENT} and {MAX_COEFFICIENT}"),
        );
    }
    if s.levels.is_empty() {
        issues.push("levels", "at least one level is required");
    }
    issues.out
}

pub fn validate_student(s: &Student) -> Vec<ValidationIssue> {
    let mut issues = Issues::new("student", &s.id);
    issues.required("id", &s.id);
    issues.required("matricule", &s.matricule);
    issues.required("classId", &s.class_id);
    issues.out
}

pub fn validate_class(c: &ClassInfo) -> Vec<ValidationIssue> {
    let mut issues = Issues::new("class", &c.id);
    issues.required("id", &c.id);
    issues.required("name", &c.name);
    issues.required("level", &c.level);
    issues.out
}

pub fn validate_records(records: &Records) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    out.extend(records.classes.iter().flat_map(validate_class));
    out.extend(records.students.iter().flat_map(validate_student));
    out.extend(records.subjects.iter().flat_map(validate_subject));
    out.extend(records.grades.iter().flat_map(validate_grade));
    out
}
