use crate::calc::CalcError;
use crate::model::{ClassInfo, GradeEntry, Records, Student, Subject};
use crate::validate::{validate_grade, validate_records, ValidationIssue};
use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use std::borrow::Cow;
use std::path::Path;

pub const SNAPSHOT_FILE: &str = "school.json";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub classes: usize,
    pub students: usize,
    pub subjects: usize,
    pub grades: usize,
    pub rejected: Vec<ValidationIssue>,
}

/// Read-only view over validated records. Nothing in here is ever written back.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Records,
}

impl Snapshot {
    /// Validates `records`. With `skip_invalid`, grade entries failing
    /// validation are dropped and reported; any other issue fails the load.
    pub fn from_records(
        mut records: Records,
        skip_invalid: bool,
    ) -> Result<(Snapshot, LoadSummary), CalcError> {
        let issues = validate_records(&records);
        let mut rejected: Vec<ValidationIssue> = Vec::new();

        if !issues.is_empty() {
            let only_grades = issues.iter().all(|i| i.entity == "grade");
            if !(skip_invalid && only_grades) {
                return Err(CalcError::new(
                    "validation_failed",
                    format!("{} record(s) failed validation", issues.len()),
                )
                .with_details(json!({ "issues": issues })));
            }
            records.grades.retain(|g| {
                let found = validate_grade(g);
                if found.is_empty() {
                    return true;
                }
                tracing::warn!(grade = %g.id, student = %g.student_id, "rejected grade entry");
                rejected.extend(found);
                false
            });
        }

        let summary = LoadSummary {
            classes: records.classes.len(),
            students: records.students.len(),
            subjects: records.subjects.len(),
            grades: records.grades.len(),
            rejected,
        };
        Ok((Snapshot { records }, summary))
    }

    pub fn read_workspace_records(workspace: &Path) -> anyhow::Result<Option<Records>> {
        let path = workspace.join(SNAPSHOT_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        let records: Records = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid records file", path.to_string_lossy()))?;
        Ok(Some(records))
    }

    pub fn class(&self, class_id: &str) -> Option<&ClassInfo> {
        self.records.classes.iter().find(|c| c.id == class_id)
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.records.students.iter().find(|s| s.id == student_id)
    }

    /// Students of a class in roster order.
    pub fn cohort(&self, class_id: &str) -> Vec<&Student> {
        self.records
            .students
            .iter()
            .filter(|s| s.class_id == class_id)
            .collect()
    }

    /// Subjects taught at the class's level, in record order.
    pub fn applicable_subjects(&self, class: &ClassInfo) -> Vec<Subject> {
        self.records
            .subjects
            .iter()
            .filter(|s| s.applies_to(&class.level))
            .cloned()
            .collect()
    }

    pub fn subject(&self, subject_id: &str) -> Option<&Subject> {
        self.records.subjects.iter().find(|s| s.id == subject_id)
    }

    /// Grades of the requested year, defaulting to the class's own year. Only a
    /// class without a year sees every entry.
    pub fn class_grades(
        &self,
        class: &ClassInfo,
        academic_year: Option<&str>,
    ) -> Cow<'_, [GradeEntry]> {
        let year = academic_year.or_else(|| {
            Some(class.academic_year.as_str()).filter(|y| !y.trim().is_empty())
        });
        self.grades(year)
    }

    pub fn grades(&self, academic_year: Option<&str>) -> Cow<'_, [GradeEntry]> {
        match academic_year {
            None => Cow::Borrowed(&self.records.grades),
            Some(year) => Cow::Owned(
                self.records
                    .grades
                    .iter()
                    .filter(|g| g.academic_year == year)
                    .cloned()
                    .collect(),
            ),
        }
    }
}
