use serde::{Deserialize, Serialize};

/// Canonical marking scale. Every score is brought onto it before averaging.
pub const SCALE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationKind {
    #[serde(alias = "devoir")]
    Homework,
    #[serde(alias = "composition")]
    Exam,
    Oral,
}

/// One of the three grading periods of a school year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Period(u8);

impl Period {
    pub fn new(n: u8) -> Option<Self> {
        (1..=3).contains(&n).then_some(Period(n))
    }
}

impl TryFrom<u8> for Period {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Period::new(n).ok_or_else(|| format!("period must be 1, 2 or 3 (got {n})"))
    }
}

impl From<Period> for u8 {
    fn from(p: Period) -> u8 {
        p.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    #[serde(alias = "MATERNELLE")]
    Nursery,
    #[serde(alias = "PRIMAIRE")]
    Primary,
    #[serde(alias = "SECONDAIRE")]
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    #[serde(alias = "actif")]
    Active,
    #[serde(alias = "inactif")]
    Inactive,
    #[serde(alias = "transfere")]
    Transferred,
    #[serde(alias = "abandonne")]
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    #[serde(default)]
    pub id: String,
    pub student_id: String,
    pub subject_id: String,
    #[serde(default)]
    pub class_id: Option<String>,
    pub kind: EvaluationKind,
    pub score: f64,
    pub max_score: f64,
    pub period: Period,
    #[serde(default)]
    pub academic_year: String,
}

impl GradeEntry {
    /// Score on the 20-point scale, or `None` for an entry that cannot be
    /// normalized (non-positive or non-finite maximum).
    pub fn normalized(&self) -> Option<f64> {
        if !(self.max_score.is_finite() && self.max_score > 0.0) || !self.score.is_finite() {
            return None;
        }
        Some((self.score / self.max_score) * SCALE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub coefficient: f64,
    #[serde(default)]
    pub levels: Vec<String>,
}

impl Subject {
    pub fn applies_to(&self, level: &str) -> bool {
        self.levels.iter().any(|l| l == level)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    #[serde(default)]
    pub matricule: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    pub class_id: String,
    #[serde(default)]
    pub status: StudentStatus,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub id: String,
    pub name: String,
    pub level: String,
    pub level_type: LevelType,
    #[serde(default)]
    pub academic_year: String,
}

/// Everything the record store hands over for one school.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Records {
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub grades: Vec<GradeEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalized_uses_twenty_point_scale() {
        let g: GradeEntry = serde_json::from_value(json!({
            "studentId": "s1",
            "subjectId": "m1",
            "kind": "homework",
            "score": 10,
            "maxScore": 20,
            "period": 1
        }))
        .expect("grade");
        assert_eq!(g.normalized(), Some(10.0));

        let on_ten = GradeEntry {
            score: 7.0,
            max_score: 10.0,
            ..g.clone()
        };
        assert_eq!(on_ten.normalized(), Some(14.0));

        let broken = GradeEntry {
            max_score: 0.0,
            ..g
        };
        assert_eq!(broken.normalized(), None);
    }

    #[test]
    fn source_vocabulary_is_accepted() {
        let g: GradeEntry = serde_json::from_value(json!({
            "studentId": "s1",
            "subjectId": "m1",
            "kind": "composition",
            "score": 12,
            "maxScore": 20,
            "period": 2
        }))
        .expect("grade");
        assert_eq!(g.kind, EvaluationKind::Exam);

        let c: ClassInfo = serde_json::from_value(json!({
            "id": "c1",
            "name": "6e A",
            "level": "6e",
            "levelType": "SECONDAIRE"
        }))
        .expect("class");
        assert_eq!(c.level_type, LevelType::Secondary);
    }

    #[test]
    fn period_rejects_out_of_range() {
        assert!(serde_json::from_value::<Period>(json!(4)).is_err());
        assert!(serde_json::from_value::<Period>(json!(0)).is_err());
        assert_eq!(
            u8::from(serde_json::from_value::<Period>(json!(3)).expect("period")),
            3
        );
    }
}
