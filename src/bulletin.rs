use crate::calc::{
    self, bucket_averages, period_aggregate, rank_cohort, AveragePolicy, CalcError,
    GeneralAppreciation, PeriodAggregate, PeriodStatistics, RankedResult,
    SubjectAverage, SubjectBand,
};
use crate::config::CalcConfig;
use crate::model::{ClassInfo, GradeEntry, LevelType, Period, Student, StudentStatus, Subject};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub id: String,
    pub name: String,
    pub level: String,
    pub level_type: LevelType,
    pub academic_year: String,
    pub cohort_size: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: String,
    pub matricule: String,
    pub last_name: String,
    pub first_name: String,
    pub display_name: String,
    pub status: StudentStatus,
}

impl From<&Student> for StudentSummary {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id.clone(),
            matricule: s.matricule.clone(),
            last_name: s.last_name.clone(),
            first_name: s.first_name.clone(),
            display_name: s.display_name(),
            status: s.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    pub subject_id: String,
    pub name: String,
    pub coefficient: f64,
    pub homework_average: Option<f64>,
    pub exam_average: Option<f64>,
    pub oral_average: Option<f64>,
    pub average: Option<f64>,
    pub weighted_points: Option<f64>,
    pub band: Option<SubjectBand>,
    pub band_label: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appreciation {
    pub code: GeneralAppreciation,
    pub label: &'static str,
}

/// Everything a renderer needs to draw one report card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletinModel {
    pub student: StudentSummary,
    pub class: ClassSummary,
    pub period: Period,
    pub policy: AveragePolicy,
    pub rows: Vec<SubjectRow>,
    pub aggregate: PeriodAggregate,
    pub ranking: RankedResult,
    pub statistics: PeriodStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appreciation: Option<Appreciation>,
}

/// One class, one period, one snapshot of grade entries. Aggregates for the
/// whole cohort are computed on construction and never outlive the run.
pub struct ClassRun<'a> {
    class: &'a ClassInfo,
    cohort: Vec<&'a Student>,
    subjects: Vec<Subject>,
    grades: &'a [GradeEntry],
    period: Period,
    policy: AveragePolicy,
    aggregates: Vec<PeriodAggregate>,
    ranking: Vec<RankedResult>,
    statistics: PeriodStatistics,
}

impl<'a> ClassRun<'a> {
    pub fn new(
        class: &'a ClassInfo,
        cohort: Vec<&'a Student>,
        subjects: Vec<Subject>,
        grades: &'a [GradeEntry],
        period: Period,
        config: &CalcConfig,
    ) -> Result<Self, CalcError> {
        let policy = config.policies.for_level(class.level_type);
        let aggregates = cohort
            .iter()
            .map(|s| {
                calc::student_period_aggregate(grades, &s.id, &subjects, period, policy)
                    .map(|(agg, _)| agg)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ranking = rank_cohort(&aggregates, config.ranking);
        let statistics = calc::period_statistics(&aggregates);

        Ok(Self {
            class,
            cohort,
            subjects,
            grades,
            period,
            policy,
            aggregates,
            ranking,
            statistics,
        })
    }

    pub fn policy(&self) -> AveragePolicy {
        self.policy
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn aggregates(&self) -> &[PeriodAggregate] {
        &self.aggregates
    }

    pub fn ranking(&self) -> &[RankedResult] {
        &self.ranking
    }

    pub fn statistics(&self) -> PeriodStatistics {
        self.statistics
    }

    pub fn class_summary(&self) -> ClassSummary {
        ClassSummary {
            id: self.class.id.clone(),
            name: self.class.name.clone(),
            level: self.class.level.clone(),
            level_type: self.class.level_type,
            academic_year: self.class.academic_year.clone(),
            cohort_size: self.cohort.len(),
        }
    }

    fn subject_rows(&self, student_id: &str) -> Vec<SubjectRow> {
        self.subjects
            .iter()
            .map(|s| {
                let buckets = bucket_averages(self.grades, student_id, &s.id, self.period);
                let average = buckets.average(self.policy);
                let band = SubjectBand::for_average(average);
                SubjectRow {
                    subject_id: s.id.clone(),
                    name: s.name.clone(),
                    coefficient: s.coefficient,
                    homework_average: buckets.homework,
                    exam_average: buckets.exam,
                    oral_average: buckets.oral,
                    average,
                    weighted_points: average.map(|a| a * s.coefficient),
                    band,
                    band_label: band.map(SubjectBand::label),
                }
            })
            .collect()
    }

    pub fn bulletin(&self, student: &Student) -> Result<BulletinModel, CalcError> {
        let rows = self.subject_rows(&student.id);
        let averages: Vec<SubjectAverage> = rows
            .iter()
            .map(|r| SubjectAverage {
                subject_id: r.subject_id.clone(),
                average: r.average,
                coefficient: r.coefficient,
            })
            .collect();
        let aggregate = period_aggregate(&student.id, &averages)?;

        let ranking = self
            .ranking
            .iter()
            .find(|r| r.student_id == student.id)
            .cloned()
            .unwrap_or_else(|| RankedResult {
                student_id: student.id.clone(),
                average: aggregate.period_average,
                rank: None,
                rank_label: None,
            });

        let appreciation = match self.class.level_type {
            LevelType::Secondary => None,
            LevelType::Nursery | LevelType::Primary => GeneralAppreciation::for_aggregate(&aggregate)
                .map(|code| Appreciation {
                    code,
                    label: code.label(),
                }),
        };

        Ok(BulletinModel {
            student: StudentSummary::from(student),
            class: self.class_summary(),
            period: self.period,
            policy: self.policy,
            rows,
            aggregate,
            ranking,
            statistics: self.statistics(),
            appreciation,
        })
    }

    pub fn bulletins(&self) -> Result<Vec<BulletinModel>, CalcError> {
        self.cohort.iter().map(|s| self.bulletin(s)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassResultsStudent {
    pub student: StudentSummary,
    pub subjects: Vec<SubjectAverage>,
    pub aggregate: PeriodAggregate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassResultsModel {
    pub class: ClassSummary,
    pub period: Period,
    pub subjects: Vec<Subject>,
    pub students: Vec<ClassResultsStudent>,
}

/// Per-student flat subject means for a whole class, as listed in the class
/// results report. Independent of the bulletin policy of the class level.
pub fn class_results_model(
    class: &ClassInfo,
    cohort: &[&Student],
    subjects: Vec<Subject>,
    grades: &[GradeEntry],
    period: Period,
) -> Result<ClassResultsModel, CalcError> {
    let mut students = Vec::with_capacity(cohort.len());
    for s in cohort {
        let (aggregate, averages) = calc::student_period_aggregate(
            grades,
            &s.id,
            &subjects,
            period,
            AveragePolicy::FlatMean,
        )?;
        students.push(ClassResultsStudent {
            student: StudentSummary::from(*s),
            subjects: averages,
            aggregate,
        });
    }

    Ok(ClassResultsModel {
        class: ClassSummary {
            id: class.id.clone(),
            name: class.name.clone(),
            level: class.level.clone(),
            level_type: class.level_type,
            academic_year: class.academic_year.clone(),
            cohort_size: cohort.len(),
        },
        period,
        subjects,
        students,
    })
}
