use super::aggregate::PeriodAggregate;
use serde::Serialize;

/// Qualitative band of a subject average. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubjectBand {
    Excellent,
    VeryGood,
    Good,
    Passing,
    Insufficient,
}

impl SubjectBand {
    /// `None` for an ungraded subject and for an average of exactly zero.
    pub fn for_average(average: Option<f64>) -> Option<SubjectBand> {
        let avg = average?;
        if avg >= 16.0 {
            Some(SubjectBand::Excellent)
        } else if avg >= 14.0 {
            Some(SubjectBand::VeryGood)
        } else if avg >= 12.0 {
            Some(SubjectBand::Good)
        } else if avg >= 10.0 {
            Some(SubjectBand::Passing)
        } else if avg > 0.0 {
            Some(SubjectBand::Insufficient)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubjectBand::Excellent => "Excellent",
            SubjectBand::VeryGood => "Très Bien",
            SubjectBand::Good => "Bien",
            SubjectBand::Passing => "Passable",
            SubjectBand::Insufficient => "Insuffisant",
        }
    }
}

/// Overall remark printed on nursery and primary bulletins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneralAppreciation {
    ExcellentWork,
    VeryGood,
    Good,
    FairlyGood,
    Passing,
    Insufficient,
}

impl GeneralAppreciation {
    pub fn for_aggregate(aggregate: &PeriodAggregate) -> Option<GeneralAppreciation> {
        if !aggregate.is_graded() {
            return None;
        }
        let avg = aggregate.period_average;
        Some(if avg >= 16.0 {
            GeneralAppreciation::ExcellentWork
        } else if avg >= 14.0 {
            GeneralAppreciation::VeryGood
        } else if avg >= 12.0 {
            GeneralAppreciation::Good
        } else if avg >= 10.0 {
            GeneralAppreciation::FairlyGood
        } else if avg >= 8.0 {
            GeneralAppreciation::Passing
        } else {
            GeneralAppreciation::Insufficient
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            GeneralAppreciation::ExcellentWork => "Excellent travail",
            GeneralAppreciation::VeryGood => "Très bien",
            GeneralAppreciation::Good => "Bien",
            GeneralAppreciation::FairlyGood => "Assez bien",
            GeneralAppreciation::Passing => "Passable",
            GeneralAppreciation::Insufficient => "Insuffisant",
        }
    }
}
