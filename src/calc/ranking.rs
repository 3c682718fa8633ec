use super::aggregate::PeriodAggregate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RankingPolicy {
    /// Every position gets its own rank, equal averages included (1, 2, 3).
    #[default]
    Sequential,
    /// Equal averages share the best rank and the next one skips (1, 1, 3).
    Competition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub student_id: String,
    pub average: f64,
    /// `None` for a student with no graded subject in the period.
    pub rank: Option<usize>,
    pub rank_label: Option<String>,
}

pub fn rank_suffix(rank: usize) -> &'static str {
    if rank == 1 {
        "er"
    } else {
        "e"
    }
}

pub fn rank_label(rank: usize) -> String {
    format!("{}{}", rank, rank_suffix(rank))
}

/// Orders a cohort by period average, best first. Ties keep the order in which
/// the cohort was given. Ungraded students follow, unranked.
pub fn rank_cohort(aggregates: &[PeriodAggregate], policy: RankingPolicy) -> Vec<RankedResult> {
    let mut graded: Vec<&PeriodAggregate> = aggregates.iter().filter(|a| a.is_graded()).collect();
    graded.sort_by(|a, b| {
        b.period_average
            .partial_cmp(&a.period_average)
            .unwrap_or(Ordering::Equal)
    });

    let mut out: Vec<RankedResult> = Vec::with_capacity(aggregates.len());
    let mut prev: Option<(f64, usize)> = None;
    for (i, a) in graded.iter().enumerate() {
        let position = i + 1;
        let rank = match (policy, prev) {
            (RankingPolicy::Competition, Some((avg, r))) if avg == a.period_average => r,
            _ => position,
        };
        prev = Some((a.period_average, rank));
        out.push(RankedResult {
            student_id: a.student_id.clone(),
            average: a.period_average,
            rank: Some(rank),
            rank_label: Some(rank_label(rank)),
        });
    }

    for a in aggregates.iter().filter(|a| !a.is_graded()) {
        out.push(RankedResult {
            student_id: a.student_id.clone(),
            average: a.period_average,
            rank: None,
            rank_label: None,
        });
    }
    out
}
