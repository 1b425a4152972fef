use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::KpiCategory;

/// Per-KPI entry of a scoring result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiScore {
    pub id: String,
    pub name: String,
    pub category: KpiCategory,
    /// Normalized score in `[0, 1]`.
    pub score: f64,
    pub weight: f64,
}

/// Output of one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub hospital: String,
    pub overall_score: f64,
    pub category_scores: BTreeMap<KpiCategory, f64>,
    pub kpi_scores: Vec<KpiScore>,
}

/// Weighted average per category, scaled to 0–100. Only categories with at least
/// one entry appear; a category whose weights sum to 0 scores 0.
pub fn category_scores(scores: &[KpiScore]) -> BTreeMap<KpiCategory, f64> {
    let mut totals: BTreeMap<KpiCategory, (f64, f64)> = BTreeMap::new();
    for entry in scores {
        let (weighted, weight) = totals.entry(entry.category).or_insert((0.0, 0.0));
        *weighted += entry.score * entry.weight;
        *weight += entry.weight;
    }

    totals
        .into_iter()
        .map(|(category, (weighted, weight))| {
            let score = if weight > 0.0 && weight.is_finite() {
                finite_or_zero(weighted / weight * 100.0)
            } else {
                0.0
            };
            (category, score)
        })
        .collect()
}

/// Weighted average over every entry, scaled to 0–100 and rounded to 2 decimals.
/// A zero total weight divides by 1, so the result is 0 rather than NaN. A total
/// weight that overflows is treated the same way.
pub fn overall_score(scores: &[KpiScore]) -> f64 {
    let total_weight: f64 = scores.iter().map(|entry| entry.weight).sum();
    if !total_weight.is_finite() {
        return 0.0;
    }
    let denominator = if total_weight == 0.0 { 1.0 } else { total_weight };
    let weighted: f64 = scores.iter().map(|entry| entry.score * entry.weight).sum();
    finite_or_zero(round_to(weighted / denominator * 100.0, 2))
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
