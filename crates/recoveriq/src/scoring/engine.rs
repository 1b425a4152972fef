use tracing::debug;

use super::aggregate::{category_scores, overall_score, KpiScore, ScoreResult};
use super::domain::Kpi;
use super::input::HospitalInput;
use super::rules::score_kpi;

/// Scores hospitals against a fixed KPI set.
#[derive(Debug, Clone, Default)]
pub struct KpiEngine {
    kpis: Vec<Kpi>,
}

impl KpiEngine {
    pub fn new(kpis: Vec<Kpi>) -> Self {
        Self { kpis }
    }

    pub fn kpis(&self) -> &[Kpi] {
        &self.kpis
    }

    /// Disabled and zero-weight KPIs are skipped entirely: they appear in no
    /// output and add nothing to any denominator.
    pub fn score(&self, input: &HospitalInput) -> ScoreResult {
        let kpi_scores: Vec<KpiScore> = self
            .kpis
            .iter()
            .filter(|kpi| kpi.is_scored())
            .map(|kpi| KpiScore {
                id: kpi.id.clone(),
                name: kpi.name.clone(),
                category: kpi.category,
                score: score_kpi(kpi, input),
                weight: kpi.weight,
            })
            .collect();

        let result = ScoreResult {
            hospital: input.name(),
            overall_score: overall_score(&kpi_scores),
            category_scores: category_scores(&kpi_scores),
            kpi_scores,
        };
        debug!(
            hospital = %result.hospital,
            overall = result.overall_score,
            scored = result.kpi_scores.len(),
            "hospital scored"
        );
        result
    }
}
