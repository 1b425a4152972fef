use serde::{Deserialize, Serialize};

use super::aggregate::{round_to, ScoreResult};
use super::domain::KpiCategory;

/// Named band of the 0–100 overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    pub name: String,
    pub min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl RiskTier {
    fn new(name: &str, min: f64, color: &str) -> Self {
        Self {
            name: name.to_string(),
            min,
            color: Some(color.to_string()),
        }
    }
}

/// Settings for the metrics derived from an overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorSettings {
    pub risk_tiers: Vec<RiskTier>,
    pub purchase_value_min: f64,
    pub purchase_value_max: f64,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            risk_tiers: vec![
                RiskTier::new("Excellent", 80.0, "green"),
                RiskTier::new("Good", 60.0, "blue"),
                RiskTier::new("Fair", 40.0, "yellow"),
                RiskTier::new("Poor", 20.0, "orange"),
                RiskTier::new("Critical", 0.0, "red"),
            ],
            purchase_value_min: 0.10,
            purchase_value_max: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Mean Data Quality KPI score above 0.8 is High, above 0.5 Medium.
    pub fn from_data_quality(mean: f64) -> Self {
        if mean > 0.8 {
            ConfidenceLevel::High
        } else if mean > 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Metrics computed from a [`ScoreResult`]; never stored alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub risk_tier: String,
    pub collectability_index: f64,
    pub recommended_purchase_value: f64,
    pub confidence_level: ConfidenceLevel,
}

/// A scoring result with its derived metrics, as returned by `/calculate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    #[serde(flatten)]
    pub score: ScoreResult,
    #[serde(flatten)]
    pub derived: DerivedMetrics,
}

impl CalculatorSettings {
    pub fn assess(&self, result: &ScoreResult) -> DerivedMetrics {
        let score = result.overall_score;

        let mut tiers: Vec<&RiskTier> = self.risk_tiers.iter().collect();
        tiers.sort_by(|a, b| b.min.total_cmp(&a.min));
        let risk_tier = tiers
            .into_iter()
            .find(|tier| score >= tier.min)
            .map(|tier| tier.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let range = self.purchase_value_max - self.purchase_value_min;
        let recommended_purchase_value =
            round_to(self.purchase_value_min + (score / 100.0) * range, 3);

        let quality: Vec<f64> = result
            .kpi_scores
            .iter()
            .filter(|entry| entry.category == KpiCategory::DataQuality)
            .map(|entry| entry.score)
            .collect();
        let mean_quality = if quality.is_empty() {
            0.5
        } else {
            quality.iter().sum::<f64>() / quality.len() as f64
        };

        DerivedMetrics {
            risk_tier,
            collectability_index: score.round(),
            recommended_purchase_value,
            confidence_level: ConfidenceLevel::from_data_quality(mean_quality),
        }
    }
}
