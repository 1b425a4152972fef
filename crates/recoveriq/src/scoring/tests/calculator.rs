use std::collections::BTreeMap;

use serde_json::json;

use crate::scoring::aggregate::{KpiScore, ScoreResult};
use crate::scoring::calculator::{CalculatorSettings, ConfidenceLevel, RiskTier};
use crate::scoring::domain::KpiCategory;

fn result_with(overall_score: f64, quality: &[f64]) -> ScoreResult {
    let kpi_scores = quality
        .iter()
        .enumerate()
        .map(|(index, score)| KpiScore {
            id: format!("dq-{index}"),
            name: "Data Quality".to_string(),
            category: KpiCategory::DataQuality,
            score: *score,
            weight: 1.0,
        })
        .collect();
    ScoreResult {
        hospital: "Mercy General".to_string(),
        overall_score,
        category_scores: BTreeMap::new(),
        kpi_scores,
    }
}

#[test]
fn default_tiers_pick_highest_band_reached() {
    let settings = CalculatorSettings::default();

    assert_eq!(settings.assess(&result_with(85.0, &[])).risk_tier, "Excellent");
    assert_eq!(settings.assess(&result_with(60.0, &[])).risk_tier, "Good");
    assert_eq!(settings.assess(&result_with(39.99, &[])).risk_tier, "Poor");
    assert_eq!(settings.assess(&result_with(0.0, &[])).risk_tier, "Critical");
}

#[test]
fn purchase_value_interpolates_across_range() {
    let derived = CalculatorSettings::default().assess(&result_with(72.46, &[]));

    assert_eq!(derived.collectability_index, 72.0);
    // 0.10 + 0.7246 * 0.15
    assert_eq!(derived.recommended_purchase_value, 0.209);
}

#[test]
fn confidence_follows_data_quality_mean() {
    let settings = CalculatorSettings::default();

    assert_eq!(
        settings.assess(&result_with(50.0, &[1.0, 0.9])).confidence_level,
        ConfidenceLevel::High
    );
    assert_eq!(
        settings.assess(&result_with(50.0, &[1.0, 0.2])).confidence_level,
        ConfidenceLevel::Medium
    );
    assert_eq!(
        settings.assess(&result_with(50.0, &[])).confidence_level,
        ConfidenceLevel::Low
    );
}

#[test]
fn unordered_custom_tiers_still_resolve() {
    let settings = CalculatorSettings {
        risk_tiers: vec![
            RiskTier {
                name: "Watch".to_string(),
                min: 30.0,
                color: None,
            },
            RiskTier {
                name: "Prime".to_string(),
                min: 70.0,
                color: None,
            },
        ],
        ..CalculatorSettings::default()
    };

    assert_eq!(settings.assess(&result_with(75.0, &[])).risk_tier, "Prime");
    assert_eq!(settings.assess(&result_with(45.0, &[])).risk_tier, "Watch");
    assert_eq!(settings.assess(&result_with(10.0, &[])).risk_tier, "Unknown");
}

#[test]
fn stored_settings_ignore_unrelated_fields() {
    let settings: CalculatorSettings = serde_json::from_value(json!({
        "risk_tiers": [{ "name": "Only", "min": 0, "color": "gray" }],
        "collectability_formula": "overall_score",
        "last_updated": "2025-01-01"
    }))
    .expect("settings parse");

    assert_eq!(settings.risk_tiers.len(), 1);
    assert_eq!(settings.purchase_value_min, 0.10);
    assert_eq!(settings.purchase_value_max, 0.25);
}
