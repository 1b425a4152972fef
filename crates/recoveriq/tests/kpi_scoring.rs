use recoveriq::expression::Value;
use recoveriq::scoring::{score_kpi, HospitalInput, Kpi, KpiCategory, KpiEngine, KpiRule};

fn recovery_kpi() -> Kpi {
    Kpi::new(
        "recovery_rate",
        "Recovery Rate",
        KpiCategory::FinancialPerformance,
        1.0,
        vec![
            KpiRule::new("recovery_rate>=10", 5.0),
            KpiRule::new("recovery_rate>=5", 3.0),
            KpiRule::new("true", 1.0),
        ],
    )
}

fn hospital(recovery_rate: f64) -> HospitalInput {
    HospitalInput::new().with("recovery_rate", recovery_rate)
}

#[test]
fn top_tier_scores_full_marks() {
    let result = KpiEngine::new(vec![recovery_kpi()]).score(&hospital(12.0));

    assert_eq!(result.overall_score, 100.0);
    assert_eq!(
        result.category_scores.get(&KpiCategory::FinancialPerformance),
        Some(&100.0)
    );
    assert_eq!(result.kpi_scores[0].score, 1.0);
}

#[test]
fn middle_tier_scores_half() {
    let result = KpiEngine::new(vec![recovery_kpi()]).score(&hospital(7.0));
    assert_eq!(result.overall_score, 50.0);
}

#[test]
fn fallback_tier_scores_zero() {
    let result = KpiEngine::new(vec![recovery_kpi()]).score(&hospital(1.0));
    assert_eq!(result.overall_score, 0.0);
    assert_eq!(
        result.category_scores.get(&KpiCategory::FinancialPerformance),
        Some(&0.0)
    );
}

#[test]
fn weights_split_across_categories() {
    let compliance = Kpi::new(
        "statute",
        "Statute Remaining",
        KpiCategory::LegalAndCompliance,
        3.0,
        vec![
            KpiRule::new("statute_months >= 24", 2.0),
            KpiRule::new("true", 0.0),
        ],
    );
    let input = hospital(12.0).with("statute_months", 6.0);

    let result = KpiEngine::new(vec![recovery_kpi(), compliance]).score(&input);

    assert_eq!(result.overall_score, 25.0);
    assert_eq!(
        result.category_scores.get(&KpiCategory::FinancialPerformance),
        Some(&100.0)
    );
    assert_eq!(
        result.category_scores.get(&KpiCategory::LegalAndCompliance),
        Some(&0.0)
    );
}

#[test]
fn disabled_kpi_with_extreme_weight_changes_nothing() {
    let mut disabled = recovery_kpi();
    disabled.id = "shadow".to_string();
    disabled.category = KpiCategory::EthicalEsg;
    disabled.weight = 1e9;
    disabled.enabled = false;

    let baseline = KpiEngine::new(vec![recovery_kpi()]).score(&hospital(7.0));
    let result = KpiEngine::new(vec![recovery_kpi(), disabled]).score(&hospital(7.0));

    assert_eq!(result, baseline);
}

#[test]
fn all_zero_weights_score_zero() {
    let mut kpi = recovery_kpi();
    kpi.weight = 0.0;

    let result = KpiEngine::new(vec![kpi]).score(&hospital(12.0));

    assert_eq!(result.overall_score, 0.0);
    assert!(result.category_scores.is_empty());
    assert!(result.kpi_scores.is_empty());
}

#[test]
fn kpi_scores_stay_in_unit_interval_for_any_input() {
    let inputs = [
        hospital(f64::MAX),
        hospital(-3.0),
        hospital(0.0),
        HospitalInput::new(),
        HospitalInput::new().with("recovery_rate", Value::Str("n/a".to_string())),
        HospitalInput::new().with("recovery_rate", true),
    ];

    for input in &inputs {
        let score = score_kpi(&recovery_kpi(), input);
        assert!((0.0..=1.0).contains(&score), "score {score} out of range");
    }
}

#[test]
fn both_true_conditions_use_the_first() {
    let kpi = Kpi::new(
        "overlap",
        "Overlap",
        KpiCategory::OperationalEfficiency,
        1.0,
        vec![
            KpiRule::new("denial_rate < 20", 1.0),
            KpiRule::new("denial_rate < 10", 4.0),
            KpiRule::new("true", 0.0),
        ],
    );
    let input = HospitalInput::new().with("denial_rate", 5.0);

    assert_eq!(score_kpi(&kpi, &input), 0.25);
}
