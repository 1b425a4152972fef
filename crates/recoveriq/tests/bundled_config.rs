use std::path::PathBuf;

use recoveriq::scoring::{
    load_calculator_settings, load_formula_config, load_kpis, FileDocumentStore, FormulaConfig,
    HospitalInput, KpiEngine,
};

fn bundled_store() -> FileDocumentStore {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data");
    FileDocumentStore::new(root)
}

#[test]
fn bundled_kpis_load_and_skip_disabled_entries() {
    let kpis = load_kpis(&bundled_store()).expect("bundled kpis parse");
    assert_eq!(kpis.len(), 5);
    assert!(kpis.iter().all(|kpi| kpi.unit_issue().is_none()));

    let input = HospitalInput::new()
        .with("name", "Mercy General")
        .with("recovery_rate", 11.0)
        .with("statute_months", 30.0)
        .with("self_pay_percent", 20.0)
        .with("data_complete_percent", 97.0);
    let result = KpiEngine::new(kpis).score(&input);

    assert_eq!(result.kpi_scores.len(), 4);
    assert_eq!(result.overall_score, 100.0);
}

#[test]
fn bundled_formula_documents_match_defaults() {
    let store = bundled_store();
    let config = load_formula_config(&store);
    let defaults = FormulaConfig::default();

    assert_eq!(config.weights, defaults.weights);
    assert_eq!(config.parameters, defaults.parameters);
    assert_eq!(config.formulas, defaults.formulas);
    assert_eq!(load_calculator_settings(&store).risk_tiers.len(), 5);
}
