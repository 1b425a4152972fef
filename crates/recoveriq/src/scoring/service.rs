use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::aggregate::ScoreResult;
use super::calculator::CalculationResult;
use super::engine::KpiEngine;
use super::formulas::{FormulaError, FormulaOutcome, FormulaOverrides};
use super::input::{HospitalInput, InputError};
use super::repository::{
    load_calculator_settings, load_formula_config, load_kpis, DocumentStore, KpiConfigError,
};

/// Body of a "test your formulas" call: hospital values plus optional
/// replacements for the stored formula configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormulaRequest {
    #[serde(default = "empty_object")]
    pub input: serde_json::Value,
    #[serde(flatten)]
    pub overrides: FormulaOverrides,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Service reading the scoring configuration from a document store on every call,
/// so edits made through the store apply without a restart.
pub struct ScoringService<S> {
    store: Arc<S>,
}

impl<S> ScoringService<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Scores one hospital against the enabled KPIs.
    pub fn score(&self, payload: serde_json::Value) -> Result<ScoreResult, ScoringServiceError> {
        let input = HospitalInput::from_json(payload)?;
        let engine = KpiEngine::new(load_kpis(self.store.as_ref())?);
        let result = engine.score(&input);
        info!(hospital = %result.hospital, overall = result.overall_score, "score computed");
        Ok(result)
    }

    /// Scores one hospital and adds the tier, collectability and purchase metrics.
    pub fn calculate(
        &self,
        payload: serde_json::Value,
    ) -> Result<CalculationResult, ScoringServiceError> {
        let score = self.score(payload)?;
        let derived = load_calculator_settings(self.store.as_ref()).assess(&score);
        Ok(CalculationResult { score, derived })
    }

    pub fn evaluate_formulas(
        &self,
        request: FormulaRequest,
    ) -> Result<FormulaOutcome, ScoringServiceError> {
        let input = HospitalInput::from_json(request.input)?;
        let config = load_formula_config(self.store.as_ref()).apply(request.overrides);
        let outcome = config.evaluate(&input)?;
        info!(
            weighted = outcome.weighted_score,
            risk = outcome.risk_level.label(),
            "formulas evaluated"
        );
        Ok(outcome)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    KpiConfig(#[from] KpiConfigError),
    #[error(transparent)]
    Formula(#[from] FormulaError),
}
