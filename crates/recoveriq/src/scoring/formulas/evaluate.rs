use serde::{Deserialize, Serialize};

use super::config::FormulaConfig;
use super::{FormulaError, FormulaKind};
use crate::expression::{evaluate, Value, Variables};
use crate::scoring::aggregate::round_to;
use crate::scoring::input::HospitalInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    pub fn from_risk_score(score: f64) -> Self {
        if score >= 2.0 {
            Self::Low
        } else if score >= 1.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaOutcome {
    pub weighted_score: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub recommended_purchase_value: f64,
}

impl FormulaConfig {
    /// Runs the weighted, risk and purchase formulas in that order against one
    /// hospital. The first failure aborts the whole evaluation.
    pub fn evaluate(&self, input: &HospitalInput) -> Result<FormulaOutcome, FormulaError> {
        let mut context = self.context(input);

        let weighted = run(
            FormulaKind::Weighted,
            &self.effective_weighted_formula(),
            &context,
        )?;
        context.insert("weighted_score".to_string(), Value::Number(weighted));

        let risk_score = run(FormulaKind::Risk, &self.formulas.risk, &context)?;
        let purchase = run(FormulaKind::Purchase, &self.formulas.purchase, &context)?;

        Ok(FormulaOutcome {
            weighted_score: round_to(weighted, 2),
            risk_score,
            risk_level: RiskLevel::from_risk_score(risk_score),
            recommended_purchase_value: round_to(purchase, 2),
        })
    }

    /// Variable table shared by the three formulas, before `weighted_score`.
    pub fn context(&self, input: &HospitalInput) -> Variables {
        let mut context = input.variables().clone();
        let weights = self.effective_weights();

        for (name, weight) in &weights {
            context.insert(format!("w_{name}"), Value::Number(*weight));
        }
        for (name, value) in &self.parameters {
            context.insert(format!("p_{name}"), Value::Number(*value));
        }
        for (name, value) in &self.custom_params {
            context.insert(name.clone(), Value::Number(*value));
            context.insert(format!("p_{name}"), Value::Number(*value));
        }

        let sum: f64 = weights.values().sum();
        let sum_weights = if sum == 0.0 { 1.0 } else { sum };
        context.insert("sum_weights".to_string(), Value::Number(sum_weights));
        context
    }
}

fn run(kind: FormulaKind, formula: &str, context: &Variables) -> Result<f64, FormulaError> {
    let value = evaluate(formula, context).map_err(|source| FormulaError::Expression {
        formula: kind,
        source,
    })?;
    value.as_number().ok_or_else(|| FormulaError::NotNumeric {
        formula: kind,
        found: value.type_name(),
    })
}
