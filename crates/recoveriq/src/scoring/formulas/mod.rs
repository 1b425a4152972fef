//! Operator-authored formulas for the weighted composite score, the risk tier
//! and the recommended purchase value.
//!
//! This path is independent of the KPI engine and is not expected to agree with
//! it numerically. Unlike KPI scoring, every failure is reported to the caller.

mod config;
mod evaluate;

use std::fmt;

pub use config::{
    FormulaConfig, FormulaOverrides, FormulaSet, FormulaSetOverride, ParameterCalculator,
    DEFAULT_PARAMETERS, DEFAULT_PURCHASE_FORMULA, DEFAULT_RISK_FORMULA,
    DEFAULT_WEIGHTED_FORMULA, DEFAULT_WEIGHTS,
};
pub use evaluate::{FormulaOutcome, RiskLevel};

use crate::expression::ExpressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaKind {
    Weighted,
    Risk,
    Purchase,
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Weighted => "weighted score",
            Self::Risk => "risk",
            Self::Purchase => "purchase",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("{formula} formula: {source}")]
    Expression {
        formula: FormulaKind,
        #[source]
        source: ExpressionError,
    },
    #[error("{formula} formula produced a {found}, expected a number")]
    NotNumeric {
        formula: FormulaKind,
        found: &'static str,
    },
}
