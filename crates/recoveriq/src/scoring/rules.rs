use tracing::{debug, warn};

use super::domain::{Kpi, KpiRule};
use super::input::HospitalInput;
use crate::expression::{Expression, ExpressionError};

/// Normalized score in `[0, 1]` for one KPI. Condition failures are logged and
/// score the KPI as 0 without affecting any other KPI.
pub fn score_kpi(kpi: &Kpi, input: &HospitalInput) -> f64 {
    let range = ScoreRange::of(&kpi.scoring_rules);

    match first_match(&kpi.scoring_rules, input) {
        Ok(Some((index, rule))) => {
            let score = range.normalize(rule.score);
            debug!(kpi = %kpi.id, rule = index, raw = rule.score, score, "kpi rule matched");
            score
        }
        Ok(None) => {
            debug!(kpi = %kpi.id, "no kpi rule matched");
            0.0
        }
        Err(error) => {
            warn!(kpi = %kpi.id, name = %kpi.name, rule = error.rule_index, %error, "kpi rule evaluation failed");
            0.0
        }
    }
}

/// Finds the first rule, in array order, whose condition is truthy.
pub(crate) fn first_match<'a>(
    rules: &'a [KpiRule],
    input: &HospitalInput,
) -> Result<Option<(usize, &'a KpiRule)>, RuleError> {
    for (index, rule) in rules.iter().enumerate() {
        let matched = Expression::parse(rule.condition_source())
            .map_err(ExpressionError::from)
            .and_then(|condition| {
                condition
                    .evaluate(input.variables())
                    .map_err(ExpressionError::from)
            })
            .map_err(|source| RuleError {
                rule_index: index,
                condition: rule.condition.clone(),
                source,
            })?
            .is_truthy();

        if matched {
            return Ok(Some((index, rule)));
        }
    }
    Ok(None)
}

/// Span of raw rule scores used for linear normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub(crate) fn of(rules: &[KpiRule]) -> Self {
        if rules.is_empty() {
            return Self { min: 0.0, max: 1.0 };
        }
        let min = rules.iter().map(|rule| rule.score).fold(f64::INFINITY, f64::min);
        let max = rules
            .iter()
            .map(|rule| rule.score)
            .fold(f64::NEG_INFINITY, f64::max);
        Self { min, max }
    }

    /// A degenerate range (every rule shares one score) normalizes to 0, as does
    /// a span too wide to represent.
    pub(crate) fn normalize(&self, raw: f64) -> f64 {
        let span = self.max - self.min;
        if !(span.is_finite() && span > 0.0) {
            return 0.0;
        }
        let score = (raw - self.min) / span;
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("rule {rule_index} ('{condition}'): {source}")]
pub struct RuleError {
    pub rule_index: usize,
    pub condition: String,
    #[source]
    pub source: ExpressionError,
}
