use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Built-in tuning parameters and their defaults, exposed to formulas as `p_<name>`.
pub const DEFAULT_PARAMETERS: [(&str, f64); 11] = [
    ("recovery_rate_max_percent", 10.0),
    ("statute_months_max", 24.0),
    ("self_pay_percent_max", 100.0),
    ("zip_income_cap", 100_000.0),
    ("debt_age_max_days", 365.0),
    ("number_of_beds_cap", 1000.0),
    ("output_scale_max", 5.0),
    ("risk_low_min", 4.0),
    ("risk_medium_min", 3.0),
    ("purchase_min", 0.10),
    ("purchase_max", 0.25),
];

pub const DEFAULT_WEIGHTS: [(&str, f64); 6] = [
    ("recovery_rate", 0.2),
    ("statute_months", 0.15),
    ("self_pay_percent", 0.1),
    ("zip_income", 0.1),
    ("debt_age", 0.2),
    ("number_of_beds", 0.05),
];

pub const DEFAULT_WEIGHTED_FORMULA: &str = concat!(
    "((min(recovery_rate/p_recovery_rate_max_percent,1)*w_recovery_rate)+",
    "(min(statute_months/p_statute_months_max,1)*w_statute_months)+",
    "((1-min(self_pay_percent/p_self_pay_percent_max,1))*w_self_pay_percent)+",
    "(min(zip_income/p_zip_income_cap,1)*w_zip_income)+",
    "((1-min(debt_age/p_debt_age_max_days,1))*w_debt_age)+",
    "(min(number_of_beds/p_number_of_beds_cap,1)*w_number_of_beds))",
    "/(w_recovery_rate+w_statute_months+w_self_pay_percent+w_zip_income+w_debt_age+w_number_of_beds)",
    "*p_output_scale_max"
);

pub const DEFAULT_RISK_FORMULA: &str =
    "if(weighted_score>=p_risk_low_min,2, if(weighted_score>=p_risk_medium_min,1,0))";

pub const DEFAULT_PURCHASE_FORMULA: &str =
    "p_purchase_min + (weighted_score/p_output_scale_max)*(p_purchase_max - p_purchase_min)";

const RESERVED_KEYS: [&str; 9] = [
    "version",
    "weights",
    "weights_descriptions",
    "custom_params",
    "params_list",
    "factors",
    "formula_weighted_score",
    "formula_purchase",
    "formula_risk_score",
];

/// The three operator-authored formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaSet {
    pub weighted: String,
    pub risk: String,
    pub purchase: String,
}

impl Default for FormulaSet {
    fn default() -> Self {
        Self {
            weighted: DEFAULT_WEIGHTED_FORMULA.to_string(),
            risk: DEFAULT_RISK_FORMULA.to_string(),
            purchase: DEFAULT_PURCHASE_FORMULA.to_string(),
        }
    }
}

/// Weighted parameter whose expression yields a 0..1 contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterCalculator {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub weight: f64,
}

impl ParameterCalculator {
    /// Included in the generated weighted formula.
    pub fn is_active(&self) -> bool {
        self.enabled
            && !self.name.trim().is_empty()
            && !self.expression.trim().is_empty()
            && self.weight > 0.0
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Partial replacement of a stored configuration for one evaluation call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormulaOverrides {
    pub weights: Option<BTreeMap<String, f64>>,
    pub parameters: BTreeMap<String, f64>,
    pub custom_params: BTreeMap<String, f64>,
    pub formulas: FormulaSetOverride,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormulaSetOverride {
    pub weighted: Option<String>,
    pub risk: Option<String>,
    pub purchase: Option<String>,
}

/// Formula layer configuration, normally read from `config/scoringWeights`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaConfig {
    pub weights: BTreeMap<String, f64>,
    pub parameters: BTreeMap<String, f64>,
    pub custom_params: BTreeMap<String, f64>,
    pub calculators: Vec<ParameterCalculator>,
    pub formulas: FormulaSet,
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            parameters: default_parameters(),
            custom_params: BTreeMap::new(),
            calculators: Vec::new(),
            formulas: FormulaSet::default(),
        }
    }
}

impl FormulaConfig {
    /// Reads a stored weights document. Unknown or mistyped entries are skipped
    /// so a partially edited document still yields a usable configuration.
    pub fn from_document(document: &serde_json::Value) -> Self {
        let mut config = Self::default();
        let Some(fields) = document.as_object() else {
            return config;
        };

        let nested_weights = fields
            .get("weights")
            .and_then(|value| value.as_object())
            .map(|weights| {
                weights
                    .iter()
                    .filter(|(key, _)| key.as_str() != "version")
                    .filter_map(|(key, value)| value.as_f64().map(|weight| (key.clone(), weight)))
                    .collect::<BTreeMap<_, _>>()
            });

        let weights = match &nested_weights {
            Some(weights) => weights.clone(),
            None => fields
                .iter()
                .filter(|(key, _)| is_legacy_weight_key(key))
                .filter_map(|(key, value)| value.as_f64().map(|weight| (key.clone(), weight)))
                .collect(),
        };
        if !weights.is_empty() {
            config.weights = weights;
        }

        for (name, value) in config.parameters.iter_mut() {
            if let Some(stored) = fields.get(name.as_str()).and_then(|value| value.as_f64()) {
                *value = stored;
            }
        }

        if let Some(custom) = fields.get("custom_params").and_then(|value| value.as_object()) {
            config.custom_params = custom
                .iter()
                .filter_map(|(key, value)| value.as_f64().map(|n| (key.clone(), n)))
                .collect();
        }

        let weight_map = nested_weights.unwrap_or_default();
        let mut seen = HashSet::new();
        if let Some(rows) = fields.get("params_list").and_then(|value| value.as_array()) {
            for row in rows {
                let Ok(mut calculator) =
                    serde_json::from_value::<ParameterCalculator>(row.clone())
                else {
                    continue;
                };
                if calculator.name.is_empty() {
                    continue;
                }
                calculator.weight = weight_map.get(&calculator.name).copied().unwrap_or(0.0);
                seen.insert(calculator.name.clone());
                config.calculators.push(calculator);
            }
        }
        for (name, weight) in &weight_map {
            if seen.contains(name) {
                continue;
            }
            config.calculators.push(ParameterCalculator {
                name: name.clone(),
                description: String::new(),
                expression: String::new(),
                enabled: true,
                weight: *weight,
            });
        }

        if let Some(formula) = fields.get("formula_weighted_score").and_then(|v| v.as_str()) {
            config.formulas.weighted = formula.to_string();
        }
        if let Some(formula) = fields.get("formula_risk_score").and_then(|v| v.as_str()) {
            config.formulas.risk = formula.to_string();
        }
        if let Some(formula) = fields.get("formula_purchase").and_then(|v| v.as_str()) {
            config.formulas.purchase = formula.to_string();
        }

        config
    }

    /// Weights visible to formulas as `w_<name>`: the enabled calculator rows when
    /// any calculators exist, otherwise the plain weights map.
    pub fn effective_weights(&self) -> BTreeMap<String, f64> {
        if self.calculators.is_empty() {
            return self.weights.clone();
        }
        self.calculators
            .iter()
            .filter(|calculator| calculator.enabled)
            .map(|calculator| (calculator.name.clone(), calculator.weight))
            .collect()
    }

    /// `(Σ (expr_i)*w_i)/(Σ w_i)*p_output_scale_max` over the active calculators.
    pub fn generated_weighted_formula(&self) -> Option<String> {
        let active: Vec<&ParameterCalculator> = self
            .calculators
            .iter()
            .filter(|calculator| calculator.is_active())
            .collect();
        if active.is_empty() {
            return None;
        }

        let numerator = active
            .iter()
            .map(|calculator| format!("({})*w_{}", calculator.expression, calculator.name))
            .collect::<Vec<_>>()
            .join("+");
        let denominator = active
            .iter()
            .map(|calculator| format!("w_{}", calculator.name))
            .collect::<Vec<_>>()
            .join("+");
        Some(format!("({numerator})/({denominator})*p_output_scale_max"))
    }

    pub fn effective_weighted_formula(&self) -> String {
        self.generated_weighted_formula()
            .unwrap_or_else(|| self.formulas.weighted.clone())
    }

    pub fn apply(mut self, overrides: FormulaOverrides) -> Self {
        let FormulaOverrides {
            weights,
            parameters,
            custom_params,
            formulas,
        } = overrides;

        // an explicit weighted formula or weight map replaces the calculator rows
        if weights.is_some() || formulas.weighted.is_some() {
            self.weights = weights.unwrap_or_else(|| self.effective_weights());
            self.calculators.clear();
        }
        self.parameters.extend(parameters);
        self.custom_params.extend(custom_params);
        if let Some(formula) = formulas.weighted {
            self.formulas.weighted = formula;
        }
        if let Some(formula) = formulas.risk {
            self.formulas.risk = formula;
        }
        if let Some(formula) = formulas.purchase {
            self.formulas.purchase = formula;
        }
        self
    }
}

fn default_weights() -> BTreeMap<String, f64> {
    DEFAULT_WEIGHTS
        .iter()
        .map(|(name, weight)| (name.to_string(), *weight))
        .collect()
}

fn default_parameters() -> BTreeMap<String, f64> {
    DEFAULT_PARAMETERS
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

fn is_legacy_weight_key(key: &str) -> bool {
    !key.starts_with("p_")
        && !key.starts_with("formula_")
        && !RESERVED_KEYS.contains(&key)
        && !DEFAULT_PARAMETERS.iter().any(|(name, _)| *name == key)
}
