//! Hospital debt portfolio scoring.
//!
//! KPI definitions are scored rule by rule against a flat hospital input, then
//! reduced into weighted category and overall scores. Derived metrics and the
//! operator formula layer sit on top of the same input and never feed back into
//! the KPI result.

pub mod aggregate;
pub mod calculator;
pub mod domain;
mod engine;
pub mod formulas;
pub mod input;
pub mod repository;
pub mod router;
pub(crate) mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregate::{category_scores, overall_score, KpiScore, ScoreResult};
pub use calculator::{
    CalculationResult, CalculatorSettings, ConfidenceLevel, DerivedMetrics, RiskTier,
};
pub use domain::{BenchmarkRange, Kpi, KpiCategory, KpiRule, MetricType, TrendDirection};
pub use engine::KpiEngine;
pub use formulas::{
    FormulaConfig, FormulaError, FormulaKind, FormulaOutcome, FormulaOverrides, RiskLevel,
};
pub use input::{read_hospitals_csv, read_hospitals_csv_path, HospitalInput, InputError};
pub use repository::{
    load_calculator_settings, load_formula_config, load_kpis, DocumentStore,
    FileDocumentStore, InMemoryDocumentStore, KpiConfigError, StoreError,
};
pub use router::{scoring_router, with_cors};
pub use rules::{score_kpi, RuleError};
pub use service::{FormulaRequest, ScoringService, ScoringServiceError};
