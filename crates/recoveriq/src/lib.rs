//! Hospital debt portfolio scoring: configurable KPI rules, weighted
//! aggregation, and operator-authored formulas over a small expression language.

pub mod config;
pub mod error;
pub mod expression;
pub mod scoring;
pub mod telemetry;

pub use error::AppError;
