use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Aggregation bucket for a KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KpiCategory {
    #[serde(rename = "Financial Performance")]
    FinancialPerformance,
    #[serde(rename = "Portfolio Composition")]
    PortfolioComposition,
    #[serde(rename = "Operational Efficiency")]
    OperationalEfficiency,
    #[serde(rename = "Legal & Compliance")]
    LegalAndCompliance,
    #[serde(rename = "Data Quality")]
    DataQuality,
    #[serde(rename = "Ethical / ESG", alias = "Ethical/ESG")]
    EthicalEsg,
}

impl KpiCategory {
    pub const ALL: [KpiCategory; 6] = [
        KpiCategory::FinancialPerformance,
        KpiCategory::PortfolioComposition,
        KpiCategory::OperationalEfficiency,
        KpiCategory::LegalAndCompliance,
        KpiCategory::DataQuality,
        KpiCategory::EthicalEsg,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            KpiCategory::FinancialPerformance => "Financial Performance",
            KpiCategory::PortfolioComposition => "Portfolio Composition",
            KpiCategory::OperationalEfficiency => "Operational Efficiency",
            KpiCategory::LegalAndCompliance => "Legal & Compliance",
            KpiCategory::DataQuality => "Data Quality",
            KpiCategory::EthicalEsg => "Ethical / ESG",
        }
    }
}

impl fmt::Display for KpiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Measurement family of a KPI. Only constrains which units the editor offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    #[serde(rename = "Financial")]
    Financial,
    #[serde(rename = "Time")]
    Time,
    #[serde(rename = "Volume / Count")]
    VolumeCount,
    #[serde(rename = "Quality / Data Integrity")]
    QualityDataIntegrity,
    #[serde(rename = "Legal / Compliance")]
    LegalCompliance,
    #[serde(rename = "Operational Efficiency")]
    OperationalEfficiency,
    #[serde(rename = "Socioeconomic / ESG")]
    SocioeconomicEsg,
    #[serde(rename = "Textual / Categorical")]
    TextualCategorical,
}

impl MetricType {
    pub fn units(&self) -> &'static [&'static str] {
        match self {
            MetricType::Financial => &["%", "$", "$M", "$ / acct", "$ / patient", "Ratio", "Index"],
            MetricType::Time => &["Days", "Months", "Years", "Days / claim"],
            MetricType::VolumeCount => &[
                "Count",
                "# of accounts",
                "# of facilities",
                "# of patients",
                "# / month",
                "# / year",
            ],
            MetricType::QualityDataIntegrity => &[
                "% complete",
                "% valid",
                "% error",
                "Score (1–5)",
                "Boolean",
                "Flag",
            ],
            MetricType::LegalCompliance => &[
                "Months Remaining",
                "Violations / year",
                "Complaints / 1k accounts",
            ],
            MetricType::OperationalEfficiency => &[
                "% denied",
                "% automated",
                "Hours",
                "Days / billing cycle",
                "% centralized",
            ],
            MetricType::SocioeconomicEsg => &[
                "$",
                "Complaints / year",
                "Satisfaction Score (1–5)",
                "% trained",
            ],
            MetricType::TextualCategorical => &["Text", "Enum", "Category"],
        }
    }

    pub fn allows_unit(&self, unit: &str) -> bool {
        self.units().contains(&unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    #[serde(rename = "Higher is better")]
    HigherIsBetter,
    #[serde(rename = "Lower is better")]
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRange {
    pub low: f64,
    pub high: f64,
}

/// One branch of a KPI's scoring logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRule {
    #[serde(default)]
    pub condition: String,
    #[serde(default, deserialize_with = "deserialize_number_or_zero")]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl KpiRule {
    pub fn new(condition: impl Into<String>, score: f64) -> Self {
        Self {
            condition: condition.into(),
            score,
            description: None,
        }
    }

    /// Condition text to evaluate; a blank condition never matches.
    pub fn condition_source(&self) -> &str {
        if self.condition.trim().is_empty() {
            "false"
        } else {
            &self.condition
        }
    }
}

/// Configurable scoring unit authored in the KPI admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub definition: String,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub why_it_matters: String,
    pub category: KpiCategory,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub metric_type: Option<MetricType>,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub data_source: String,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub unit: String,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub trend_direction: Option<TrendDirection>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub benchmark_range: Option<BenchmarkRange>,
    #[serde(default, deserialize_with = "deserialize_number_or_zero")]
    pub weight: f64,
    #[serde(default)]
    pub scoring_rules: Vec<KpiRule>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub editable_by: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_tags")]
    pub tags: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<NaiveDate>,
    #[serde(default = "enabled_by_default", deserialize_with = "deserialize_enabled")]
    pub enabled: bool,
}

impl Kpi {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: KpiCategory,
        weight: f64,
        scoring_rules: Vec<KpiRule>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            definition: String::new(),
            why_it_matters: String::new(),
            category,
            metric_type: None,
            data_source: String::new(),
            unit: String::new(),
            trend_direction: None,
            benchmark_range: None,
            weight,
            scoring_rules,
            editable_by: None,
            tags: Vec::new(),
            last_updated: None,
            enabled: true,
        }
    }

    /// Whether the KPI takes part in aggregation at all.
    pub fn is_scored(&self) -> bool {
        self.enabled && self.weight > 0.0
    }

    /// Describes a unit the editor would not offer for this metric type.
    pub fn unit_issue(&self) -> Option<String> {
        let metric_type = self.metric_type?;
        if self.unit.is_empty() || metric_type.allows_unit(&self.unit) {
            return None;
        }
        Some(format!(
            "unit '{}' is not valid for metric type {:?}",
            self.unit, metric_type
        ))
    }
}

fn enabled_by_default() -> bool {
    true
}

fn deserialize_enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn deserialize_number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Editor-only metadata: a value of the wrong shape reads as absent.
fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

fn deserialize_lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_lenient::<D, String>(deserializer)?.unwrap_or_default())
}

fn deserialize_lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let tags = match raw {
        Some(serde_json::Value::Array(tags)) => tags,
        _ => return Ok(Vec::new()),
    };
    Ok(tags
        .iter()
        .filter_map(|tag| tag.as_str().map(str::to_string))
        .collect())
}

fn deserialize_lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|value| value.as_str()).and_then(parse_date))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|stamp| stamp.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}
