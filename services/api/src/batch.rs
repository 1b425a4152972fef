use clap::Args;
use recoveriq::config::TelemetryConfig;
use recoveriq::error::AppError;
use recoveriq::scoring::repository::{CONFIG_COLLECTION, KPI_DOCUMENT};
use recoveriq::scoring::{
    load_kpis, read_hospitals_csv_path, CalculationResult, CalculatorSettings, DocumentStore,
    InMemoryDocumentStore, KpiEngine, StoreError,
};
use recoveriq::telemetry;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// KPI document (`{"kpis": [...]}`) or a bare JSON array of KPIs
    #[arg(long)]
    pub(crate) kpis: PathBuf,
    /// CSV file with one hospital per row and a header row of field names
    #[arg(long)]
    pub(crate) hospitals: PathBuf,
    /// Add risk tier, collectability and purchase value to each result
    #[arg(long)]
    pub(crate) derived: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let telemetry_config = TelemetryConfig {
        log_level: "warn".to_string(),
        ansi: false,
    };
    telemetry::init(&telemetry_config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let scored = score_file(&args, &mut out)?;
    out.flush()?;

    info!(hospitals = scored, "batch scoring finished");
    Ok(())
}

/// Writes one JSON result per hospital and returns how many were scored.
pub(crate) fn score_file<W: Write>(args: &ScoreArgs, out: &mut W) -> Result<usize, AppError> {
    let store = InMemoryDocumentStore::new();
    store.set(CONFIG_COLLECTION, KPI_DOCUMENT, read_kpi_document(&args.kpis)?)?;
    let engine = KpiEngine::new(load_kpis(&store)?);
    let settings = CalculatorSettings::default();

    let hospitals = read_hospitals_csv_path(&args.hospitals)?;
    for hospital in &hospitals {
        let score = engine.score(hospital);
        let line = if args.derived {
            let derived = settings.assess(&score);
            serde_json::to_string(&CalculationResult { score, derived })
        } else {
            serde_json::to_string(&score)
        }
        .map_err(io::Error::from)?;
        writeln!(out, "{line}")?;
    }
    Ok(hospitals.len())
}

fn read_kpi_document(path: &Path) -> Result<serde_json::Value, StoreError> {
    let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: serde_json::Value =
        serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(match document {
        serde_json::Value::Array(kpis) => serde_json::json!({ "kpis": kpis }),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn scratch(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "recoveriq-batch-{label}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn write_inputs(dir: &Path) -> ScoreArgs {
        let kpis = dir.join("kpis.json");
        std::fs::write(
            &kpis,
            r#"[{
                "id": "recovery_rate",
                "name": "Recovery Rate",
                "category": "Financial Performance",
                "weight": 1,
                "scoring_rules": [
                    { "condition": "recovery_rate >= 8", "score": 10 },
                    { "condition": "recovery_rate >= 4", "score": 5 },
                    { "condition": "true", "score": 0 }
                ]
            }]"#,
        )
        .expect("write kpis");

        let hospitals = dir.join("hospitals.csv");
        std::fs::write(
            &hospitals,
            "name,recovery_rate\nMercy General,9\nCounty Medical,5\n",
        )
        .expect("write hospitals");

        ScoreArgs {
            kpis,
            hospitals,
            derived: false,
        }
    }

    #[test]
    fn scores_each_csv_row_as_a_json_line() {
        let dir = scratch("lines");
        let args = write_inputs(&dir);

        let mut out = Vec::new();
        let scored = score_file(&args, &mut out).expect("batch scores");

        assert_eq!(scored, 2);
        let lines: Vec<Value> = String::from_utf8(out)
            .expect("utf8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines[0]["hospital"], "Mercy General");
        assert_eq!(lines[0]["overall_score"], 100.0);
        assert_eq!(lines[1]["overall_score"], 50.0);
        assert!(lines[0].get("risk_tier").is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn derived_flag_adds_calculator_fields() {
        let dir = scratch("derived");
        let mut args = write_inputs(&dir);
        args.derived = true;

        let mut out = Vec::new();
        score_file(&args, &mut out).expect("batch scores");

        let first: Value = serde_json::from_str(
            String::from_utf8(out)
                .expect("utf8 output")
                .lines()
                .next()
                .expect("one line"),
        )
        .expect("json line");
        assert_eq!(first["risk_tier"], "Excellent");
        assert_eq!(first["confidence_level"], "Low");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_kpi_file_is_a_store_error() {
        let dir = scratch("missing");
        let mut args = write_inputs(&dir);
        args.kpis = dir.join("absent.json");

        let error = score_file(&args, &mut Vec::<u8>::new()).expect_err("missing file");
        assert!(matches!(error, AppError::Store(StoreError::Io { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
