use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Value};

use crate::scoring::domain::{Kpi, KpiCategory, KpiRule};
use crate::scoring::input::HospitalInput;
use crate::scoring::repository::{
    DocumentStore, InMemoryDocumentStore, StoreError, CONFIG_COLLECTION, KPI_DOCUMENT,
};
use crate::scoring::service::ScoringService;
use crate::scoring::{scoring_router, with_cors};

pub(super) fn recovery_rate_kpi() -> Kpi {
    Kpi::new(
        "recovery_rate",
        "Recovery Rate",
        KpiCategory::FinancialPerformance,
        2.0,
        vec![
            KpiRule::new("recovery_rate >= 8", 10.0),
            KpiRule::new("recovery_rate >= 4", 5.0),
            KpiRule::new("true", 0.0),
        ],
    )
}

pub(super) fn statute_kpi() -> Kpi {
    Kpi::new(
        "statute_months",
        "Statute Remaining",
        KpiCategory::LegalAndCompliance,
        1.0,
        vec![
            KpiRule::new("statute_months >= 24", 4.0),
            KpiRule::new("statute_months >= 12", 2.0),
            KpiRule::new("true", 0.0),
        ],
    )
}

pub(super) fn data_quality_kpi() -> Kpi {
    Kpi::new(
        "data_complete",
        "Data Completeness",
        KpiCategory::DataQuality,
        1.0,
        vec![
            KpiRule::new("data_complete", 1.0),
            KpiRule::new("true", 0.0),
        ],
    )
}

pub(super) fn kpi_set() -> Vec<Kpi> {
    vec![recovery_rate_kpi(), statute_kpi(), data_quality_kpi()]
}

pub(super) fn strong_hospital() -> HospitalInput {
    HospitalInput::new()
        .with("name", "Mercy General")
        .with("recovery_rate", 9.0)
        .with("statute_months", 30.0)
        .with("data_complete", true)
}

pub(super) fn kpi_document(kpis: &[Kpi]) -> Value {
    json!({ "kpis": kpis })
}

pub(super) fn store_with_kpis(kpis: &[Kpi]) -> InMemoryDocumentStore {
    InMemoryDocumentStore::new().with_document(CONFIG_COLLECTION, KPI_DOCUMENT, kpi_document(kpis))
}

pub(super) fn build_service() -> ScoringService<InMemoryDocumentStore> {
    ScoringService::new(Arc::new(store_with_kpis(&kpi_set())))
}

pub(super) fn router_with_store<S>(store: S) -> axum::Router
where
    S: DocumentStore + 'static,
{
    with_cors(scoring_router(Arc::new(ScoringService::new(Arc::new(store)))))
}

pub(super) struct UnavailableStore;

impl DocumentStore for UnavailableStore {
    fn get(&self, _collection: &str, _id: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn set(&self, _collection: &str, _id: &str, _document: Value) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn approx(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}
