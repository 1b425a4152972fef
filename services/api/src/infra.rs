use metrics_exporter_prometheus::PrometheusHandle;
use recoveriq::config::StoreConfig;
use recoveriq::scoring::FileDocumentStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn document_store(config: &StoreConfig) -> Arc<FileDocumentStore> {
    Arc::new(FileDocumentStore::new(config.root.clone()))
}
