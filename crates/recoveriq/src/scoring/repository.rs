use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::calculator::CalculatorSettings;
use super::domain::Kpi;
use super::formulas::FormulaConfig;

pub const CONFIG_COLLECTION: &str = "config";
pub const KPI_DOCUMENT: &str = "kpis";
pub const SCORING_WEIGHTS_DOCUMENT: &str = "scoringWeights";
pub const SCORING_SYSTEM_DOCUMENT: &str = "scoring_system";

/// Keyed JSON document storage holding the scoring configuration. Calls may
/// block; the HTTP handlers run them on the blocking thread pool.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<serde_json::Value>, StoreError>;
    fn set(&self, collection: &str, id: &str, document: serde_json::Value)
        -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("document {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("document {path} is not valid json: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The stored KPI document exists but cannot be read as a KPI list.
#[derive(Debug, thiserror::Error)]
pub enum KpiConfigError {
    #[error("kpi configuration is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<HashMap<(String, String), serde_json::Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, collection: &str, id: &str, document: serde_json::Value) -> Self {
        if let Ok(mut guard) = self.documents.lock() {
            guard.insert((collection.to_string(), id.to_string()), document);
        }
        self
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let guard = self
            .documents
            .lock()
            .map_err(|_| StoreError::Unavailable("document mutex poisoned".to_string()))?;
        Ok(guard
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    fn set(
        &self,
        collection: &str,
        id: &str,
        document: serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|_| StoreError::Unavailable("document mutex poisoned".to_string()))?;
        guard.insert((collection.to_string(), id.to_string()), document);
        Ok(())
    }
}

/// Documents stored as `<root>/<collection>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, collection: &str, id: &str) -> PathBuf {
        self.root.join(collection).join(format!("{id}.json"))
    }
}

impl DocumentStore for FileDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let path = self.path_for(collection, id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Decode { path, source })
    }

    fn set(
        &self,
        collection: &str,
        id: &str,
        document: serde_json::Value,
    ) -> Result<(), StoreError> {
        let path = self.path_for(collection, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let body = serde_json::to_vec_pretty(&document).map_err(|source| StoreError::Decode {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|source| StoreError::Io { path, source })
    }
}

/// Loads `config/kpis`. A missing document, a document without a `kpis` field,
/// or an unreachable store all yield an empty list. Only a `kpis` value that is
/// not an array is an error; a single unreadable entry never fails the load.
pub fn load_kpis<S: DocumentStore + ?Sized>(store: &S) -> Result<Vec<Kpi>, KpiConfigError> {
    let document = match store.get(CONFIG_COLLECTION, KPI_DOCUMENT) {
        Ok(Some(document)) => document,
        Ok(None) => {
            warn!("kpi document missing; scoring with an empty kpi set");
            return Ok(Vec::new());
        }
        Err(error) => {
            warn!(%error, "kpi document unavailable; scoring with an empty kpi set");
            return Ok(Vec::new());
        }
    };

    let Some(entries) = document.get("kpis").filter(|entries| !entries.is_null()) else {
        warn!("kpi document has no kpis field; scoring with an empty kpi set");
        return Ok(Vec::new());
    };
    let Some(entries) = entries.as_array() else {
        return Err(KpiConfigError::Malformed(format!(
            "kpis must be an array, found {entries}"
        )));
    };
    let kpis: Vec<Kpi> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| decode_kpi(index, entry))
        .collect();

    for kpi in &kpis {
        if let Some(issue) = kpi.unit_issue() {
            warn!(kpi = %kpi.id, %issue, "kpi unit does not match metric type");
        }
    }
    Ok(kpis)
}

/// Decodes one stored KPI. Unreadable scoring rules keep the KPI with no rules so
/// it scores 0; an entry that is unreadable otherwise is skipped.
fn decode_kpi(index: usize, entry: &serde_json::Value) -> Option<Kpi> {
    let error = match serde_json::from_value::<Kpi>(entry.clone()) {
        Ok(kpi) => return Some(kpi),
        Err(error) => error,
    };

    let mut without_rules = entry.clone();
    let had_rules = without_rules
        .as_object_mut()
        .and_then(|fields| fields.remove("scoring_rules"))
        .is_some();
    if had_rules {
        if let Ok(kpi) = serde_json::from_value::<Kpi>(without_rules) {
            warn!(kpi = %kpi.id, %error, "kpi scoring rules unreadable; kpi scores 0");
            return Some(kpi);
        }
    }

    warn!(index, %error, "kpi entry unreadable; skipping it");
    None
}

/// Loads `config/scoringWeights`, falling back to the built-in formulas.
pub fn load_formula_config<S: DocumentStore + ?Sized>(store: &S) -> FormulaConfig {
    match store.get(CONFIG_COLLECTION, SCORING_WEIGHTS_DOCUMENT) {
        Ok(Some(document)) => FormulaConfig::from_document(&document),
        Ok(None) => FormulaConfig::default(),
        Err(error) => {
            warn!(%error, "scoring weights unavailable; using default formulas");
            FormulaConfig::default()
        }
    }
}

/// Loads `config/scoring_system`, falling back to the default tiers.
pub fn load_calculator_settings<S: DocumentStore + ?Sized>(store: &S) -> CalculatorSettings {
    match store.get(CONFIG_COLLECTION, SCORING_SYSTEM_DOCUMENT) {
        Ok(Some(document)) => serde_json::from_value(document).unwrap_or_else(|error| {
            warn!(%error, "scoring system document malformed; using default tiers");
            CalculatorSettings::default()
        }),
        Ok(None) => CalculatorSettings::default(),
        Err(error) => {
            warn!(%error, "scoring system unavailable; using default tiers");
            CalculatorSettings::default()
        }
    }
}
