use std::io::Read;
use std::path::Path;

use crate::expression::{Value, Variables};

/// Flat hospital metric values supplied at scoring time. There is no fixed schema:
/// any key a rule condition or formula references must be present here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HospitalInput {
    fields: Variables,
}

impl HospitalInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the input from a JSON object. Scalars are kept; `null`, arrays and
    /// nested objects are dropped.
    pub fn from_json(payload: serde_json::Value) -> Result<Self, InputError> {
        let object = match payload {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(InputError::NotAnObject {
                    found: json_kind(&other),
                })
            }
        };

        let fields = object
            .iter()
            .filter_map(|(key, value)| Value::from_json(value).map(|value| (key.clone(), value)))
            .collect();
        Ok(Self { fields })
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn variables(&self) -> &Variables {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Display name of the hospital, `"Unknown"` when none was supplied.
    pub fn name(&self) -> String {
        match self.fields.get("name") {
            Some(Value::Str(name)) if !name.is_empty() => name.clone(),
            Some(Value::Number(n)) if *n != 0.0 => n.to_string(),
            Some(Value::Bool(true)) => "true".to_string(),
            _ => "Unknown".to_string(),
        }
    }
}

/// Reads one hospital per CSV row, using the header row as field names.
pub fn read_hospitals_csv<R: Read>(reader: R) -> Result<Vec<HospitalInput>, InputError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut hospitals = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut input = HospitalInput::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if let Some(value) = parse_cell(cell) {
                input.insert(header, value);
            }
        }
        hospitals.push(input);
    }
    Ok(hospitals)
}

pub fn read_hospitals_csv_path<P: AsRef<Path>>(path: P) -> Result<Vec<HospitalInput>, InputError> {
    let file = std::fs::File::open(path)?;
    read_hospitals_csv(file)
}

fn parse_cell(cell: &str) -> Option<Value> {
    if cell.is_empty() {
        return None;
    }
    if cell.eq_ignore_ascii_case("true") {
        return Some(Value::Bool(true));
    }
    if cell.eq_ignore_ascii_case("false") {
        return Some(Value::Bool(false));
    }
    match cell.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(Value::Number(n)),
        _ => Some(Value::Str(cell.to_string())),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("hospital input must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
    #[error("invalid JSON body: {0}")]
    InvalidJson(serde_json::Error),
    #[error("invalid hospital CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read hospital data: {0}")]
    Io(#[from] std::io::Error),
}
