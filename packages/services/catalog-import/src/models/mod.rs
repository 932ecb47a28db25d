pub mod product;
pub mod remote;

pub use product::*;
pub use remote::*;

use serde_json::Value;

/// Fallback outcome message when a failure carries neither a message nor errors.
pub const UNKNOWN_ERROR: &str = "unknown error";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Batch-level input problem (bad ids, conflicting option names). Maps to HTTP 400.
    #[error("{0}")]
    Validation(String),

    #[error("Remote catalog error: {0}")]
    Remote(#[from] RemoteError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV parsing error: {0}")]
    CsvParsing(#[from] csv::Error),

    #[error("XLSX parsing error: {0}")]
    XlsxParsing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ImportError {
    pub fn status(&self) -> u16 {
        match self {
            ImportError::Validation(_) => 400,
            ImportError::XlsxParsing(_) | ImportError::CsvParsing(_) => 400,
            ImportError::Remote(e) => e.status.unwrap_or(500),
            _ => 500,
        }
    }
}

impl From<calamine::XlsxError> for ImportError {
    fn from(e: calamine::XlsxError) -> Self { ImportError::XlsxParsing(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// Structured failure raised by the remote catalog for a single request.
///
/// Mirrors what the Admin API gives back: an optional HTTP-ish status, an
/// optional human message, and an optional `errors` payload that may be a
/// string, a list or an object.
#[derive(Debug, Clone, Default, PartialEq, thiserror::Error)]
#[error("{}", self.describe())]
pub struct RemoteError {
    pub status: Option<u16>,
    pub message: Option<String>,
    pub errors: Option<Value>,
}

impl RemoteError {
    pub fn with_message(status: Option<u16>, message: impl Into<String>) -> Self {
        Self { status, message: Some(message.into()), errors: None }
    }

    pub fn with_errors(status: Option<u16>, errors: Value) -> Self {
        Self { status, message: None, errors: Some(errors) }
    }

    /// Message reported in an import outcome.
    ///
    /// Precedence: explicit message, then `errors` (strings verbatim, non-empty
    /// lists/objects JSON-encoded), then [`UNKNOWN_ERROR`].
    pub fn outcome_message(&self) -> String {
        if let Some(msg) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return msg.to_string();
        }
        match &self.errors {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(v @ Value::Array(items)) if !items.is_empty() => v.to_string(),
            Some(v @ Value::Object(map)) if !map.is_empty() => v.to_string(),
            Some(v @ Value::Number(_)) => v.to_string(),
            _ => UNKNOWN_ERROR.to_string(),
        }
    }

    /// Flattened list of messages for HTTP error bodies.
    pub fn error_list(&self) -> Vec<String> {
        let mut out = Vec::new();
        match &self.errors {
            Some(Value::Array(items)) => {
                for e in items {
                    match e {
                        Value::String(s) => out.push(s.clone()),
                        other => match other.get("message").and_then(|m| m.as_str()) {
                            Some(m) => out.push(m.to_string()),
                            None => out.push(other.to_string()),
                        },
                    }
                }
            }
            Some(Value::String(s)) => out.push(s.clone()),
            Some(v @ Value::Object(map)) if !map.is_empty() && self.message.is_none() => out.push(v.to_string()),
            _ => {}
        }
        if out.is_empty() {
            out.push(self.message.clone().unwrap_or_else(|| "Unknown server error".to_string()));
        }
        out
    }

    fn describe(&self) -> String {
        let body = self.outcome_message();
        match self.status {
            Some(s) => format!("status={} {}", s, body),
            None => body,
        }
    }
}
