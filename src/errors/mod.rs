use std::path::PathBuf;

use pyo3::PyErr;
use thiserror::Error;

use crate::schema::RecordKind;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("host callback table is missing `{0}`")]
    HostRegistration(&'static str),

    #[error("invalid add-on properties: {0}")]
    InvalidProperties(String),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to import script module '{module}': {message}")]
    ModuleImport { module: String, message: String },

    #[error("script factory '{module}.{factory}' failed: {message}")]
    Factory {
        module: String,
        factory: String,
        message: String,
    },

    #[error("script does not implement '{0}'")]
    MissingMethod(String),

    #[error("{kind} field '{field}' expects {expected}, found {found}")]
    Coercion {
        kind: RecordKind,
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("script returned an unexpected value from '{method}': {message}")]
    UnexpectedReturn { method: String, message: String },

    #[error("script raised: {0}")]
    Script(String),

    #[error(transparent)]
    Python(#[from] PyErr),

    #[error("add-on has not been created")]
    NotCreated,
}

impl BridgeError {
    pub fn unexpected_return(method: &str, message: impl Into<String>) -> Self {
        Self::UnexpectedReturn {
            method: method.to_string(),
            message: message.into(),
        }
    }
}
