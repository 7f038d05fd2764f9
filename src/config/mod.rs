use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{BridgeError, Result};

/// Config file looked up in the add-on's client path
pub const CONFIG_FILE_NAME: &str = "pvr.python.toml";

/// PVR API version this add-on was built against
pub const PVR_API_VERSION: &str = "5.2.1";
pub const PVR_MIN_API_VERSION: &str = "5.2.0";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub script: ScriptConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Module imported from the client path
    #[serde(default = "default_module")]
    pub module: String,

    /// Module-level function returning the PVR implementation object
    #[serde(default = "default_factory")]
    pub factory: String,

    /// Appended to `sys.path` after the client path; relative entries are
    /// resolved against the client path
    #[serde(default)]
    pub extra_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Also write a daily-rotated log file into the user path
    #[serde(default = "default_false")]
    pub file: bool,

    /// Extra filter directives, e.g. "pvr_python=trace"
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            factory: default_factory(),
            extra_paths: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            file: false,
            filter: None,
        }
    }
}

fn default_module() -> String {
    "pvrimpl".to_string()
}

fn default_factory() -> String {
    "getInstance".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}

impl BridgeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| BridgeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content, path)
    }

    fn from_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| BridgeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `pvr.python.toml` from the client path, falling back to defaults
    /// when it does not exist, then apply environment overrides
    pub fn load(client_path: &Path) -> Result<Self> {
        let candidate = client_path.join(CONFIG_FILE_NAME);
        let mut config = if candidate.is_file() {
            Self::from_file(&candidate)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// PVR_PYTHON_MODULE, PVR_PYTHON_LOG_LEVEL, PVR_PYTHON_LOG_JSON
    pub fn apply_env(&mut self) {
        if let Ok(module) = std::env::var("PVR_PYTHON_MODULE") {
            if !module.is_empty() {
                self.script.module = module;
            }
        }
        if let Ok(level) = std::env::var("PVR_PYTHON_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if std::env::var("PVR_PYTHON_LOG_JSON").is_ok() {
            self.logging.format = LogFormat::Json;
        }
    }

    /// `sys.path` entries to add, client path first
    pub fn search_paths(&self, client_path: &Path) -> Vec<PathBuf> {
        std::iter::once(client_path.to_path_buf())
            .chain(self.script.extra_paths.iter().map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    client_path.join(p)
                }
            }))
            .collect()
    }
}
