//! Document options, loadable from TOML

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DxfError, Result};

/// Environment variable naming an options file
pub const CONFIG_ENV: &str = "DXFDOC_CONFIG";
/// Options file looked up in the working directory
pub const CONFIG_FILE: &str = "dxfdoc.toml";

/// Options fixed at document construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Compress runs of binary chunks in memory after loading
    pub compress_binary_data: bool,
    /// Write the leading `999` comment lines on save
    pub store_comments: bool,
    /// Directory holding `legacy.dxf` / `extended.dxf` templates for
    /// `Document::new`; built-in templates when unset
    pub template_dir: Option<PathBuf>,
    /// Run `audit` after loading and record findings as notifications
    pub audit_on_load: bool,
    pub logging: LoggingConfig,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            compress_binary_data: false,
            store_comments: true,
            template_dir: None,
            audit_on_load: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl DocumentOptions {
    /// Load options from an explicit path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DxfError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| DxfError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DxfError::Config(e.to_string()))
    }

    /// `$DXFDOC_CONFIG` if set, else `./dxfdoc.toml` if present, else defaults.
    pub fn discover() -> Result<Self> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }
        let local = env::current_dir()
            .map_err(|e| DxfError::Config(format!("cannot get working directory: {}", e)))?
            .join(CONFIG_FILE);
        if local.exists() {
            Self::from_file(local)
        } else {
            Ok(Self::default())
        }
    }
}

/// Logging setup used by the command line tools
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}
