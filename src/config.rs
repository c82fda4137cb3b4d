//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OCR backend the worker talks to.
    pub server: ServerCfg,
    /// Limits applied before anything is uploaded.
    pub upload: UploadCfg,
}

/// Backend connection values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCfg {
    /// Base URL of the OCR server, no trailing slash.
    pub base_url: String,
}

/// Client-side upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCfg {
    /// Maximum accepted image size in megabytes.
    pub max_size_mb: u64,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    /// Upload cap in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.upload.max_size_mb * 1024 * 1024
    }
}

impl Default for Config {
    /// Defaults match the local Flask server the OCR pipeline ships with.
    fn default() -> Self {
        Self {
            server: ServerCfg {
                base_url: "http://127.0.0.1:5000".into(),
            },
            upload: UploadCfg { max_size_mb: 10 },
        }
    }
}
