//! Application configuration, persisted as JSON.

use std::path::{Path, PathBuf};

use gguf_parser::DEFAULT_HINT_NAMESPACE;
use quantize_core::{DEFAULT_METHOD, EngineTemplate, default_engines};
use serde::{Deserialize, Serialize};

/// Global configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Quantization method used when `--method` is not given.
    #[serde(default = "default_method")]
    pub default_method: String,
    /// Namespace of the runtime-hint keys (`<ns>.runtime.max_threads`).
    #[serde(default = "default_hint_namespace")]
    pub hint_namespace: String,
    /// Quantization engines, in preference order.
    #[serde(default = "default_engines")]
    pub engines: Vec<EngineTemplate>,
}

fn default_method() -> String {
    DEFAULT_METHOD.into()
}
fn default_hint_namespace() -> String {
    DEFAULT_HINT_NAMESPACE.into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_method: default_method(),
            hint_namespace: default_hint_namespace(),
            engines: default_engines(),
        }
    }
}

impl AppConfig {
    /// Platform config file: `~/.config/gguf-compress/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gguf-compress")
            .join("config.json")
    }

    /// Load from disk, or return defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_or_default(&dir.path().join("config.json")).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.default_method, "q4_k_m");
        assert_eq!(cfg.hint_namespace, "wllama");
        assert_eq!(cfg.engines.len(), 2);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = AppConfig {
            default_method: "q8_0".into(),
            hint_namespace: "edge".into(),
            engines: vec![EngineTemplate::new("custom", "/opt/quantize", ["--fast"])],
        };
        cfg.save(&path).unwrap();
        assert_eq!(AppConfig::load_or_default(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "default_method": "q5_k_m" }"#).unwrap();
        let cfg = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(cfg.default_method, "q5_k_m");
        assert_eq!(cfg.engines, default_engines());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AppConfig::load_or_default(&path).is_err());
    }
}
