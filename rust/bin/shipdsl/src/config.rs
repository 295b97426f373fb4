//! Optional build configuration.
//!
//! Reads `shipdsl.toml` (or the file given with `--config`):
//!
//! ```toml
//! [naming]
//! format = "lower"   # or "upper"
//! prefix = ""
//! suffix = ""
//!
//! [output]
//! ir = "build/schema.json"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shipdsl_codegen_lib::TableNaming;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "shipdsl.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Table naming policy shared by all emitters.
    pub naming: TableNaming,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where `build` also writes the IR JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ir: Option<PathBuf>,
}

impl Config {
    /// Load an explicitly named config file. A missing file is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load `--config` if given, else `shipdsl.toml` if present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG);
                if path.exists() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipdsl_codegen_lib::TableFormat;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.naming, TableNaming::default());
        assert!(config.output.ir.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str("[naming]\nformat = \"upper\"\nprefix = \"t_\"\n").unwrap();
        assert_eq!(config.naming.format, TableFormat::Upper);
        assert_eq!(config.naming.prefix, "t_");
        assert_eq!(config.naming.suffix, "");
        assert!(config.output.ir.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.output.ir = Some(PathBuf::from("build/schema.json"));
        config.naming.suffix = "_tbl".to_string();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
