//! Configuration types and parsing for qo.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from qo.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Catalog files registered before every plan (relative to the project)
    #[serde(default)]
    pub catalog_paths: Vec<String>,

    /// Default output format for plan evaluation
    #[serde(default)]
    pub output: OutputFormat,

    /// Plan evaluation settings
    #[serde(default)]
    pub eval: EvalConfig,

    /// Report telemetry-tagged operator counts when checking plans
    #[serde(default)]
    pub telemetry: bool,
}

/// Output format for evaluated rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// JSON array of row objects
    Json,
}

/// Plan evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalConfig {
    /// Maximum number of rows printed per result
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
        }
    }
}

fn default_max_rows() -> usize {
    1000
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    /// Looks for qo.yml or qo.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("qo.yml");
        let yaml_path = dir.join("qo.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Catalog paths resolved against the project root
    pub fn catalog_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.catalog_paths.iter().map(|p| root.join(p)).collect()
    }

    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        if self.eval.max_rows == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "eval.max_rows must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "qopt".to_string(),
            catalog_paths: Vec::new(),
            output: OutputFormat::default(),
            eval: EvalConfig::default(),
            telemetry: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = serde_yaml::from_str("name: demo").unwrap();
        assert_eq!(config.name, "demo");
        assert_eq!(config.output, OutputFormat::Table);
        assert_eq!(config.eval.max_rows, 1000);
        assert!(!config.telemetry);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
name: demo
catalog_paths: [catalog/base.yml]
output: json
eval:
  max_rows: 10
telemetry: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.eval.max_rows, 10);
        assert!(config.telemetry);
        let root = PathBuf::from("/tmp/demo");
        assert_eq!(
            config.catalog_paths_absolute(&root),
            vec![root.join("catalog/base.yml")]
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_yaml::from_str::<Config>("name: demo\nbogus: 1").is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("qo.yml"), "name: from_dir\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.name, "from_dir");
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_from_dir(dir.path()),
            Err(CoreError::ConfigNotFound { .. })
        ));
        let path = dir.path().join("qo.yml");
        std::fs::write(&path, "name: x\neval:\n  max_rows: 0\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(CoreError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_unreadable_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        let CoreError::IoWithPath { path, .. } = &err else {
            panic!("expected an io error with path, got {err:?}");
        };
        assert_eq!(path, &dir.path().display().to_string());
        assert!(err.to_string().starts_with("IO error at "));
    }
}
