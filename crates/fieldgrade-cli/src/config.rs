//! CLI configuration (`fieldgrade.toml`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level fieldgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldgradeConfig {
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Output format when `--format` is not given: text, json, all.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Summable keys added to every exercise's own list.
    #[serde(default)]
    pub summable_keys: Vec<String>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./fieldgrade-results")
}
fn default_format() -> String {
    "text".to_string()
}

impl Default for FieldgradeConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            default_format: default_format(),
            summable_keys: Vec::new(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim; a `${...}` inside a value is not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load config from an explicit path, or `fieldgrade.toml` in the current directory.
///
/// `FIELDGRADE_OUTPUT_DIR` overrides the output directory.
pub fn load_config_from(path: Option<&Path>) -> Result<FieldgradeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("fieldgrade.toml");
            local.exists().then_some(local)
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            toml::from_str::<FieldgradeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => FieldgradeConfig::default(),
    };

    if let Ok(dir) = std::env::var("FIELDGRADE_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    config.output_dir = PathBuf::from(resolve_env_vars(&config.output_dir.to_string_lossy()));
    config.default_format = resolve_env_vars(&config.default_format);
    config.summable_keys = config
        .summable_keys
        .iter()
        .map(|k| resolve_env_vars(k))
        .collect();

    Ok(config)
}
