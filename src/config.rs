// ABOUTME: Migration settings loaded from TOML and overridden by CLI flags
// ABOUTME: Covers default store id, table prefix, entity link column and failure mode

use crate::utils::validate_identifier;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// How the orchestrator reports a failed, rolled-back batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// Return the failure as an error after rolling back
    #[default]
    Strict,
    /// Roll back, log, and return a `RolledBack` outcome carrying the cause
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationConfig {
    /// Store every source row is collapsed onto
    pub default_store_id: i64,
    /// Prefix prepended to every logical table name
    pub table_prefix: String,
    /// Entity link column: `row_id` with content staging, `entity_id` without
    pub link_field: String,
    pub failure_mode: FailureMode,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            default_store_id: 0,
            table_prefix: String::new(),
            link_field: "row_id".to_string(),
            failure_mode: FailureMode::Strict,
        }
    }
}

/// Values given on the command line, applied over the file config
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub default_store_id: Option<i64>,
    pub table_prefix: Option<String>,
    pub link_field: Option<String>,
    pub best_effort: bool,
}

impl MigrationConfig {
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(id) = overrides.default_store_id {
            self.default_store_id = id;
        }
        if let Some(prefix) = &overrides.table_prefix {
            self.table_prefix = prefix.clone();
        }
        if let Some(field) = &overrides.link_field {
            self.link_field = field.clone();
        }
        if overrides.best_effort {
            self.failure_mode = FailureMode::BestEffort;
        }
    }

    /// Parse a TOML document and validate it
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: MigrationConfig =
            toml::from_str(contents).context("Failed to parse migration config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_store_id < 0 {
            bail!(
                "default_store_id must not be negative (got {})",
                self.default_store_id
            );
        }
        if !self.table_prefix.is_empty() {
            validate_identifier(&self.table_prefix).context("Invalid table_prefix")?;
        }
        validate_identifier(&self.link_field).context("Invalid link_field")?;
        Ok(())
    }
}

/// Load and validate a migration config file
pub fn load_config_from_file(path: impl AsRef<Path>) -> Result<MigrationConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    MigrationConfig::from_toml(&contents)
        .with_context(|| format!("Invalid config file {}", path.display()))
}
