//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configurations from YAML files.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, PayrollPolicy, StatutoryTable, WorkCalendar, WorkplaceConfig};

/// Loads and validates engine configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory
/// and checks them before handing out an [`EngineConfig`].
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/sample/
/// ├── workplace.yaml     # Anchor point, timezone, geofence, shift start
/// ├── payroll.yaml       # Hours per day, overtime, rounding, paid leave
/// ├── calendar.yaml      # Working weekdays, public holidays, overrides
/// └── statutory/
///     └── 2024-07-01.yaml  # Insurance and tax tables effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use hr_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/sample").unwrap();
/// println!("Workplace: {}", loader.config().workplace().name);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML (`ConfigParseError`)
    /// - The values break a semantic rule (`InvalidConfiguration`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let workplace = Self::load_yaml::<WorkplaceConfig>(&path.join("workplace.yaml"))?;
        let payroll = Self::load_yaml::<PayrollPolicy>(&path.join("payroll.yaml"))?;
        let calendar = Self::load_yaml::<WorkCalendar>(&path.join("calendar.yaml"))?;
        let statutory = Self::load_statutory(&path.join("statutory"))?;

        let config = EngineConfig::new(workplace, payroll, calendar, statutory);
        config.validate()?;

        debug!(
            path = %path.display(),
            statutory_tables = config.statutory_tables().len(),
            "Loaded engine configuration"
        );
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all statutory tables from the statutory directory.
    fn load_statutory(dir: &Path) -> EngineResult<Vec<StatutoryTable>> {
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut tables = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                tables.push(Self::load_yaml::<StatutoryTable>(&path)?);
            }
        }

        if tables.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no statutory tables found)", dir_str),
            });
        }

        Ok(tables)
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning a shareable configuration.
    pub fn into_shared(self) -> Arc<EngineConfig> {
        Arc::new(self.config)
    }
}
