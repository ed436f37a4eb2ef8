//! Configuration loading and management for the HR compliance engine.
//!
//! This module loads the workplace, payroll policy, working calendar and
//! effective-dated statutory tables from YAML files. Components receive the
//! result as an explicit `Arc<EngineConfig>`.
//!
//! # Example
//!
//! ```no_run
//! use hr_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/sample").unwrap();
//! println!("Loaded workplace: {}", config.config().workplace().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
#[cfg(test)]
pub(crate) use types::test_support;
pub use types::{
    EngineConfig, InsuranceRate, InsuranceRates, PayrollPolicy, PeriodOverride, StatutoryTable,
    TaxBracket, WorkCalendar, WorkplaceConfig,
};
