//! The engine facade shared by a host application.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigLoader, EngineConfig};
use crate::directory::EmployeeDirectory;
use crate::error::EngineResult;
use crate::services::{AttendanceValidator, LeaveWorkflow, PayrollEngine};

/// Shared engine state.
///
/// Bundles the configuration, the employee directory, the clock and the three
/// components. Cloning is cheap and every clone sees the same stores.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use hr_engine::HrEngine;
/// use hr_engine::directory::InMemoryEmployeeDirectory;
///
/// let engine = HrEngine::from_config_dir("./config/sample", Arc::new(InMemoryEmployeeDirectory::new()))?;
/// assert!(engine.payroll().current_payroll(1, 2024, 11).is_err());
/// # Ok::<(), hr_engine::error::EngineError>(())
/// ```
#[derive(Clone)]
pub struct HrEngine {
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn EmployeeDirectory>,
    attendance: Arc<AttendanceValidator>,
    leave: Arc<LeaveWorkflow>,
    payroll: Arc<PayrollEngine>,
}

impl std::fmt::Debug for HrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HrEngine")
            .field("config", &self.config)
            .field("attendance", &self.attendance)
            .field("leave", &self.leave)
            .field("payroll", &self.payroll)
            .finish_non_exhaustive()
    }
}

impl HrEngine {
    /// Creates an engine after validating `config`.
    pub fn new(
        config: Arc<EngineConfig>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
    ) -> EngineResult<Self> {
        config.validate()?;

        let attendance = Arc::new(AttendanceValidator::new(Arc::clone(&config), Arc::clone(&clock))?);
        let leave = Arc::new(LeaveWorkflow::new(Arc::clone(&config), Arc::clone(&clock)));
        let payroll = Arc::new(PayrollEngine::new(
            Arc::clone(&config),
            Arc::clone(&clock),
            Arc::clone(&directory),
            Arc::clone(&attendance),
            Arc::clone(&leave),
        ));

        info!(
            workplace = %config.workplace().name,
            statutory_tables = config.statutory_tables().len(),
            "HR engine initialised"
        );

        Ok(Self {
            config,
            clock,
            directory,
            attendance,
            leave,
            payroll,
        })
    }

    /// Loads configuration from a directory and uses the system clock.
    pub fn from_config_dir<P: AsRef<Path>>(path: P, directory: Arc<dyn EmployeeDirectory>) -> EngineResult<Self> {
        let config = ConfigLoader::load(path)?.into_shared();
        Self::new(config, directory, Arc::new(SystemClock))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the clock.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Returns the employee directory.
    pub fn directory(&self) -> &dyn EmployeeDirectory {
        self.directory.as_ref()
    }

    /// Returns the attendance component.
    pub fn attendance(&self) -> &AttendanceValidator {
        &self.attendance
    }

    /// Returns the leave component.
    pub fn leave(&self) -> &LeaveWorkflow {
        &self.leave
    }

    /// Returns the payroll component.
    pub fn payroll(&self) -> &PayrollEngine {
        &self.payroll
    }
}
