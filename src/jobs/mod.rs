//! Background jobs driven by a tokio runtime.
//!
//! The monthly payroll run fans out across employees; the attendance sweep
//! closes elapsed days on a fixed interval.

mod attendance_sweep;
mod payroll_run;

pub use attendance_sweep::{run_attendance_sweep, spawn_attendance_sweep};
pub use payroll_run::{PayrollRunFailure, PayrollRunReport, run_monthly_payroll};
