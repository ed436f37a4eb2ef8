//! The engine's three components.
//!
//! [`AttendanceValidator`] turns check-in and check-out pings into validated
//! daily records, [`LeaveWorkflow`] runs the two-approver leave state machine,
//! and [`PayrollEngine`] combines both with employee contracts into versioned
//! payroll records.

mod attendance_validator;
mod leave_workflow;
mod payroll_engine;

pub use attendance_validator::AttendanceValidator;
pub use leave_workflow::LeaveWorkflow;
pub use payroll_engine::PayrollEngine;
