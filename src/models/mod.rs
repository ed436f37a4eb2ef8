//! Core data models for the HR compliance engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod audit;
mod employee;
mod leave_request;
mod pay_period;
mod payroll_record;

pub use attendance::{
    AttendanceFlag, AttendanceRecord, CheckInDetails, CheckInMethod, CheckPoint, GeoPoint, Punctuality, ShiftKind,
};
pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use employee::{Contract, ContractKind, ContractStatus, Employee};
pub use leave_request::{
    Finalization, LeaveCategory, LeaveRequest, LeaveState, LeaveStatus, Rejection, SignOff,
};
pub use pay_period::PayPeriod;
pub use payroll_record::{
    Correction, MAX_BONUS, MAX_OVERTIME_HOURS, PayrollAdjustments, PayrollAmounts, PayrollInputs, PayrollRecord,
    PayrollStatus,
};
