//! In-memory stores backing the engine's components.
//!
//! Each store enforces its own uniqueness and concurrency rule:
//! attendance is insert-if-absent per (employee, date), leave requests use
//! optimistic versions, and the payroll ledger claims (employee, period)
//! keys for the length of a run.

mod attendance_store;
mod leave_store;
mod payroll_ledger;

pub use attendance_store::AttendanceStore;
pub use leave_store::LeaveStore;
pub use payroll_ledger::{PayrollLedger, RunGuard};
