//! Error types for the HR compliance engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the attendance, leave and payroll components can report.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::LeaveStatus;

/// Broad classification of an [`EngineError`].
///
/// Callers use the kind to decide between showing the message to the user,
/// re-reading state and retrying, or aborting a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input the caller can correct (date ranges, reasons, duplicates).
    Validation,
    /// The entity is not in a state that allows the operation.
    State,
    /// Configuration is missing or unusable.
    Configuration,
}

/// The main error type for the HR compliance engine.
///
/// # Example
///
/// ```
/// use hr_engine::error::{EngineError, ErrorKind};
/// use chrono::NaiveDate;
///
/// let error = EngineError::DuplicateCheckIn {
///     employee_id: 7,
///     date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
/// };
/// assert_eq!(error.to_string(), "Employee 7 already checked in on 2024-07-01");
/// assert_eq!(error.kind(), ErrorKind::Validation);
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but is not usable.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// What is wrong with the configuration.
        message: String,
    },

    /// A configuration table needed for a computation is absent.
    #[error("Configuration missing: no {what} effective on {date}")]
    ConfigurationMissing {
        /// The table that was looked up.
        what: String,
        /// The date it was needed for.
        date: NaiveDate,
    },

    /// A check-in already exists for the employee and date.
    #[error("Employee {employee_id} already checked in on {date}")]
    DuplicateCheckIn {
        /// The employee.
        employee_id: i64,
        /// The workplace-local calendar date.
        date: NaiveDate,
    },

    /// A check-out (or reason) arrived for a day without a check-in.
    #[error("No check-in found for employee {employee_id} on {date}")]
    NoCheckInFound {
        /// The employee.
        employee_id: i64,
        /// The workplace-local calendar date.
        date: NaiveDate,
    },

    /// The attendance day has elapsed; its record can no longer change.
    #[error("Attendance for employee {employee_id} on {date} is closed")]
    AttendanceClosed {
        /// The employee.
        employee_id: i64,
        /// The calendar date of the closed record.
        date: NaiveDate,
    },

    /// An attendance ping is stamped later than the engine clock allows.
    #[error("Attendance timestamp {at} for employee {employee_id} is in the future")]
    FutureTimestamp {
        /// The employee.
        employee_id: i64,
        /// The rejected timestamp.
        at: DateTime<FixedOffset>,
    },

    /// Reported coordinates are not a point on Earth.
    #[error("Invalid location ({latitude}, {longitude})")]
    InvalidLocation {
        /// Reported latitude.
        latitude: f64,
        /// Reported longitude.
        longitude: f64,
    },

    /// A leave request ends before it starts.
    #[error("Invalid date range: {end_date} is before {start_date}")]
    InvalidRange {
        /// Requested first day.
        start_date: NaiveDate,
        /// Requested last day.
        end_date: NaiveDate,
    },

    /// A mandatory free-text reason was empty.
    #[error("A reason is required to {action}")]
    MissingReason {
        /// The action that needed a reason.
        action: String,
    },

    /// A submission overlaps an open or approved request.
    #[error("Leave request overlaps existing request {existing_request_id}")]
    OverlappingLeave {
        /// The request already covering some of the dates.
        existing_request_id: Uuid,
    },

    /// No leave request exists with the given id.
    #[error("Leave request not found: {request_id}")]
    LeaveRequestNotFound {
        /// The id that was looked up.
        request_id: Uuid,
    },

    /// The workflow does not allow the action from the current state.
    #[error("Cannot {action} leave request {request_id} in state {from}")]
    IllegalTransition {
        /// The request.
        request_id: Uuid,
        /// The state the request was in.
        from: LeaveStatus,
        /// The attempted action.
        action: String,
    },

    /// Another writer changed the entity since the caller read it.
    #[error("Concurrent modification of {entity}: expected version {expected}, found {actual}")]
    ConcurrentModification {
        /// Description of the entity.
        entity: String,
        /// The version the caller acted on.
        expected: u64,
        /// The version currently stored.
        actual: u64,
    },

    /// Approving the request would exceed the annual leave quota.
    #[error("Annual leave quota exceeded for employee {employee_id}: requested {requested} days, {remaining} remaining")]
    LeaveQuotaExceeded {
        /// The employee.
        employee_id: i64,
        /// Days on the request being approved.
        requested: i64,
        /// Days still available in the year.
        remaining: i64,
    },

    /// The employee directory has no such employee.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The id that was looked up.
        employee_id: i64,
    },

    /// No contract covers the requested date.
    #[error("No active contract for employee {employee_id} on {date}")]
    NoActiveContract {
        /// The employee.
        employee_id: i64,
        /// The date that needed coverage.
        date: NaiveDate,
    },

    /// Worked-day aggregation produced a negative value.
    #[error("Negative worked days ({days}) computed for employee {employee_id}")]
    NegativeWorkedDays {
        /// The employee.
        employee_id: i64,
        /// The offending value.
        days: Decimal,
    },

    /// A payroll adjustment was out of range.
    #[error("Invalid payroll adjustment '{field}': {value}")]
    InvalidAdjustment {
        /// The adjustment field.
        field: String,
        /// The rejected value.
        value: Decimal,
    },

    /// The period already has a finalized payroll record.
    #[error("Payroll record {record_id} is finalized; use an explicit recompute")]
    PayrollFinalized {
        /// The finalized record.
        record_id: Uuid,
    },

    /// A recompute was requested but the current record is still a draft.
    #[error("Payroll record {record_id} is not finalized; compute it again instead")]
    PayrollNotFinalized {
        /// The draft record.
        record_id: Uuid,
    },

    /// No payroll exists for the period.
    #[error("No payroll for employee {employee_id} in {year}-{month:02}")]
    NoPayrollForPeriod {
        /// The employee.
        employee_id: i64,
        /// Period year.
        year: i32,
        /// Period month.
        month: u32,
    },

    /// No payroll record exists with the given id.
    #[error("Payroll record not found: {record_id}")]
    PayrollRecordNotFound {
        /// The id that was looked up.
        record_id: Uuid,
    },

    /// The record has been replaced by a newer version.
    #[error("Payroll record {record_id} was superseded by {current_record_id}")]
    PayrollSuperseded {
        /// The stale record.
        record_id: Uuid,
        /// The current version.
        current_record_id: Uuid,
    },

    /// Another payroll computation holds the (employee, period) key.
    #[error("Payroll run already in progress for employee {employee_id} in {year}-{month:02}")]
    PayrollRunInProgress {
        /// The employee.
        employee_id: i64,
        /// Period year.
        year: i32,
        /// Period month.
        month: u32,
    },

    /// The requested period does not exist.
    #[error("Invalid pay period {year}-{month}")]
    InvalidPeriod {
        /// Period year.
        year: i32,
        /// Period month.
        month: u32,
    },
}

impl EngineError {
    /// Returns the broad kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfiguration { .. }
            | EngineError::ConfigurationMissing { .. } => ErrorKind::Configuration,

            EngineError::DuplicateCheckIn { .. }
            | EngineError::FutureTimestamp { .. }
            | EngineError::InvalidLocation { .. }
            | EngineError::InvalidRange { .. }
            | EngineError::MissingReason { .. }
            | EngineError::OverlappingLeave { .. }
            | EngineError::InvalidAdjustment { .. }
            | EngineError::InvalidPeriod { .. } => ErrorKind::Validation,

            EngineError::NoCheckInFound { .. }
            | EngineError::AttendanceClosed { .. }
            | EngineError::LeaveRequestNotFound { .. }
            | EngineError::IllegalTransition { .. }
            | EngineError::ConcurrentModification { .. }
            | EngineError::LeaveQuotaExceeded { .. }
            | EngineError::EmployeeNotFound { .. }
            | EngineError::NoActiveContract { .. }
            | EngineError::NegativeWorkedDays { .. }
            | EngineError::PayrollFinalized { .. }
            | EngineError::PayrollNotFinalized { .. }
            | EngineError::NoPayrollForPeriod { .. }
            | EngineError::PayrollRecordNotFound { .. }
            | EngineError::PayrollSuperseded { .. }
            | EngineError::PayrollRunInProgress { .. } => ErrorKind::State,
        }
    }

    /// Returns true when re-reading state and retrying may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ConcurrentModification { .. } | EngineError::PayrollRunInProgress { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
