//! Payroll record models.
//!
//! A [`PayrollRecord`] snapshots the inputs a computation used next to the
//! amounts it produced. Records live in a versioned ledger: at most one is
//! current per employee and period, and finalized records are never edited.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuditTrace, PayPeriod};
use crate::error::{EngineError, EngineResult};

/// Most overtime hours accepted for one period: every hour of a 31-day month.
pub const MAX_OVERTIME_HOURS: i64 = 31 * 24;

/// Largest bonus accepted for one period, in currency units.
pub const MAX_BONUS: i64 = 1_000_000_000_000_000;

/// Per-run figures supplied by the caller on top of the contract.
///
/// # Example
///
/// ```
/// use hr_engine::models::PayrollAdjustments;
/// use rust_decimal::Decimal;
///
/// let adjustments = PayrollAdjustments {
///     overtime_hours: Decimal::new(4, 0),
///     ..Default::default()
/// };
/// assert!(adjustments.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollAdjustments {
    /// Approved overtime hours in the period.
    #[serde(default)]
    pub overtime_hours: Decimal,
    /// One-off bonus paid with the period.
    #[serde(default)]
    pub bonus: Decimal,
}

impl PayrollAdjustments {
    /// Rejects negative values, more than [`MAX_OVERTIME_HOURS`] hours and a
    /// bonus above [`MAX_BONUS`] with `InvalidAdjustment`.
    pub fn validate(&self) -> EngineResult<()> {
        let limits = [
            ("overtime_hours", self.overtime_hours, MAX_OVERTIME_HOURS),
            ("bonus", self.bonus, MAX_BONUS),
        ];
        for (field, value, max) in limits {
            let negative = value.is_sign_negative() && !value.is_zero();
            if negative || value > Decimal::from(max) {
                return Err(EngineError::InvalidAdjustment {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Inputs snapshotted at computation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollInputs {
    /// The contract the computation was based on.
    pub contract_id: Uuid,
    /// Monthly base salary from the contract.
    pub base_salary: Decimal,
    /// Fixed allowance from the contract.
    pub allowance: Decimal,
    /// Bonus from the adjustments.
    pub bonus: Decimal,
    /// Overtime hours from the adjustments.
    pub overtime_hours: Decimal,
    /// Standard working days in the period.
    pub standard_working_days: i64,
    /// Day credits from complete, non-anomalous attendance records.
    pub attended_days: Decimal,
    /// Dates covered by fully approved paid leave.
    pub paid_leave_days: i64,
    /// Attended and paid-leave days combined, capped at the standard days.
    pub worked_days: Decimal,
    /// Registered dependents.
    pub dependents: u32,
    /// Effective date of the statutory table that was applied.
    pub statutory_effective_date: NaiveDate,
}

/// Amounts produced by the computation, rounded to the currency minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollAmounts {
    /// Base salary prorated by worked days.
    pub prorated_base: Decimal,
    /// Overtime pay.
    pub overtime_pay: Decimal,
    /// Gross pay.
    pub gross_pay: Decimal,
    /// Social insurance deduction.
    pub social_insurance: Decimal,
    /// Health insurance deduction.
    pub health_insurance: Decimal,
    /// Unemployment insurance deduction.
    pub unemployment_insurance: Decimal,
    /// Sum of the three insurance deductions.
    pub statutory_deductions: Decimal,
    /// Income after insurance and allowances.
    pub taxable_income: Decimal,
    /// Personal income tax.
    pub income_tax: Decimal,
    /// Statutory deductions plus tax.
    pub total_deductions: Decimal,
    /// Gross pay minus total deductions.
    pub net_pay: Decimal,
}

/// Lifecycle of a payroll record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    /// May still be replaced by another computation.
    Draft,
    /// Immutable.
    Finalized,
}

/// Marks a record that supersedes a finalized one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// The finalized record being corrected.
    pub supersedes: Uuid,
    /// The user who authorised the correction.
    pub authorized_by: i64,
    /// Why the correction was made.
    pub reason: String,
}

/// A computed payroll for one employee and one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRecord {
    /// Unique identifier for this record.
    pub id: Uuid,
    /// The employee paid.
    pub employee_id: i64,
    /// The pay period.
    pub period: PayPeriod,
    /// Ledger version for the employee and period, starting at 1.
    pub version: u32,
    /// Draft or finalized.
    pub status: PayrollStatus,
    /// Snapshotted inputs.
    pub inputs: PayrollInputs,
    /// Computed amounts.
    pub amounts: PayrollAmounts,
    /// Present when this record corrects a finalized one.
    pub correction: Option<Correction>,
    /// When the computation ran.
    pub computed_at: DateTime<Utc>,
    /// When the record was finalized.
    pub finalized_at: Option<DateTime<Utc>>,
    /// Rules applied, in order.
    pub audit_trace: AuditTrace,
}

impl PayrollRecord {
    /// Returns true once the record is immutable.
    pub fn is_finalized(&self) -> bool {
        self.status == PayrollStatus::Finalized
    }
}
