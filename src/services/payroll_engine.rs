//! Payroll computation.
//!
//! Pulls the contract, attendance and approved leave for one employee and
//! period, runs the payroll rules in order, and stores the result in the
//! versioned ledger. Intermediate amounts stay exact; only the record's output
//! fields are rounded.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{
    GrossPayInputs, calculate_gross_pay, calculate_income_tax, calculate_statutory_insurance,
    calculate_working_days, resolve_contract, round_to_minor_units,
};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::directory::EmployeeDirectory;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, Correction, Employee, PayPeriod, PayrollAdjustments, PayrollAmounts,
    PayrollInputs, PayrollRecord, PayrollStatus,
};
use crate::store::PayrollLedger;

use super::{AttendanceValidator, LeaveWorkflow};

/// Computes, stores and finalizes payroll records.
pub struct PayrollEngine {
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn EmployeeDirectory>,
    attendance: Arc<AttendanceValidator>,
    leave: Arc<LeaveWorkflow>,
    ledger: PayrollLedger,
}

impl std::fmt::Debug for PayrollEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayrollEngine").field("ledger", &self.ledger).finish_non_exhaustive()
    }
}

impl PayrollEngine {
    /// Creates an engine with an empty ledger.
    pub fn new(
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
        directory: Arc<dyn EmployeeDirectory>,
        attendance: Arc<AttendanceValidator>,
        leave: Arc<LeaveWorkflow>,
    ) -> Self {
        Self {
            config,
            clock,
            directory,
            attendance,
            leave,
            ledger: PayrollLedger::new(),
        }
    }

    /// Computes the payroll for one employee and month and stores it as a draft.
    ///
    /// Recomputing with the same inputs yields the same amounts; an existing
    /// draft for the period is replaced.
    ///
    /// # Errors
    ///
    /// * `InvalidPeriod`, `InvalidAdjustment` for bad arguments
    /// * `PayrollRunInProgress` while another run holds the period
    /// * `PayrollFinalized` when the period is already finalized
    /// * `EmployeeNotFound`, `NoActiveContract`, `ConfigurationMissing`
    pub fn compute_payroll(
        &self,
        employee_id: i64,
        year: i32,
        month: u32,
        adjustments: &PayrollAdjustments,
    ) -> EngineResult<PayrollRecord> {
        let period = PayPeriod::new(year, month)?;
        adjustments.validate()?;
        let _guard = self.ledger.begin_run(employee_id, period)?;

        if let Some(current) = self.ledger.current(employee_id, period) {
            if current.is_finalized() {
                warn!(employee_id, period = %period, "Payroll already finalized");
                return Err(EngineError::PayrollFinalized { record_id: current.id });
            }
        }

        let record = self
            .directory
            .employee(employee_id)
            .and_then(|employee| self.calculate(&employee, period, adjustments))
            .inspect_err(|e| warn!(employee_id, period = %period, error = %e, "Payroll computation failed"))?;
        let record = self.ledger.store_draft(record)?;

        info!(
            employee_id,
            period = %period,
            record_id = %record.id,
            version = record.version,
            net_pay = %record.amounts.net_pay,
            "Payroll draft stored"
        );
        Ok(record)
    }

    /// Recomputes a finalized period as an authorised correction.
    ///
    /// Appends version n+1 pointing at the finalized record it supersedes.
    /// Fails with `MissingReason` for a blank reason, `NoPayrollForPeriod`
    /// when nothing was computed, and `PayrollNotFinalized` when the current
    /// record is still a draft (use [`compute_payroll`](Self::compute_payroll)).
    pub fn recompute_payroll(
        &self,
        employee_id: i64,
        year: i32,
        month: u32,
        adjustments: &PayrollAdjustments,
        authorized_by: i64,
        reason: &str,
    ) -> EngineResult<PayrollRecord> {
        let period = PayPeriod::new(year, month)?;
        adjustments.validate()?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EngineError::MissingReason {
                action: "payroll correction".to_string(),
            });
        }
        let _guard = self.ledger.begin_run(employee_id, period)?;

        let current = self
            .ledger
            .current(employee_id, period)
            .ok_or(EngineError::NoPayrollForPeriod {
                employee_id,
                year,
                month,
            })?;
        if !current.is_finalized() {
            return Err(EngineError::PayrollNotFinalized { record_id: current.id });
        }

        let employee = self.directory.employee(employee_id)?;
        let mut record = self.calculate(&employee, period, adjustments)?;
        record.correction = Some(Correction {
            supersedes: current.id,
            authorized_by,
            reason: reason.to_string(),
        });
        let record = self.ledger.append_correction(record)?;

        info!(
            employee_id,
            period = %period,
            record_id = %record.id,
            supersedes = %current.id,
            version = record.version,
            authorized_by,
            "Payroll correction stored"
        );
        Ok(record)
    }

    /// Marks a record finalized. Idempotent for the current record.
    pub fn finalize_payroll(&self, record_id: Uuid) -> EngineResult<PayrollRecord> {
        let record = self.ledger.get(record_id)?;
        let _guard = self.ledger.begin_run(record.employee_id, record.period)?;
        let record = self.ledger.finalize(record_id, self.clock.now())?;

        info!(
            employee_id = record.employee_id,
            period = %record.period,
            record_id = %record.id,
            "Payroll finalized"
        );
        Ok(record)
    }

    /// Returns the record with the given id.
    pub fn payroll_record(&self, record_id: Uuid) -> EngineResult<PayrollRecord> {
        self.ledger.get(record_id)
    }

    /// Returns the current record for the period.
    pub fn current_payroll(&self, employee_id: i64, year: i32, month: u32) -> EngineResult<PayrollRecord> {
        let period = PayPeriod::new(year, month)?;
        self.ledger
            .current(employee_id, period)
            .ok_or(EngineError::NoPayrollForPeriod {
                employee_id,
                year,
                month,
            })
    }

    /// Returns every version for the period, oldest first.
    pub fn payroll_history(&self, employee_id: i64, year: i32, month: u32) -> EngineResult<Vec<PayrollRecord>> {
        let period = PayPeriod::new(year, month)?;
        Ok(self.ledger.history(employee_id, period))
    }

    fn calculate(
        &self,
        employee: &Employee,
        period: PayPeriod,
        adjustments: &PayrollAdjustments,
    ) -> EngineResult<PayrollRecord> {
        let policy = self.config.payroll();
        let mut trace = AuditTrace::default();

        // Step 1: contract
        let contract = resolve_contract(employee, &period, trace.next_step_number())?;
        trace.push(contract.audit_step);
        let contract = contract.contract;

        // Step 2: statutory table
        let table = self.config.statutory_for(period.start_date())?;

        // Step 3: working days
        let attendance = self
            .attendance
            .records_in_range(employee.id, period.start_date(), period.end_date());
        let leave_dates = self
            .leave
            .approved_leave_dates(employee.id, period.start_date(), period.end_date(), true);
        let days = calculate_working_days(
            employee.id,
            &period,
            self.config.calendar(),
            &attendance,
            &leave_dates,
            trace.next_step_number(),
        )?;
        trace.push(days.audit_step);
        trace.warnings.extend(days.warnings);

        // Step 4: gross pay
        let gross = calculate_gross_pay(
            &GrossPayInputs {
                base_salary: contract.base_salary,
                allowance: contract.allowance,
                bonus: adjustments.bonus,
                overtime_hours: adjustments.overtime_hours,
                standard_days: days.standard_days,
                worked_days: days.worked_days,
            },
            policy,
            trace.next_step_number(),
        )?;
        trace.push(gross.audit_step);

        // Step 5: insurance
        let insurance_base = if policy.insurance_base_includes_overtime {
            gross.gross_pay
        } else {
            gross.gross_pay - gross.overtime_pay
        };
        let insurance = calculate_statutory_insurance(insurance_base, table, trace.next_step_number())?;
        trace.push(insurance.audit_step);

        // Step 6: tax
        let tax = calculate_income_tax(
            gross.gross_pay,
            insurance.total,
            employee.dependents,
            table,
            trace.next_step_number(),
        )?;
        trace.push(tax.audit_step);

        // Step 7: rounding
        let round = |value: Decimal| round_to_minor_units(value, policy.currency_minor_units);
        let exact_deductions = insurance
            .total
            .checked_add(tax.tax)
            .ok_or_else(|| EngineError::InvalidAdjustment {
                field: "gross_pay".to_string(),
                value: gross.gross_pay,
            })?;
        let amounts = PayrollAmounts {
            prorated_base: round(gross.prorated_base),
            overtime_pay: round(gross.overtime_pay),
            gross_pay: round(gross.gross_pay),
            social_insurance: round(insurance.social),
            health_insurance: round(insurance.health),
            unemployment_insurance: round(insurance.unemployment),
            statutory_deductions: round(insurance.total),
            taxable_income: round(tax.taxable_income),
            income_tax: round(tax.tax),
            total_deductions: round(exact_deductions),
            net_pay: round(gross.gross_pay - exact_deductions),
        };
        trace.push(rounding_step(&amounts, policy.currency_minor_units, trace.next_step_number()));

        debug!(
            employee_id = employee.id,
            period = %period,
            worked_days = %days.worked_days,
            gross_pay = %amounts.gross_pay,
            net_pay = %amounts.net_pay,
            warnings = trace.warnings.len(),
            "Payroll calculated"
        );

        Ok(PayrollRecord {
            id: Uuid::new_v4(),
            employee_id: employee.id,
            period,
            version: 0,
            status: PayrollStatus::Draft,
            inputs: PayrollInputs {
                contract_id: contract.id,
                base_salary: contract.base_salary,
                allowance: contract.allowance,
                bonus: adjustments.bonus,
                overtime_hours: adjustments.overtime_hours,
                standard_working_days: days.standard_days,
                attended_days: days.attended_days,
                paid_leave_days: days.paid_leave_days,
                worked_days: days.worked_days,
                dependents: employee.dependents,
                statutory_effective_date: table.effective_date,
            },
            amounts,
            correction: None,
            computed_at: self.clock.now(),
            finalized_at: None,
            audit_trace: trace,
        })
    }
}

fn rounding_step(amounts: &PayrollAmounts, minor_units: u32, step_number: u32) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "rounding".to_string(),
        rule_name: "Output Rounding".to_string(),
        basis: "payroll policy".to_string(),
        input: serde_json::json!({
            "currency_minor_units": minor_units,
            "strategy": "half_away_from_zero"
        }),
        output: serde_json::json!({
            "gross_pay": amounts.gross_pay.to_string(),
            "statutory_deductions": amounts.statutory_deductions.to_string(),
            "income_tax": amounts.income_tax.to_string(),
            "total_deductions": amounts.total_deductions.to_string(),
            "net_pay": amounts.net_pay.to_string()
        }),
        reasoning: format!(
            "Net pay taken from exact gross minus exact deductions, then rounded to {} decimal places",
            minor_units
        ),
    }
}
