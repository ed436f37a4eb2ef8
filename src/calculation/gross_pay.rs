//! Gross pay calculation.
//!
//! All amounts here are exact; rounding happens once, on the record's output
//! fields. Every operation is checked, so inputs too large for `Decimal`
//! produce `InvalidAdjustment` instead of a panic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayrollPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

/// Inputs to the gross pay calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossPayInputs {
    /// Monthly base salary.
    pub base_salary: Decimal,
    /// Fixed monthly allowance.
    pub allowance: Decimal,
    /// One-off bonus.
    pub bonus: Decimal,
    /// Approved overtime hours.
    pub overtime_hours: Decimal,
    /// Standard working days in the period (positive).
    pub standard_days: i64,
    /// Worked days in the period; half shifts contribute fractions.
    pub worked_days: Decimal,
}

/// The result of calculating gross pay, including the audit step.
///
/// # Example
///
/// ```
/// use hr_engine::calculation::GrossPayResult;
/// use hr_engine::models::AuditStep;
/// use rust_decimal::Decimal;
///
/// let result = GrossPayResult {
///     prorated_base: Decimal::new(15_000_000, 0),
///     hourly_rate: Decimal::new(72_115, 0),
///     overtime_pay: Decimal::ZERO,
///     gross_pay: Decimal::new(15_000_000, 0),
///     audit_step: AuditStep {
///         step_number: 3,
///         rule_id: "gross_pay".to_string(),
///         rule_name: "Gross Pay".to_string(),
///         basis: "contract and payroll policy".to_string(),
///         input: serde_json::json!({}),
///         output: serde_json::json!({}),
///         reasoning: "full month".to_string(),
///     },
/// };
/// let json = serde_json::to_value(&result).unwrap();
/// assert_eq!(json["gross_pay"], "15000000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossPayResult {
    /// `base / standard_days × worked_days`.
    pub prorated_base: Decimal,
    /// `base / (standard_days × standard_hours_per_day)`.
    pub hourly_rate: Decimal,
    /// `overtime_hours × hourly_rate × overtime_multiplier`.
    pub overtime_pay: Decimal,
    /// Prorated base plus allowance, bonus and overtime pay.
    pub gross_pay: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

fn overflow(field: &str, value: Decimal) -> EngineError {
    EngineError::InvalidAdjustment {
        field: field.to_string(),
        value,
    }
}

/// Calculates unrounded gross pay.
///
/// # Arguments
///
/// * `inputs` - Contract amounts, adjustments and the period's day counts
/// * `policy` - Supplies the standard hours per day and overtime multiplier
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns `InvalidAdjustment` naming the input that pushed an intermediate
/// amount past the range of `Decimal`.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::{GrossPayInputs, calculate_gross_pay};
/// use hr_engine::config::PayrollPolicy;
/// use rust_decimal::Decimal;
///
/// let policy = PayrollPolicy {
///     standard_hours_per_day: Decimal::new(8, 0),
///     overtime_multiplier: Decimal::new(15, 1),
///     currency_minor_units: 0,
///     insurance_base_includes_overtime: false,
///     paid_leave_categories: vec![],
///     annual_leave_quota_days: 12,
/// };
/// let inputs = GrossPayInputs {
///     base_salary: Decimal::new(15_000_000, 0),
///     allowance: Decimal::new(1_000_000, 0),
///     bonus: Decimal::ZERO,
///     overtime_hours: Decimal::ZERO,
///     standard_days: 26,
///     worked_days: Decimal::new(24, 0),
/// };
/// let result = calculate_gross_pay(&inputs, &policy, 1).unwrap();
/// assert_eq!(result.gross_pay.round(), Decimal::new(14_846_154, 0));
/// ```
pub fn calculate_gross_pay(
    inputs: &GrossPayInputs,
    policy: &PayrollPolicy,
    step_number: u32,
) -> EngineResult<GrossPayResult> {
    let standard_days = Decimal::from(inputs.standard_days);
    let base_error = || overflow("base_salary", inputs.base_salary);

    let prorated_base = inputs
        .base_salary
        .checked_div(standard_days)
        .and_then(|daily| daily.checked_mul(inputs.worked_days))
        .ok_or_else(base_error)?;
    let hourly_rate = standard_days
        .checked_mul(policy.standard_hours_per_day)
        .and_then(|hours| inputs.base_salary.checked_div(hours))
        .ok_or_else(base_error)?;
    let overtime_pay = inputs
        .overtime_hours
        .checked_mul(hourly_rate)
        .and_then(|pay| pay.checked_mul(policy.overtime_multiplier))
        .ok_or_else(|| overflow("overtime_hours", inputs.overtime_hours))?;
    let gross_pay = prorated_base
        .checked_add(inputs.allowance)
        .ok_or_else(|| overflow("allowance", inputs.allowance))?
        .checked_add(inputs.bonus)
        .ok_or_else(|| overflow("bonus", inputs.bonus))?
        .checked_add(overtime_pay)
        .ok_or_else(|| overflow("overtime_hours", inputs.overtime_hours))?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        basis: "contract and payroll policy".to_string(),
        input: serde_json::json!({
            "base_salary": inputs.base_salary.normalize().to_string(),
            "standard_days": inputs.standard_days,
            "worked_days": inputs.worked_days.normalize().to_string(),
            "allowance": inputs.allowance.normalize().to_string(),
            "bonus": inputs.bonus.normalize().to_string(),
            "overtime_hours": inputs.overtime_hours.normalize().to_string(),
            "standard_hours_per_day": policy.standard_hours_per_day.normalize().to_string(),
            "overtime_multiplier": policy.overtime_multiplier.normalize().to_string()
        }),
        output: serde_json::json!({
            "prorated_base": prorated_base.to_string(),
            "hourly_rate": hourly_rate.to_string(),
            "overtime_pay": overtime_pay.to_string(),
            "gross_pay": gross_pay.to_string()
        }),
        reasoning: format!(
            "{} / {} × {} + {} allowance + {} bonus + {} overtime pay",
            inputs.base_salary.normalize(),
            inputs.standard_days,
            inputs.worked_days.normalize(),
            inputs.allowance.normalize(),
            inputs.bonus.normalize(),
            overtime_pay.round_dp(2).normalize()
        ),
    };

    Ok(GrossPayResult {
        prorated_base,
        hourly_rate,
        overtime_pay,
        gross_pay,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::create_test_config;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn inputs(overtime_hours: &str, bonus: &str) -> GrossPayInputs {
        GrossPayInputs {
            base_salary: dec("15000000"),
            allowance: dec("1000000"),
            bonus: dec(bonus),
            overtime_hours: dec(overtime_hours),
            standard_days: 26,
            worked_days: dec("24"),
        }
    }

    /// GP-001: proration scenario
    #[test]
    fn test_prorated_scenario() {
        let config = create_test_config();
        let result = calculate_gross_pay(&inputs("0", "0"), config.payroll(), 1).unwrap();

        assert_eq!(result.overtime_pay, Decimal::ZERO);
        assert_eq!(result.gross_pay.round_dp(2), dec("14846153.85"));
        assert_eq!(result.gross_pay.round(), dec("14846154"));
    }

    /// GP-002: overtime at 1.5x of the hourly rate
    #[test]
    fn test_overtime_pay() {
        let config = create_test_config();
        let mut inputs = inputs("10", "0");
        inputs.base_salary = dec("20800000");
        // 20,800,000 / (26 × 8) = 100,000 per hour
        let result = calculate_gross_pay(&inputs, config.payroll(), 1).unwrap();

        assert_eq!(result.hourly_rate, dec("100000"));
        assert_eq!(result.overtime_pay, dec("1500000"));
    }

    #[test]
    fn test_bonus_is_added() {
        let config = create_test_config();
        let without = calculate_gross_pay(&inputs("0", "0"), config.payroll(), 1).unwrap();
        let with = calculate_gross_pay(&inputs("0", "500000"), config.payroll(), 1).unwrap();
        assert_eq!(with.gross_pay - without.gross_pay, dec("500000"));
    }

    #[test]
    fn test_full_attendance_pays_full_base() {
        let config = create_test_config();
        let mut inputs = inputs("0", "0");
        inputs.worked_days = dec("26");
        inputs.allowance = Decimal::ZERO;
        let result = calculate_gross_pay(&inputs, config.payroll(), 1).unwrap();
        assert_eq!(result.gross_pay.round_dp(6), dec("15000000"));
    }

    #[test]
    fn test_half_day_is_prorated() {
        let config = create_test_config();
        let mut inputs = inputs("0", "0");
        inputs.base_salary = dec("26000000");
        inputs.allowance = Decimal::ZERO;
        inputs.worked_days = dec("0.5");
        let result = calculate_gross_pay(&inputs, config.payroll(), 1).unwrap();
        assert_eq!(result.prorated_base, dec("500000"));
    }

    /// GP-003: amounts beyond the range of Decimal are errors, not panics
    #[test]
    fn test_overflow_is_invalid_adjustment() {
        let config = create_test_config();

        let mut huge_overtime = inputs("0", "0");
        huge_overtime.overtime_hours = Decimal::MAX;
        match calculate_gross_pay(&huge_overtime, config.payroll(), 1).unwrap_err() {
            EngineError::InvalidAdjustment { field, .. } => assert_eq!(field, "overtime_hours"),
            other => panic!("Expected InvalidAdjustment, got {:?}", other),
        }

        let huge_bonus = inputs("0", &Decimal::MAX.to_string());
        match calculate_gross_pay(&huge_bonus, config.payroll(), 1).unwrap_err() {
            EngineError::InvalidAdjustment { field, .. } => assert_eq!(field, "bonus"),
            other => panic!("Expected InvalidAdjustment, got {:?}", other),
        }

        let mut huge_base = inputs("0", "0");
        huge_base.base_salary = Decimal::MAX;
        huge_base.worked_days = dec("26");
        huge_base.allowance = Decimal::MAX;
        assert!(matches!(
            calculate_gross_pay(&huge_base, config.payroll(), 1),
            Err(EngineError::InvalidAdjustment { .. })
        ));
    }

    #[test]
    fn test_zero_worked_days_keeps_allowance() {
        let config = create_test_config();
        let mut inputs = inputs("0", "0");
        inputs.worked_days = Decimal::ZERO;
        let result = calculate_gross_pay(&inputs, config.payroll(), 1).unwrap();
        assert_eq!(result.gross_pay, dec("1000000"));
    }
}
