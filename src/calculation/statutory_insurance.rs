//! Statutory insurance deductions.
//!
//! Each of the three categories is `min(insurance_base, base_cap) × rate`,
//! with the cap and rate taken from the statutory table in force.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{InsuranceRate, StatutoryTable};
use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

/// The result of calculating the insurance deductions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryInsuranceResult {
    /// Social insurance.
    pub social: Decimal,
    /// Health insurance.
    pub health: Decimal,
    /// Unemployment insurance.
    pub unemployment: Decimal,
    /// Sum of the three.
    pub total: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

fn contribution(base: Decimal, category: &InsuranceRate) -> Option<Decimal> {
    base.min(category.base_cap).checked_mul(category.rate)
}

/// Calculates the three insurance deductions on `insurance_base`.
///
/// A negative base is treated as zero.
///
/// # Arguments
///
/// * `insurance_base` - Gross pay, less overtime unless the policy includes it
/// * `table` - The statutory table in force for the period
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// Returns `InvalidAdjustment` on `insurance_base` if a contribution or the
/// total leaves the range of `Decimal`.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::calculate_statutory_insurance;
/// use hr_engine::config::{InsuranceRate, InsuranceRates, StatutoryTable};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let rate = |pct: i64, cap: i64| InsuranceRate {
///     rate: Decimal::new(pct, 3),
///     base_cap: Decimal::new(cap, 0),
/// };
/// let table = StatutoryTable {
///     effective_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
///     insurance: InsuranceRates {
///         social: rate(80, 46_800_000),
///         health: rate(15, 46_800_000),
///         unemployment: rate(10, 99_200_000),
///     },
///     personal_allowance: Decimal::new(11_000_000, 0),
///     dependent_allowance: Decimal::new(4_400_000, 0),
///     tax_brackets: vec![],
/// };
/// let result = calculate_statutory_insurance(Decimal::new(10_000_000, 0), &table, 1).unwrap();
/// assert_eq!(result.total, Decimal::new(1_050_000, 0));
/// ```
pub fn calculate_statutory_insurance(
    insurance_base: Decimal,
    table: &StatutoryTable,
    step_number: u32,
) -> EngineResult<StatutoryInsuranceResult> {
    let base = insurance_base.max(Decimal::ZERO);
    let rates = &table.insurance;
    let overflow = || EngineError::InvalidAdjustment {
        field: "insurance_base".to_string(),
        value: base,
    };

    let social = contribution(base, &rates.social).ok_or_else(overflow)?;
    let health = contribution(base, &rates.health).ok_or_else(overflow)?;
    let unemployment = contribution(base, &rates.unemployment).ok_or_else(overflow)?;
    let total = social
        .checked_add(health)
        .and_then(|sum| sum.checked_add(unemployment))
        .ok_or_else(overflow)?;

    let capped: Vec<&str> = [
        ("social", &rates.social),
        ("health", &rates.health),
        ("unemployment", &rates.unemployment),
    ]
    .into_iter()
    .filter(|(_, r)| base > r.base_cap)
    .map(|(name, _)| name)
    .collect();

    let reasoning = if capped.is_empty() {
        format!(
            "Base {} × ({} + {} + {})",
            base.round_dp(2).normalize(),
            rates.social.rate.normalize(),
            rates.health.rate.normalize(),
            rates.unemployment.rate.normalize()
        )
    } else {
        format!(
            "Base {} × category rates, capped for {}",
            base.round_dp(2).normalize(),
            capped.join(", ")
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "statutory_insurance".to_string(),
        rule_name: "Statutory Insurance".to_string(),
        basis: format!("statutory table effective {}", table.effective_date),
        input: serde_json::json!({
            "insurance_base": base.to_string(),
            "social": { "rate": rates.social.rate.normalize().to_string(), "base_cap": rates.social.base_cap.normalize().to_string() },
            "health": { "rate": rates.health.rate.normalize().to_string(), "base_cap": rates.health.base_cap.normalize().to_string() },
            "unemployment": { "rate": rates.unemployment.rate.normalize().to_string(), "base_cap": rates.unemployment.base_cap.normalize().to_string() }
        }),
        output: serde_json::json!({
            "social": social.to_string(),
            "health": health.to_string(),
            "unemployment": unemployment.to_string(),
            "total": total.to_string(),
            "capped": capped
        }),
        reasoning,
    };

    Ok(StatutoryInsuranceResult {
        social,
        health,
        unemployment,
        total,
        audit_step,
    })
}
