//! Personal income tax calculation.
//!
//! Taxable income is gross pay less statutory insurance, the personal
//! allowance and the per-dependent allowance, floored at zero. Tax is the
//! marginal sum over the bracket table:
//!
//! ```text
//! tax = Σ min(remaining, upper_bound − lower_bound) × rate
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{StatutoryTable, TaxBracket};
use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

/// The result of calculating income tax, including the audit step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxResult {
    /// Income the brackets were applied to.
    pub taxable_income: Decimal,
    /// Personal income tax.
    pub tax: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Applies a progressive bracket table to `taxable`.
///
/// Brackets must be ordered by ascending upper bound with only the last one
/// unbounded. Income above a bounded last bracket is taxed at that bracket's
/// rate.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::progressive_tax;
/// use hr_engine::config::TaxBracket;
/// use rust_decimal::Decimal;
///
/// let brackets = vec![
///     TaxBracket { upper_bound: Some(Decimal::new(5_000_000, 0)), rate: Decimal::new(5, 2) },
///     TaxBracket { upper_bound: None, rate: Decimal::new(10, 2) },
/// ];
/// // 5,000,000 × 5% + 1,000,000 × 10%
/// assert_eq!(progressive_tax(Decimal::new(6_000_000, 0), &brackets), Decimal::new(350_000, 0));
/// ```
pub fn progressive_tax(taxable: Decimal, brackets: &[TaxBracket]) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut lower = Decimal::ZERO;
    let mut last_rate = Decimal::ZERO;

    for bracket in brackets {
        if taxable <= lower {
            return tax;
        }
        last_rate = bracket.rate;
        match bracket.upper_bound {
            Some(upper) => {
                tax += (taxable.min(upper) - lower) * bracket.rate;
                lower = upper;
            }
            None => return tax + (taxable - lower) * bracket.rate,
        }
    }

    if taxable > lower {
        tax += (taxable - lower) * last_rate;
    }
    tax
}

/// Calculates taxable income and personal income tax.
///
/// # Arguments
///
/// * `gross_pay` - Exact gross pay for the period
/// * `statutory_deductions` - Exact total of the three insurance deductions
/// * `dependents` - Registered dependents, each earning the dependent allowance
/// * `table` - The statutory table in force for the period
/// * `step_number` - The step number for audit trail sequencing
///
/// Returns `ConfigurationMissing` when the table has no brackets.
pub fn calculate_income_tax(
    gross_pay: Decimal,
    statutory_deductions: Decimal,
    dependents: u32,
    table: &StatutoryTable,
    step_number: u32,
) -> EngineResult<IncomeTaxResult> {
    if table.tax_brackets.is_empty() {
        return Err(EngineError::ConfigurationMissing {
            what: "tax bracket table".to_string(),
            date: table.effective_date,
        });
    }

    let dependent_allowance = table.dependent_allowance * Decimal::from(dependents);
    let taxable_income = (gross_pay - statutory_deductions - table.personal_allowance - dependent_allowance)
        .max(Decimal::ZERO);
    let tax = progressive_tax(taxable_income, &table.tax_brackets);

    let audit_step = AuditStep {
        step_number,
        rule_id: "income_tax".to_string(),
        rule_name: "Personal Income Tax".to_string(),
        basis: format!("statutory table effective {}", table.effective_date),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "statutory_deductions": statutory_deductions.to_string(),
            "personal_allowance": table.personal_allowance.normalize().to_string(),
            "dependents": dependents,
            "dependent_allowance": dependent_allowance.normalize().to_string(),
            "brackets": table.tax_brackets.len()
        }),
        output: serde_json::json!({
            "taxable_income": taxable_income.to_string(),
            "tax": tax.to_string()
        }),
        reasoning: if taxable_income.is_zero() {
            "Income is covered by insurance and allowances; no tax due".to_string()
        } else {
            format!(
                "Progressive brackets applied to taxable income {}",
                taxable_income.round_dp(2).normalize()
            )
        },
    };

    Ok(IncomeTaxResult {
        taxable_income,
        tax,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::create_test_config;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn table() -> StatutoryTable {
        create_test_config().statutory_tables()[0].clone()
    }

    /// IT-001: income inside the first bracket
    #[test]
    fn test_first_bracket_only() {
        assert_eq!(progressive_tax(dec("4000000"), &table().tax_brackets), dec("200000"));
    }

    /// IT-002: income spanning three brackets
    #[test]
    fn test_spans_brackets() {
        // 5M × 5% + 5M × 10% + 2M × 15%
        assert_eq!(progressive_tax(dec("12000000"), &table().tax_brackets), dec("1050000"));
    }

    /// IT-003: top bracket is unbounded
    #[test]
    fn test_top_bracket() {
        // 250k + 500k + 1.2M + 2.8M + 5M + 8.4M + 20M × 35%
        assert_eq!(
            progressive_tax(dec("100000000"), &table().tax_brackets),
            dec("25150000")
        );
    }

    #[test]
    fn test_bounded_last_bracket_extends() {
        let brackets = vec![TaxBracket {
            upper_bound: Some(dec("1000")),
            rate: dec("0.1"),
        }];
        assert_eq!(progressive_tax(dec("3000"), &brackets), dec("300"));
    }

    #[test]
    fn test_zero_income_zero_tax() {
        assert_eq!(progressive_tax(Decimal::ZERO, &table().tax_brackets), Decimal::ZERO);
    }

    #[test]
    fn test_allowances_reduce_taxable_income() {
        let result = calculate_income_tax(dec("30000000"), dec("3150000"), 1, &table(), 4).unwrap();
        // 30M − 3.15M − 11M − 4.4M
        assert_eq!(result.taxable_income, dec("11450000"));
        // 250k + 500k + 1.45M × 15%
        assert_eq!(result.tax, dec("967500"));
    }

    #[test]
    fn test_taxable_income_floors_at_zero() {
        let result = calculate_income_tax(dec("14846153.85"), dec("1575000"), 2, &table(), 4).unwrap();
        assert_eq!(result.taxable_income, Decimal::ZERO);
        assert_eq!(result.tax, Decimal::ZERO);
    }

    #[test]
    fn test_result_is_deterministic_and_serializable() {
        let first = calculate_income_tax(dec("20000000"), dec("2100000"), 1, &table(), 5).unwrap();
        let second = calculate_income_tax(dec("20000000"), dec("2100000"), 1, &table(), 5).unwrap();
        assert_eq!(first, second);

        let json = serde_json::to_value(&first).unwrap();
        assert_eq!(json["taxable_income"], "2500000");
        assert_eq!(json["audit_step"]["rule_id"], "income_tax");
        let back: IncomeTaxResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, first);
    }

    #[test]
    fn test_missing_brackets_is_configuration_missing() {
        let mut table = table();
        table.tax_brackets.clear();
        let err = calculate_income_tax(dec("30000000"), Decimal::ZERO, 0, &table, 4).unwrap_err();
        match err {
            EngineError::ConfigurationMissing { what, .. } => assert_eq!(what, "tax bracket table"),
            other => panic!("Expected ConfigurationMissing, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_tax_is_monotonic_and_bounded(a in 0i64..500_000_000, b in 0i64..500_000_000) {
            let brackets = table().tax_brackets;
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let low_tax = progressive_tax(Decimal::from(low), &brackets);
            let high_tax = progressive_tax(Decimal::from(high), &brackets);

            prop_assert!(low_tax <= high_tax);
            prop_assert!(high_tax <= Decimal::from(high));
            prop_assert!(low_tax >= Decimal::ZERO);
        }
    }
}
