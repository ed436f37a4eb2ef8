//! Configuration types for the HR compliance engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use chrono::{FixedOffset, NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::models::{GeoPoint, LeaveCategory};

/// The workplace employees check in at.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkplaceConfig {
    /// Display name of the workplace.
    pub name: String,
    /// The employer anchor point distances are measured from.
    pub anchor: GeoPoint,
    /// Offset of the workplace's local time from UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// Radius beyond which a check-in is flagged, in metres.
    pub geofence_radius_m: f64,
    /// Expected shift start in local time.
    pub expected_start: NaiveTime,
    /// Minutes of lateness still counted as on time.
    pub grace_minutes: i64,
    /// Minutes of lateness above which a reason is required.
    pub escalation_minutes: i64,
}

impl WorkplaceConfig {
    /// The workplace's fixed UTC offset.
    pub fn offset(&self) -> EngineResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            EngineError::InvalidConfiguration {
                message: format!("utc_offset_minutes {} is out of range", self.utc_offset_minutes),
            }
        })
    }
}

/// Payroll policy settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PayrollPolicy {
    /// Standard working hours per day, used for the hourly rate.
    pub standard_hours_per_day: Decimal,
    /// Multiplier applied to the hourly rate for overtime.
    pub overtime_multiplier: Decimal,
    /// Decimal places of the currency's smallest unit (0 for VND).
    pub currency_minor_units: u32,
    /// Whether overtime pay is part of the insurance base.
    #[serde(default)]
    pub insurance_base_includes_overtime: bool,
    /// Leave categories that count as worked days.
    pub paid_leave_categories: Vec<LeaveCategory>,
    /// Annual leave days available per calendar year.
    pub annual_leave_quota_days: i64,
}

/// An explicit standard-working-day count for one month.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodOverride {
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: u32,
    /// Standard working days for that month.
    pub working_days: i64,
}

/// The working calendar standard days are derived from.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkCalendar {
    /// Weekdays that are normally worked.
    pub working_weekdays: Vec<Weekday>,
    /// Non-working public holidays.
    #[serde(default)]
    pub public_holidays: Vec<NaiveDate>,
    /// Per-month overrides that replace the derived count.
    #[serde(default)]
    pub overrides: Vec<PeriodOverride>,
}

/// Rate and contribution cap for one insurance category.
#[derive(Debug, Clone, Deserialize)]
pub struct InsuranceRate {
    /// Employee contribution rate, as a fraction.
    pub rate: Decimal,
    /// Highest base the rate is applied to.
    pub base_cap: Decimal,
}

/// The three statutory insurance categories.
#[derive(Debug, Clone, Deserialize)]
pub struct InsuranceRates {
    /// Social insurance.
    pub social: InsuranceRate,
    /// Health insurance.
    pub health: InsuranceRate,
    /// Unemployment insurance.
    pub unemployment: InsuranceRate,
}

/// A bracket of the progressive income tax table.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxBracket {
    /// Upper bound of taxable income for the bracket; `None` for the top bracket.
    pub upper_bound: Option<Decimal>,
    /// Marginal rate, as a fraction.
    pub rate: Decimal,
}

/// Statutory rates effective from a given date.
#[derive(Debug, Clone, Deserialize)]
pub struct StatutoryTable {
    /// First date the table applies to.
    pub effective_date: NaiveDate,
    /// Insurance rates and caps.
    pub insurance: InsuranceRates,
    /// Monthly personal allowance deducted before tax.
    pub personal_allowance: Decimal,
    /// Monthly allowance per registered dependent.
    pub dependent_allowance: Decimal,
    /// Progressive tax brackets, lowest first.
    pub tax_brackets: Vec<TaxBracket>,
}

/// The complete engine configuration loaded from YAML files.
///
/// This struct aggregates all configuration loaded from the various
/// YAML files in a configuration directory.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    workplace: WorkplaceConfig,
    payroll: PayrollPolicy,
    calendar: WorkCalendar,
    /// Statutory tables by effective date (sorted oldest first).
    statutory: Vec<StatutoryTable>,
}

fn invalid(message: String) -> EngineError {
    EngineError::InvalidConfiguration { message }
}

fn check_fraction(name: &str, value: Decimal) -> EngineResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(invalid(format!("{} must be between 0 and 1, got {}", name, value)));
    }
    Ok(())
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(
        workplace: WorkplaceConfig,
        payroll: PayrollPolicy,
        calendar: WorkCalendar,
        statutory: Vec<StatutoryTable>,
    ) -> Self {
        let mut sorted = statutory;
        sorted.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        Self {
            workplace,
            payroll,
            calendar,
            statutory: sorted,
        }
    }

    /// Returns the workplace configuration.
    pub fn workplace(&self) -> &WorkplaceConfig {
        &self.workplace
    }

    /// Returns the payroll policy.
    pub fn payroll(&self) -> &PayrollPolicy {
        &self.payroll
    }

    /// Returns the working calendar.
    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    /// Returns all statutory tables.
    pub fn statutory_tables(&self) -> &[StatutoryTable] {
        &self.statutory
    }

    /// Returns the statutory table in force on `date`.
    ///
    /// Fails with `ConfigurationMissing` when no table is effective yet.
    pub fn statutory_for(&self, date: NaiveDate) -> EngineResult<&StatutoryTable> {
        self.statutory
            .iter()
            .rfind(|t| t.effective_date <= date)
            .ok_or_else(|| EngineError::ConfigurationMissing {
                what: "statutory table".to_string(),
                date,
            })
    }

    /// Checks the semantic constraints serde cannot express.
    pub fn validate(&self) -> EngineResult<()> {
        let workplace = &self.workplace;
        workplace.offset()?;
        if workplace.anchor.validate().is_err() {
            return Err(invalid(format!(
                "anchor ({}, {}) is not a valid coordinate",
                workplace.anchor.latitude, workplace.anchor.longitude
            )));
        }
        if workplace.geofence_radius_m.is_nan() || workplace.geofence_radius_m < 0.0 {
            return Err(invalid("geofence_radius_m must be non-negative".to_string()));
        }
        if workplace.grace_minutes < 0 || workplace.escalation_minutes < workplace.grace_minutes {
            return Err(invalid(format!(
                "expected 0 <= grace_minutes ({}) <= escalation_minutes ({})",
                workplace.grace_minutes, workplace.escalation_minutes
            )));
        }

        let payroll = &self.payroll;
        if payroll.standard_hours_per_day <= Decimal::ZERO {
            return Err(invalid("standard_hours_per_day must be positive".to_string()));
        }
        if payroll.overtime_multiplier < Decimal::ONE {
            return Err(invalid(format!(
                "overtime_multiplier must be at least 1, got {}",
                payroll.overtime_multiplier
            )));
        }
        if payroll.annual_leave_quota_days < 0 {
            return Err(invalid("annual_leave_quota_days must be non-negative".to_string()));
        }

        if self.calendar.working_weekdays.is_empty() {
            return Err(invalid("working_weekdays must not be empty".to_string()));
        }
        for o in &self.calendar.overrides {
            if o.working_days <= 0 {
                return Err(invalid(format!(
                    "override for {}-{:02} must have positive working_days",
                    o.year, o.month
                )));
            }
        }

        for table in &self.statutory {
            Self::validate_statutory(table)?;
        }
        Ok(())
    }

    fn validate_statutory(table: &StatutoryTable) -> EngineResult<()> {
        let date = table.effective_date;
        let insurance = &table.insurance;
        for (name, category) in [
            ("social", &insurance.social),
            ("health", &insurance.health),
            ("unemployment", &insurance.unemployment),
        ] {
            check_fraction(&format!("{} insurance rate ({})", name, date), category.rate)?;
            if category.base_cap <= Decimal::ZERO {
                return Err(invalid(format!("{} insurance base_cap ({}) must be positive", name, date)));
            }
        }

        let brackets = &table.tax_brackets;
        if brackets.is_empty() {
            return Err(invalid(format!("tax_brackets ({}) must not be empty", date)));
        }
        let mut previous = Decimal::ZERO;
        for (i, bracket) in brackets.iter().enumerate() {
            check_fraction(&format!("tax bracket {} rate ({})", i + 1, date), bracket.rate)?;
            match bracket.upper_bound {
                Some(bound) if bound <= previous => {
                    return Err(invalid(format!(
                        "tax bracket upper bounds ({}) must be strictly increasing",
                        date
                    )));
                }
                Some(bound) => previous = bound,
                None if i + 1 != brackets.len() => {
                    return Err(invalid(format!(
                        "only the last tax bracket ({}) may be unbounded",
                        date
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }
}
