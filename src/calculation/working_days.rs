//! Standard and actual working-day counts for a pay period.
//!
//! Actual worked days are the union of attended dates and paid approved-leave
//! dates, so a day that has both an attendance record and approved leave is
//! counted once. An attended date earns its shift's day credit (a half shift
//! earns half a day); a paid leave date earns a full day. The union is capped
//! at the period's standard working days.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::WorkCalendar;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, AuditStep, AuditWarning, PayPeriod};

use super::worked_hours::compute_worked_hours;

/// The result of counting a period's working days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDaysResult {
    /// Standard working days in the period.
    pub standard_days: i64,
    /// Day credits from complete, non-anomalous attendance records.
    pub attended_days: Decimal,
    /// Paid leave dates that fall on working days.
    pub paid_leave_days: i64,
    /// The capped union of attended and paid leave days.
    pub worked_days: Decimal,
    /// Attendance records that were skipped, and capping notices.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Returns true if `date` is a configured working weekday and not a public holiday.
pub fn is_working_day(calendar: &WorkCalendar, date: NaiveDate) -> bool {
    calendar.working_weekdays.contains(&date.weekday()) && !calendar.public_holidays.contains(&date)
}

/// Standard working days for `period`.
///
/// A configured override for the month wins; otherwise the working weekdays
/// of the month are counted, minus public holidays.
///
/// # Examples
///
/// ```
/// use hr_engine::calculation::standard_working_days;
/// use hr_engine::config::WorkCalendar;
/// use hr_engine::models::PayPeriod;
/// use chrono::Weekday;
///
/// let calendar = WorkCalendar {
///     working_weekdays: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
///     public_holidays: vec![],
///     overrides: vec![],
/// };
/// // July 2024 starts on a Monday.
/// assert_eq!(standard_working_days(&calendar, &PayPeriod::new(2024, 7).unwrap()), 23);
/// ```
pub fn standard_working_days(calendar: &WorkCalendar, period: &PayPeriod) -> i64 {
    if let Some(o) = calendar
        .overrides
        .iter()
        .find(|o| o.year == period.year() && o.month == period.month())
    {
        return o.working_days;
    }
    period.dates().filter(|d| is_working_day(calendar, *d)).count() as i64
}

fn skipped(record: &AttendanceRecord, code: &str, what: &str) -> AuditWarning {
    AuditWarning {
        code: code.to_string(),
        message: format!("Attendance on {} not counted: {}", record.date, what),
        severity: "medium".to_string(),
    }
}

/// Counts standard and worked days for one employee and period.
///
/// `attendance` may contain records outside the period; they are ignored.
/// `paid_leave_dates` are the dates of fully approved paid leave.
///
/// # Errors
///
/// * `ConfigurationMissing` when the calendar yields no standard working days
/// * `NegativeWorkedDays` when the aggregation goes below zero
pub fn calculate_working_days(
    employee_id: i64,
    period: &PayPeriod,
    calendar: &WorkCalendar,
    attendance: &[AttendanceRecord],
    paid_leave_dates: &BTreeSet<NaiveDate>,
    step_number: u32,
) -> EngineResult<WorkingDaysResult> {
    let standard_days = standard_working_days(calendar, period);
    if standard_days <= 0 {
        return Err(EngineError::ConfigurationMissing {
            what: "standard working days".to_string(),
            date: period.start_date(),
        });
    }

    let mut warnings = Vec::new();
    let mut attended = BTreeMap::new();
    for record in attendance.iter().filter(|r| period.contains_date(r.date)) {
        if record.check_out.is_none() {
            warnings.push(skipped(record, "missing_check_out", "no check-out recorded"));
            continue;
        }
        if compute_worked_hours(record).anomaly.is_some() || record.is_anomalous() {
            warnings.push(skipped(record, "attendance_anomaly", "inconsistent timestamps"));
            continue;
        }
        attended.insert(record.date, record.day_credit());
    }

    let leave: BTreeSet<NaiveDate> = paid_leave_dates
        .iter()
        .copied()
        .filter(|d| period.contains_date(*d) && is_working_day(calendar, *d))
        .collect();

    let attended_days: Decimal = attended.values().copied().sum();
    let paid_leave_days = leave.len() as i64;
    let overlap = attended.keys().filter(|d| leave.contains(*d)).count() as i64;

    // Leave covers the whole day, so an overlapping date counts once at full credit.
    let attended_only: Decimal = attended
        .iter()
        .filter(|(d, _)| !leave.contains(*d))
        .map(|(_, credit)| *credit)
        .sum();
    let union_days = attended_only + Decimal::from(paid_leave_days);
    if union_days < Decimal::ZERO {
        return Err(EngineError::NegativeWorkedDays {
            employee_id,
            days: union_days,
        });
    }

    let worked_days = union_days.min(Decimal::from(standard_days));
    if worked_days < union_days {
        warnings.push(AuditWarning {
            code: "worked_days_capped".to_string(),
            message: format!(
                "{} attended or paid-leave days capped at {} standard working days",
                union_days.normalize(),
                standard_days
            ),
            severity: "low".to_string(),
        });
    }

    let audit_step = AuditStep {
        step_number,
        rule_id: "working_days".to_string(),
        rule_name: "Working Days".to_string(),
        basis: "calendar".to_string(),
        input: serde_json::json!({
            "period": period.to_string(),
            "attendance_records": attendance.len(),
            "paid_leave_dates": leave.len()
        }),
        output: serde_json::json!({
            "standard_days": standard_days,
            "attended_days": attended_days.normalize().to_string(),
            "paid_leave_days": paid_leave_days,
            "overlap_days": overlap,
            "worked_days": worked_days.normalize().to_string()
        }),
        reasoning: format!(
            "{} attended + {} paid leave, {} overlapping = {} worked of {} standard days",
            attended_days.normalize(),
            paid_leave_days,
            overlap,
            worked_days.normalize(),
            standard_days
        ),
    };

    Ok(WorkingDaysResult {
        standard_days,
        attended_days,
        paid_leave_days,
        worked_days,
        warnings,
        audit_step,
    })
}
