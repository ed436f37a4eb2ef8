//! Worked-hours calculation for an attendance record.

use rust_decimal::Decimal;

use crate::models::{AttendanceFlag, AttendanceRecord};

/// Worked hours for one attendance day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkedHours {
    /// Hours between check-in and check-out, never negative.
    pub hours: Decimal,
    /// Set when the timestamps are inconsistent.
    pub anomaly: Option<AttendanceFlag>,
}

/// Computes the hours between check-in and check-out.
///
/// A record without a check-out yields zero hours and no anomaly; the
/// end-of-day sweep is what marks it `MissingCheckOut`. A check-out before the
/// check-in is clamped to zero and reported as
/// [`AttendanceFlag::CheckOutBeforeCheckIn`].
pub fn compute_worked_hours(record: &AttendanceRecord) -> WorkedHours {
    let Some(check_out) = &record.check_out else {
        return WorkedHours {
            hours: Decimal::ZERO,
            anomaly: None,
        };
    };

    let seconds = (check_out.at - record.check_in.at).num_seconds();
    if seconds < 0 {
        return WorkedHours {
            hours: Decimal::ZERO,
            anomaly: Some(AttendanceFlag::CheckOutBeforeCheckIn),
        };
    }

    WorkedHours {
        hours: (Decimal::from(seconds) / Decimal::from(3600)).round_dp(4),
        anomaly: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckPoint, GeoPoint, Punctuality};
    use chrono::{DateTime, NaiveDate};
    use std::collections::BTreeSet;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn point(at: &str) -> CheckPoint {
        CheckPoint {
            at: DateTime::parse_from_rfc3339(at).unwrap(),
            location: GeoPoint::new(10.801829, 106.714231),
            distance_m: 0.0,
        }
    }

    fn record(check_in: &str, check_out: Option<&str>) -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            employee_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            check_in: point(check_in),
            check_out: check_out.map(point),
            punctuality: Punctuality::OnTime,
            late_reason: None,
            details: Default::default(),
            flags: BTreeSet::new(),
            closed: false,
        }
    }

    #[test]
    fn test_full_day() {
        let worked = compute_worked_hours(&record(
            "2024-07-01T08:00:00+07:00",
            Some("2024-07-01T17:30:00+07:00"),
        ));
        assert_eq!(worked.hours, dec("9.5"));
        assert!(worked.anomaly.is_none());
    }

    #[test]
    fn test_check_out_in_other_offset() {
        // 10:00 UTC is 17:00 local.
        let worked = compute_worked_hours(&record(
            "2024-07-01T08:00:00+07:00",
            Some("2024-07-01T10:00:00+00:00"),
        ));
        assert_eq!(worked.hours, dec("9"));
    }

    #[test]
    fn test_check_out_before_check_in_is_clamped() {
        let worked = compute_worked_hours(&record(
            "2024-07-01T08:00:00+07:00",
            Some("2024-07-01T07:00:00+07:00"),
        ));
        assert_eq!(worked.hours, Decimal::ZERO);
        assert_eq!(worked.anomaly, Some(AttendanceFlag::CheckOutBeforeCheckIn));
    }

    #[test]
    fn test_open_record_has_zero_hours() {
        let worked = compute_worked_hours(&record("2024-07-01T08:00:00+07:00", None));
        assert_eq!(worked.hours, Decimal::ZERO);
        assert!(worked.anomaly.is_none());
    }

    #[test]
    fn test_partial_hours_are_rounded_to_four_places() {
        let worked = compute_worked_hours(&record(
            "2024-07-01T08:00:00+07:00",
            Some("2024-07-01T08:20:00+07:00"),
        ));
        assert_eq!(worked.hours, dec("0.3333"));
    }
}
