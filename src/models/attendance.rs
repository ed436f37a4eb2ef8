//! Attendance record model.
//!
//! One [`AttendanceRecord`] exists per employee per workplace-local calendar
//! date. It is created by the first check-in of the day and completed by the
//! check-out.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks that both coordinates are finite and within range.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_engine::models::GeoPoint;
    ///
    /// assert!(GeoPoint::new(10.8018, 106.7142).validate().is_ok());
    /// assert!(GeoPoint::new(190.8, 106.7142).validate().is_err());
    /// assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> EngineResult<()> {
        let latitude_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let longitude_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if latitude_ok && longitude_ok {
            Ok(())
        } else {
            Err(EngineError::InvalidLocation {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// The length of the shift an attendance record covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    /// A full working day.
    #[default]
    Full,
    /// Half a working day.
    Half,
}

impl ShiftKind {
    /// The fraction of a working day a complete record of this shift earns.
    pub fn day_credit(&self) -> Decimal {
        match self {
            ShiftKind::Full => Decimal::ONE,
            ShiftKind::Half => Decimal::new(5, 1),
        }
    }
}

/// How the check-in was captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInMethod {
    /// Device GPS fix.
    #[default]
    Gps,
    /// Entered by an administrator on the employee's behalf.
    Manual,
}

/// Descriptive data captured with a check-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInDetails {
    /// The shift being worked.
    pub shift: ShiftKind,
    /// How the check-in was captured.
    pub method: CheckInMethod,
    /// Street address reported by the device, if any.
    pub address: Option<String>,
}

/// Punctuality derived from the check-in time.
///
/// # Example
///
/// ```
/// use hr_engine::models::Punctuality;
///
/// let status = Punctuality::Late { minutes_late: 12 };
/// assert_eq!(status.minutes_late(), 12);
/// assert!(!status.requires_reason());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Punctuality {
    /// Arrived before the expected start or within the grace window.
    OnTime,
    /// Arrived after the grace window but within the escalation threshold.
    Late {
        /// Minutes after the expected start.
        minutes_late: i64,
    },
    /// Arrived after the escalation threshold; a reason must be recorded.
    LateReasonRequired {
        /// Minutes after the expected start.
        minutes_late: i64,
    },
}

impl Punctuality {
    /// Minutes after the expected start, zero when on time.
    pub fn minutes_late(&self) -> i64 {
        match self {
            Punctuality::OnTime => 0,
            Punctuality::Late { minutes_late } | Punctuality::LateReasonRequired { minutes_late } => {
                *minutes_late
            }
        }
    }

    /// Returns true when the check-in must be justified with a reason.
    pub fn requires_reason(&self) -> bool {
        matches!(self, Punctuality::LateReasonRequired { .. })
    }
}

/// Data-quality flags attached to an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceFlag {
    /// Escalated lateness without a reason.
    IncompleteLateReason,
    /// A leg was recorded outside the geofence radius.
    OutsideGeofence,
    /// The check-out precedes the check-in.
    CheckOutBeforeCheckIn,
    /// The day elapsed without a check-out.
    MissingCheckOut,
}

impl AttendanceFlag {
    /// Returns true if the flag makes the record's hours unusable.
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            AttendanceFlag::CheckOutBeforeCheckIn | AttendanceFlag::MissingCheckOut
        )
    }
}

/// One leg (check-in or check-out) of the attendance day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckPoint {
    /// The instant, expressed in the workplace offset.
    pub at: DateTime<FixedOffset>,
    /// Reported coordinates.
    pub location: GeoPoint,
    /// Great-circle distance from the employer anchor, in metres.
    pub distance_m: f64,
}

/// A validated attendance day for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// The employee the record belongs to.
    pub employee_id: i64,
    /// Workplace-local calendar date.
    pub date: NaiveDate,
    /// Check-in leg.
    pub check_in: CheckPoint,
    /// Check-out leg, once recorded.
    pub check_out: Option<CheckPoint>,
    /// Punctuality derived from the check-in.
    pub punctuality: Punctuality,
    /// Free-text justification for lateness.
    pub late_reason: Option<String>,
    /// Shift, capture method and address from the check-in.
    #[serde(default)]
    pub details: CheckInDetails,
    /// Data-quality flags.
    #[serde(default)]
    pub flags: BTreeSet<AttendanceFlag>,
    /// Set once the day has elapsed; closed records are immutable.
    #[serde(default)]
    pub closed: bool,
}

impl AttendanceRecord {
    /// Returns true if the record carries `flag`.
    pub fn has_flag(&self, flag: AttendanceFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Returns true when escalated lateness has no reason yet.
    pub fn is_incomplete(&self) -> bool {
        self.punctuality.requires_reason() && self.late_reason.is_none()
    }

    /// Worked-day credit for the record's shift.
    pub fn day_credit(&self) -> Decimal {
        self.details.shift.day_credit()
    }

    /// Returns true when the record cannot count as a worked day.
    pub fn is_anomalous(&self) -> bool {
        self.check_out.is_none() || self.flags.iter().any(AttendanceFlag::is_anomaly)
    }

    /// Recomputes [`AttendanceFlag::IncompleteLateReason`] from the reason field.
    pub(crate) fn refresh_reason_flag(&mut self) {
        if self.is_incomplete() {
            self.flags.insert(AttendanceFlag::IncompleteLateReason);
        } else {
            self.flags.remove(&AttendanceFlag::IncompleteLateReason);
        }
    }
}
