//! Attendance validation.
//!
//! Turns raw check-in and check-out pings into one validated
//! [`AttendanceRecord`] per employee per workplace-local date. A record can
//! change only while its date is the workplace-local today of the engine
//! clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{WorkedHours, classify_punctuality, compute_worked_hours, haversine_distance_m};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceFlag, AttendanceRecord, CheckInDetails, CheckPoint, GeoPoint};
use crate::store::AttendanceStore;

/// How far a ping may run ahead of the engine clock.
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Validates attendance pings against the workplace configuration.
pub struct AttendanceValidator {
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    store: AttendanceStore,
}

impl std::fmt::Debug for AttendanceValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendanceValidator")
            .field("offset", &self.offset)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl AttendanceValidator {
    /// Creates a validator for the configured workplace.
    pub fn new(config: Arc<EngineConfig>, clock: Arc<dyn Clock>) -> EngineResult<Self> {
        let offset = config.workplace().offset()?;
        Ok(Self {
            config,
            clock,
            offset,
            store: AttendanceStore::new(),
        })
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.offset).date_naive()
    }

    fn ensure_day_open(&self, employee_id: i64, date: NaiveDate) -> EngineResult<()> {
        if date < self.today() {
            return Err(EngineError::AttendanceClosed { employee_id, date });
        }
        Ok(())
    }

    /// Validates a ping and returns its leg.
    ///
    /// Rejects bad coordinates, timestamps ahead of the clock and pings for a
    /// day that has already elapsed.
    fn check_point(
        &self,
        employee_id: i64,
        at: DateTime<FixedOffset>,
        location: GeoPoint,
    ) -> EngineResult<CheckPoint> {
        location.validate()?;
        if at.with_timezone(&Utc) > self.clock.now() + Duration::seconds(MAX_CLOCK_SKEW_SECS) {
            return Err(EngineError::FutureTimestamp { employee_id, at });
        }
        let at = at.with_timezone(&self.offset);
        self.ensure_day_open(employee_id, at.date_naive())?;
        Ok(CheckPoint {
            at,
            location,
            distance_m: haversine_distance_m(self.config.workplace().anchor, location),
        })
    }

    fn outside_geofence(&self, point: &CheckPoint) -> bool {
        point.distance_m > self.config.workplace().geofence_radius_m
    }

    /// Records the first check-in of the day for a full GPS shift.
    ///
    /// See [`record_check_in_with_details`](Self::record_check_in_with_details).
    pub fn record_check_in(
        &self,
        employee_id: i64,
        timestamp: DateTime<FixedOffset>,
        location: GeoPoint,
        late_reason: Option<&str>,
    ) -> EngineResult<AttendanceRecord> {
        self.record_check_in_with_details(employee_id, timestamp, location, late_reason, CheckInDetails::default())
    }

    /// Records the first check-in of the day.
    ///
    /// The timestamp is converted to the workplace offset to find the local
    /// date and lateness. A check-in outside the geofence is accepted and
    /// flagged. A blank `late_reason` or address counts as none.
    ///
    /// # Errors
    ///
    /// * `InvalidLocation` for coordinates that are not on Earth
    /// * `FutureTimestamp` when the timestamp is ahead of the clock
    /// * `AttendanceClosed` when the local date has already elapsed
    /// * `DuplicateCheckIn` if the employee already checked in on that date
    pub fn record_check_in_with_details(
        &self,
        employee_id: i64,
        timestamp: DateTime<FixedOffset>,
        location: GeoPoint,
        late_reason: Option<&str>,
        details: CheckInDetails,
    ) -> EngineResult<AttendanceRecord> {
        let check_in = self
            .check_point(employee_id, timestamp, location)
            .inspect_err(|e| warn!(employee_id, error = %e, "Check-in rejected"))?;
        let date = check_in.at.date_naive();
        let punctuality = classify_punctuality(check_in.at.naive_local(), self.config.workplace());

        let mut record = AttendanceRecord {
            id: Uuid::new_v4(),
            employee_id,
            date,
            check_in,
            check_out: None,
            punctuality,
            late_reason: late_reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            details: CheckInDetails {
                address: details
                    .address
                    .as_deref()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string),
                ..details
            },
            flags: Default::default(),
            closed: false,
        };
        if self.outside_geofence(&record.check_in) {
            record.flags.insert(AttendanceFlag::OutsideGeofence);
        }
        record.refresh_reason_flag();

        let record = self.store.insert_new(record).inspect_err(|_| {
            warn!(employee_id, date = %date, "Duplicate check-in rejected");
        })?;

        info!(
            employee_id,
            date = %date,
            shift = ?record.details.shift,
            minutes_late = record.punctuality.minutes_late(),
            distance_m = record.check_in.distance_m,
            "Check-in recorded"
        );
        if record.is_incomplete() {
            warn!(employee_id, date = %date, "Late check-in is missing a reason");
        }
        Ok(record)
    }

    /// Records the check-out on the record for the timestamp's local date.
    ///
    /// The check-out leg keeps its own coordinates and distance. A later
    /// check-out on the same open record replaces an earlier one.
    ///
    /// Fails with `InvalidLocation` or `FutureTimestamp` for a bad ping,
    /// `NoCheckInFound` when there is no record for the date and
    /// `AttendanceClosed` once the day has elapsed.
    pub fn record_check_out(
        &self,
        employee_id: i64,
        timestamp: DateTime<FixedOffset>,
        location: GeoPoint,
    ) -> EngineResult<AttendanceRecord> {
        let check_out = self
            .check_point(employee_id, timestamp, location)
            .inspect_err(|e| warn!(employee_id, error = %e, "Check-out rejected"))?;
        let date = check_out.at.date_naive();
        let outside = self.outside_geofence(&check_out);

        let record = self
            .store
            .update(employee_id, date, |record| {
                if record.closed {
                    return Err(EngineError::AttendanceClosed { employee_id, date });
                }
                record.check_out = Some(check_out);
                if outside {
                    record.flags.insert(AttendanceFlag::OutsideGeofence);
                }
                match compute_worked_hours(record).anomaly {
                    Some(flag) => {
                        record.flags.insert(flag);
                    }
                    None => {
                        record.flags.remove(&AttendanceFlag::CheckOutBeforeCheckIn);
                    }
                }
                Ok(())
            })
            .inspect_err(|e| warn!(employee_id, date = %date, error = %e, "Check-out rejected"))?;

        if record.has_flag(AttendanceFlag::CheckOutBeforeCheckIn) {
            warn!(employee_id, date = %date, "Check-out precedes check-in; hours clamped to zero");
        } else {
            info!(employee_id, date = %date, "Check-out recorded");
        }
        Ok(record)
    }

    /// Fills in the late reason on today's record.
    ///
    /// Fails with `MissingReason` for a blank reason, `AttendanceClosed` once
    /// the day has elapsed and `NoCheckInFound` when there is no record.
    pub fn supply_late_reason(
        &self,
        employee_id: i64,
        date: NaiveDate,
        reason: &str,
    ) -> EngineResult<AttendanceRecord> {
        self.ensure_day_open(employee_id, date)?;
        let reason = reason.trim();
        let record = self.store.update(employee_id, date, |record| {
            if record.closed {
                return Err(EngineError::AttendanceClosed { employee_id, date });
            }
            if reason.is_empty() {
                return Err(EngineError::MissingReason {
                    action: "explain a late check-in".to_string(),
                });
            }
            record.late_reason = Some(reason.to_string());
            record.refresh_reason_flag();
            Ok(())
        })?;

        info!(employee_id, date = %date, "Late reason supplied");
        Ok(record)
    }

    /// Hours between the record's check-in and check-out.
    pub fn compute_worked_hours(&self, record: &AttendanceRecord) -> WorkedHours {
        compute_worked_hours(record)
    }

    /// Returns the record for `employee_id` on `date`.
    pub fn record(&self, employee_id: i64, date: NaiveDate) -> Option<AttendanceRecord> {
        self.store.get(employee_id, date)
    }

    /// Returns the employee's records within `[start, end]`, oldest first.
    pub fn records_in_range(&self, employee_id: i64, start: NaiveDate, end: NaiveDate) -> Vec<AttendanceRecord> {
        self.store.in_range(employee_id, start, end)
    }

    /// Closes every open record dated before the workplace-local date of `now`.
    ///
    /// Records without a check-out are flagged `MissingCheckOut`. Returns the
    /// number of records closed.
    pub fn sweep_elapsed_days(&self, now: DateTime<Utc>) -> usize {
        let today = now.with_timezone(&self.offset).date_naive();
        let mut closed = 0;

        for (employee_id, date) in self.store.open_before(today) {
            let result = self.store.update(employee_id, date, |record| {
                if record.closed {
                    return Ok(());
                }
                if record.check_out.is_none() {
                    record.flags.insert(AttendanceFlag::MissingCheckOut);
                    warn!(employee_id, date = %date, "Closing attendance without check-out");
                }
                record.closed = true;
                closed += 1;
                Ok(())
            });
            if let Err(e) = result {
                warn!(employee_id, date = %date, error = %e, "Failed to close attendance");
            }
        }

        debug!(today = %today, closed, "Attendance sweep finished");
        closed
    }
}
