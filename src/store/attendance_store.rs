//! Attendance record storage, indexed by employee and then by date.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;
use dashmap::DashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::AttendanceRecord;

/// Concurrent store holding at most one record per employee per date.
///
/// Each employee's records sit in one date-ordered map, so range queries for
/// a pay period touch only that employee's days.
#[derive(Debug, Default)]
pub struct AttendanceStore {
    by_employee: DashMap<i64, BTreeMap<NaiveDate, AttendanceRecord>>,
}

impl AttendanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new record if none exists for its employee and date.
    ///
    /// The check and the insert happen under the employee's shard lock, so of
    /// two concurrent inserts for the same key exactly one succeeds and the
    /// other gets `DuplicateCheckIn`.
    pub fn insert_new(&self, record: AttendanceRecord) -> EngineResult<AttendanceRecord> {
        let mut days = self.by_employee.entry(record.employee_id).or_default();
        match days.entry(record.date) {
            Entry::Occupied(_) => Err(EngineError::DuplicateCheckIn {
                employee_id: record.employee_id,
                date: record.date,
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Returns a copy of the record for `employee_id` on `date`.
    pub fn get(&self, employee_id: i64, date: NaiveDate) -> Option<AttendanceRecord> {
        self.by_employee
            .get(&employee_id)
            .and_then(|days| days.get(&date).cloned())
    }

    /// Applies `change` to the stored record and returns the result.
    ///
    /// `change` works on a copy that is written back only when it returns
    /// `Ok`, so a failed update leaves the stored record untouched.
    pub fn update<F>(&self, employee_id: i64, date: NaiveDate, change: F) -> EngineResult<AttendanceRecord>
    where
        F: FnOnce(&mut AttendanceRecord) -> EngineResult<()>,
    {
        let mut days = self
            .by_employee
            .get_mut(&employee_id)
            .ok_or(EngineError::NoCheckInFound { employee_id, date })?;
        let stored = days
            .get_mut(&date)
            .ok_or(EngineError::NoCheckInFound { employee_id, date })?;

        let mut next = stored.clone();
        change(&mut next)?;
        *stored = next.clone();
        Ok(next)
    }

    /// Records for `employee_id` dated within `[start, end]`, oldest first.
    pub fn in_range(&self, employee_id: i64, start: NaiveDate, end: NaiveDate) -> Vec<AttendanceRecord> {
        if start > end {
            return Vec::new();
        }
        self.by_employee
            .get(&employee_id)
            .map(|days| days.range(start..=end).map(|(_, r)| r.clone()).collect())
            .unwrap_or_default()
    }

    /// Keys of records that are still open and dated before `date`.
    pub fn open_before(&self, date: NaiveDate) -> Vec<(i64, NaiveDate)> {
        let mut open = Vec::new();
        for days in self.by_employee.iter() {
            open.extend(
                days.value()
                    .range(..date)
                    .filter(|(_, r)| !r.closed)
                    .map(|(d, _)| (*days.key(), *d)),
            );
        }
        open
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.by_employee.iter().map(|days| days.value().len()).sum()
    }

    /// Returns true when the store is empty.
    pub fn is_empty(&self) -> bool {
        self.by_employee.iter().all(|days| days.value().is_empty())
    }
}
