//! Versioned payroll ledger.
//!
//! Each (employee, period) key owns an ordered list of record ids; the last
//! one is the current record. Drafts are replaced in place, finalized records
//! are only ever superseded by an appended correction.

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayPeriod, PayrollRecord, PayrollStatus};

type PeriodKey = (i64, PayPeriod);

/// Exclusive claim on one (employee, period) key, released on drop.
#[derive(Debug)]
pub struct RunGuard<'a> {
    ledger: &'a PayrollLedger,
    key: PeriodKey,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.ledger.in_flight.remove(&self.key);
    }
}

/// Concurrent payroll ledger.
#[derive(Debug, Default)]
pub struct PayrollLedger {
    records: DashMap<Uuid, PayrollRecord>,
    periods: DashMap<PeriodKey, Vec<Uuid>>,
    in_flight: DashSet<PeriodKey>,
}

impl PayrollLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the key for a computation or finalization.
    ///
    /// Fails with `PayrollRunInProgress` while another guard holds it.
    pub fn begin_run(&self, employee_id: i64, period: PayPeriod) -> EngineResult<RunGuard<'_>> {
        let key = (employee_id, period);
        if !self.in_flight.insert(key) {
            return Err(EngineError::PayrollRunInProgress {
                employee_id,
                year: period.year(),
                month: period.month(),
            });
        }
        Ok(RunGuard { ledger: self, key })
    }

    /// Returns a copy of the record.
    pub fn get(&self, record_id: Uuid) -> EngineResult<PayrollRecord> {
        self.records
            .get(&record_id)
            .map(|r| r.clone())
            .ok_or(EngineError::PayrollRecordNotFound { record_id })
    }

    /// The current record for the key, if any.
    pub fn current(&self, employee_id: i64, period: PayPeriod) -> Option<PayrollRecord> {
        let current_id = self
            .periods
            .get(&(employee_id, period))
            .and_then(|ids| ids.last().copied())?;
        self.records.get(&current_id).map(|r| r.clone())
    }

    /// Every version for the key, oldest first.
    pub fn history(&self, employee_id: i64, period: PayPeriod) -> Vec<PayrollRecord> {
        let ids = self
            .periods
            .get(&(employee_id, period))
            .map(|ids| ids.clone())
            .unwrap_or_default();
        ids.iter()
            .filter_map(|id| self.records.get(id).map(|r| r.clone()))
            .collect()
    }

    /// Stores a draft, replacing the current draft if there is one.
    ///
    /// The stored draft takes the current version number (1 for a new key).
    /// Fails with `PayrollFinalized` when the current record is finalized.
    pub fn store_draft(&self, record: PayrollRecord) -> EngineResult<PayrollRecord> {
        let mut ids = self.periods.entry((record.employee_id, record.period)).or_default();

        let mut record = record;
        record.status = PayrollStatus::Draft;
        record.correction = None;

        match ids.last().copied() {
            None => {
                record.version = 1;
                ids.push(record.id);
            }
            Some(current_id) => {
                let current = self.get(current_id)?;
                if current.is_finalized() {
                    return Err(EngineError::PayrollFinalized {
                        record_id: current_id,
                    });
                }
                record.version = current.version;
                self.records.remove(&current_id);
                if let Some(last) = ids.last_mut() {
                    *last = record.id;
                }
            }
        }

        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    /// Appends a correcting draft on top of a finalized current record.
    ///
    /// `record.correction` must name the current record. Fails with
    /// `NoPayrollForPeriod` when the key is empty and `PayrollNotFinalized`
    /// when the current record is still a draft.
    pub fn append_correction(&self, record: PayrollRecord) -> EngineResult<PayrollRecord> {
        let period = record.period;
        let mut ids = self.periods.entry((record.employee_id, period)).or_default();

        let current_id = ids.last().copied().ok_or(EngineError::NoPayrollForPeriod {
            employee_id: record.employee_id,
            year: period.year(),
            month: period.month(),
        })?;
        let current = self.get(current_id)?;
        if !current.is_finalized() {
            return Err(EngineError::PayrollNotFinalized {
                record_id: current_id,
            });
        }
        if record.correction.as_ref().map(|c| c.supersedes) != Some(current_id) {
            return Err(EngineError::PayrollSuperseded {
                record_id: record.correction.map(|c| c.supersedes).unwrap_or_default(),
                current_record_id: current_id,
            });
        }

        let mut record = record;
        record.status = PayrollStatus::Draft;
        record.version = current.version + 1;
        ids.push(record.id);
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    /// Marks the current record finalized.
    ///
    /// Finalizing an already finalized current record returns it unchanged.
    /// Fails with `PayrollSuperseded` when `record_id` is not current.
    pub fn finalize(&self, record_id: Uuid, now: DateTime<Utc>) -> EngineResult<PayrollRecord> {
        let record = self.get(record_id)?;
        let ids = self.periods.entry((record.employee_id, record.period)).or_default();

        let current_id = ids.last().copied().unwrap_or(record_id);
        if current_id != record_id {
            return Err(EngineError::PayrollSuperseded {
                record_id,
                current_record_id: current_id,
            });
        }

        let mut stored = self
            .records
            .get_mut(&record_id)
            .ok_or(EngineError::PayrollRecordNotFound { record_id })?;
        if stored.is_finalized() {
            return Ok(stored.clone());
        }
        stored.status = PayrollStatus::Finalized;
        stored.finalized_at = Some(now);
        Ok(stored.clone())
    }
}
