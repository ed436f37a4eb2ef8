//! Leave approval workflow.
//!
//! Drives [`LeaveRequest`]s through manager and accounting sign-off and
//! answers the approved-leave queries payroll depends on.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{LeaveCategory, LeaveRequest, LeaveStatus};
use crate::store::LeaveStore;

/// The two-approver leave workflow.
pub struct LeaveWorkflow {
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    store: LeaveStore,
}

impl std::fmt::Debug for LeaveWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaveWorkflow").field("store", &self.store).finish_non_exhaustive()
    }
}

fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

impl LeaveWorkflow {
    /// Creates a workflow with an empty request store.
    pub fn new(config: Arc<EngineConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            store: LeaveStore::new(),
        }
    }

    /// Submits a new `PENDING` request.
    ///
    /// Fails with `InvalidRange`, `MissingReason`, or `OverlappingLeave` when
    /// the dates intersect another of the employee's requests that has not
    /// been rejected.
    pub fn submit(
        &self,
        employee_id: i64,
        category: LeaveCategory,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
    ) -> EngineResult<LeaveRequest> {
        let request = LeaveRequest::submit(employee_id, category, start_date, end_date, reason, self.clock.now())?;

        let request = self
            .store
            .insert(request, |existing| {
                match existing
                    .iter()
                    .find(|r| r.status() != LeaveStatus::Rejected && r.overlaps(start_date, end_date))
                {
                    Some(clash) => Err(EngineError::OverlappingLeave {
                        existing_request_id: clash.id,
                    }),
                    None => Ok(()),
                }
            })
            .inspect_err(|e| warn!(employee_id, error = %e, "Leave submission rejected"))?;

        info!(
            employee_id,
            request_id = %request.id,
            category = ?category,
            days = request.day_count,
            "Leave request submitted"
        );
        Ok(request)
    }

    /// Reads the request, checks the caller's version, applies `transition`
    /// and commits. A stale `expected_version` fails with
    /// `ConcurrentModification` before the transition is tried.
    fn transition<T, C>(
        &self,
        request_id: Uuid,
        expected_version: u64,
        transition: T,
        check: C,
    ) -> EngineResult<LeaveRequest>
    where
        T: FnOnce(LeaveRequest) -> EngineResult<LeaveRequest>,
        C: FnOnce(&LeaveRequest, &[LeaveRequest]) -> EngineResult<()>,
    {
        let current = self.store.get(request_id)?;
        if current.version != expected_version {
            return Err(EngineError::ConcurrentModification {
                entity: format!("leave request {}", request_id),
                expected: expected_version,
                actual: current.version,
            });
        }

        let next = transition(current)?;
        let snapshot = next.clone();
        self.store.commit(next, expected_version, |others| check(&snapshot, others))
    }

    /// `PENDING` → `PM_APPROVED`.
    pub fn approve_by_manager(
        &self,
        request_id: Uuid,
        expected_version: u64,
        approver_id: i64,
        note: Option<&str>,
    ) -> EngineResult<LeaveRequest> {
        let now = self.clock.now();
        let request = self
            .transition(
                request_id,
                expected_version,
                |r| r.approve_by_manager(approver_id, note, now),
                |_, _| Ok(()),
            )
            .inspect_err(|e| warn!(request_id = %request_id, error = %e, "Manager approval rejected"))?;

        info!(request_id = %request_id, approver_id, "Leave approved by manager");
        Ok(request)
    }

    /// `PM_APPROVED` → `FULLY_APPROVED`.
    ///
    /// Annual leave is checked against the yearly quota for every calendar
    /// year the request touches; exceeding it fails with `LeaveQuotaExceeded`.
    pub fn approve_by_accounting(
        &self,
        request_id: Uuid,
        expected_version: u64,
        approver_id: i64,
        note: Option<&str>,
    ) -> EngineResult<LeaveRequest> {
        let now = self.clock.now();
        let quota = self.config.payroll().annual_leave_quota_days;

        let request = self
            .transition(
                request_id,
                expected_version,
                |r| r.approve_by_accounting(approver_id, note, now),
                |request, others| {
                    if request.category != LeaveCategory::Annual {
                        return Ok(());
                    }
                    for year in request.start_date.year()..=request.end_date.year() {
                        let Some((first, last)) = year_bounds(year) else {
                            continue;
                        };
                        let used: i64 = others
                            .iter()
                            .filter(|r| {
                                r.category == LeaveCategory::Annual
                                    && r.status() == LeaveStatus::FullyApproved
                            })
                            .map(|r| r.days_within(first, last))
                            .sum();
                        let requested = request.days_within(first, last);
                        if used + requested > quota {
                            return Err(EngineError::LeaveQuotaExceeded {
                                employee_id: request.employee_id,
                                requested,
                                remaining: (quota - used).max(0),
                            });
                        }
                    }
                    Ok(())
                },
            )
            .inspect_err(|e| warn!(request_id = %request_id, error = %e, "Accounting approval rejected"))?;

        info!(
            request_id = %request_id,
            employee_id = request.employee_id,
            approver_id,
            "Leave fully approved"
        );
        Ok(request)
    }

    /// `PENDING` or `PM_APPROVED` → `REJECTED`.
    pub fn reject(
        &self,
        request_id: Uuid,
        expected_version: u64,
        rejecter_id: i64,
        reason: &str,
    ) -> EngineResult<LeaveRequest> {
        let now = self.clock.now();
        let request = self
            .transition(
                request_id,
                expected_version,
                |r| r.reject(rejecter_id, reason, now),
                |_, _| Ok(()),
            )
            .inspect_err(|e| warn!(request_id = %request_id, error = %e, "Rejection refused"))?;

        info!(request_id = %request_id, rejecter_id, "Leave rejected");
        Ok(request)
    }

    /// Returns the request with the given id.
    pub fn request(&self, request_id: Uuid) -> EngineResult<LeaveRequest> {
        self.store.get(request_id)
    }

    /// Returns all of an employee's requests in submission order.
    pub fn requests_for(&self, employee_id: i64) -> Vec<LeaveRequest> {
        self.store.for_employee(employee_id)
    }

    /// Sum of fully approved leave days inside `[period_start, period_end]`.
    ///
    /// Each request contributes only the days that fall inside the window.
    pub fn approved_leave_days(&self, employee_id: i64, period_start: NaiveDate, period_end: NaiveDate) -> i64 {
        self.store
            .for_employee(employee_id)
            .iter()
            .filter(|r| r.status() == LeaveStatus::FullyApproved)
            .map(|r| r.days_within(period_start, period_end))
            .sum()
    }

    /// Dates of fully approved leave inside `[start, end]`.
    ///
    /// With `paid_only`, only categories listed in `paid_leave_categories`
    /// are included.
    pub fn approved_leave_dates(
        &self,
        employee_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        paid_only: bool,
    ) -> BTreeSet<NaiveDate> {
        let paid = &self.config.payroll().paid_leave_categories;
        self.store
            .for_employee(employee_id)
            .iter()
            .filter(|r| r.status() == LeaveStatus::FullyApproved)
            .filter(|r| !paid_only || paid.contains(&r.category))
            .flat_map(|r| r.dates_within(start, end))
            .collect()
    }
}
