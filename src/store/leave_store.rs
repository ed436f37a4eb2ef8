//! Leave request storage with optimistic versioning.

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::LeaveRequest;

/// Concurrent store of leave requests.
///
/// Writes that must see an employee's other requests (the overlap guard, the
/// quota check) run while holding that employee's index entry, which
/// serializes them per employee. Lock order is always the index first, then
/// the request map.
#[derive(Debug, Default)]
pub struct LeaveStore {
    requests: DashMap<Uuid, LeaveRequest>,
    by_employee: DashMap<i64, Vec<Uuid>>,
}

impl LeaveStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn siblings(&self, ids: &[Uuid]) -> Vec<LeaveRequest> {
        ids.iter()
            .filter_map(|id| self.requests.get(id).map(|r| r.clone()))
            .collect()
    }

    /// Inserts a new request after `check` accepts the employee's existing ones.
    pub fn insert<F>(&self, request: LeaveRequest, check: F) -> EngineResult<LeaveRequest>
    where
        F: FnOnce(&[LeaveRequest]) -> EngineResult<()>,
    {
        let mut ids = self.by_employee.entry(request.employee_id).or_default();
        check(&self.siblings(&ids))?;

        self.requests.insert(request.id, request.clone());
        ids.push(request.id);
        Ok(request)
    }

    /// Returns a copy of the request.
    pub fn get(&self, request_id: Uuid) -> EngineResult<LeaveRequest> {
        self.requests
            .get(&request_id)
            .map(|r| r.clone())
            .ok_or(EngineError::LeaveRequestNotFound { request_id })
    }

    /// Stores `next` if the stored version still equals `expected_version`.
    ///
    /// `check` sees the employee's other requests before the write. On
    /// success the stored copy carries `expected_version + 1`.
    pub fn commit<F>(&self, next: LeaveRequest, expected_version: u64, check: F) -> EngineResult<LeaveRequest>
    where
        F: FnOnce(&[LeaveRequest]) -> EngineResult<()>,
    {
        let ids = self.by_employee.entry(next.employee_id).or_default();
        let others: Vec<Uuid> = ids.iter().copied().filter(|id| *id != next.id).collect();
        check(&self.siblings(&others))?;

        let mut stored = self
            .requests
            .get_mut(&next.id)
            .ok_or(EngineError::LeaveRequestNotFound { request_id: next.id })?;
        if stored.version != expected_version {
            return Err(EngineError::ConcurrentModification {
                entity: format!("leave request {}", next.id),
                expected: expected_version,
                actual: stored.version,
            });
        }

        let committed = LeaveRequest {
            version: expected_version + 1,
            ..next
        };
        *stored = committed.clone();
        Ok(committed)
    }

    /// All requests of one employee, in submission order.
    pub fn for_employee(&self, employee_id: i64) -> Vec<LeaveRequest> {
        let ids = self
            .by_employee
            .get(&employee_id)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        self.siblings(&ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeaveCategory, LeaveStatus};
    use chrono::{NaiveDate, Utc};

    fn request(employee_id: i64) -> LeaveRequest {
        let d = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        LeaveRequest::submit(employee_id, LeaveCategory::Annual, d, d, "Trip", Utc::now()).unwrap()
    }

    #[test]
    fn test_commit_bumps_version() {
        let store = LeaveStore::new();
        let stored = store.insert(request(1), |_| Ok(())).unwrap();
        let next = stored.approve_by_manager(10, None, Utc::now()).unwrap();

        let committed = store.commit(next, 0, |_| Ok(())).unwrap();
        assert_eq!(committed.version, 1);
        assert_eq!(store.get(committed.id).unwrap().status(), LeaveStatus::PmApproved);
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let store = LeaveStore::new();
        let stored = store.insert(request(1), |_| Ok(())).unwrap();
        let first = stored.clone().approve_by_manager(10, None, Utc::now()).unwrap();
        let second = stored.reject(11, "No", Utc::now()).unwrap();

        store.commit(first, 0, |_| Ok(())).unwrap();
        match store.commit(second, 0, |_| Ok(())).unwrap_err() {
            EngineError::ConcurrentModification { expected, actual, .. } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("Expected ConcurrentModification, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_check_sees_existing_requests() {
        let store = LeaveStore::new();
        store.insert(request(1), |_| Ok(())).unwrap();
        store.insert(request(2), |_| Ok(())).unwrap();

        let result = store.insert(request(1), |existing| {
            assert_eq!(existing.len(), 1);
            Err(EngineError::OverlappingLeave {
                existing_request_id: existing[0].id,
            })
        });
        assert!(result.is_err());
        assert_eq!(store.for_employee(1).len(), 1);
    }

    #[test]
    fn test_get_unknown_request() {
        let store = LeaveStore::new();
        assert!(matches!(
            store.get(Uuid::nil()),
            Err(EngineError::LeaveRequestNotFound { .. })
        ));
    }
}
