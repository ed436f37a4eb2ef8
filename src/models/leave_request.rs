//! Leave request model and its approval state machine.
//!
//! A [`LeaveRequest`] moves through `PENDING` → `PM_APPROVED` →
//! `FULLY_APPROVED`, or to `REJECTED` from either non-terminal state. Each
//! [`LeaveState`] variant carries exactly the sign-offs that exist in that
//! state, so a request cannot be fully approved without both approvers.
//!
//! Transitions are pure: they consume a snapshot and return the next one.
//! Persisting the result (and the version check that goes with it) is the
//! store's job.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Category of leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveCategory {
    /// Annual paid leave, subject to the yearly quota.
    Annual,
    /// Sick leave.
    Sick,
    /// Unpaid leave.
    Unpaid,
    /// Anything else (weddings, bereavement, ...).
    Other,
}

/// Fieldless view of a request's state, used in errors and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    /// Submitted, awaiting the project manager.
    Pending,
    /// Manager approved, awaiting accounting.
    PmApproved,
    /// Both approvers signed off. Terminal.
    FullyApproved,
    /// Rejected by a reviewer. Terminal.
    Rejected,
}

impl LeaveStatus {
    /// Returns true for states that accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::FullyApproved | LeaveStatus::Rejected)
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveStatus::Pending => write!(f, "PENDING"),
            LeaveStatus::PmApproved => write!(f, "PM_APPROVED"),
            LeaveStatus::FullyApproved => write!(f, "FULLY_APPROVED"),
            LeaveStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// An approver's signature on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOff {
    /// The approving user.
    pub approver_id: i64,
    /// When the approval was given.
    pub at: DateTime<Utc>,
    /// Optional note from the approver.
    pub note: Option<String>,
}

/// The HR-level stamp applied when both approvals are in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finalization {
    /// When the request became binding.
    pub at: DateTime<Utc>,
    /// Summary of who authorised the leave.
    pub note: String,
}

/// Details of a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// The rejecting user.
    pub rejecter_id: i64,
    /// When the request was rejected.
    pub at: DateTime<Utc>,
    /// Mandatory explanation.
    pub reason: String,
}

/// Workflow state with the sign-offs collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveState {
    /// Awaiting the project manager.
    Pending,
    /// Awaiting accounting.
    PmApproved {
        /// The manager's sign-off.
        manager: SignOff,
    },
    /// Binding approval.
    FullyApproved {
        /// The manager's sign-off.
        manager: SignOff,
        /// The accounting sign-off.
        accounting: SignOff,
        /// The HR finalization stamp.
        finalization: Finalization,
    },
    /// Closed without approval.
    Rejected {
        /// The manager's sign-off when rejected after manager approval.
        manager: Option<SignOff>,
        /// Rejection details.
        rejection: Rejection,
    },
}

impl LeaveState {
    /// Returns the fieldless status.
    pub fn status(&self) -> LeaveStatus {
        match self {
            LeaveState::Pending => LeaveStatus::Pending,
            LeaveState::PmApproved { .. } => LeaveStatus::PmApproved,
            LeaveState::FullyApproved { .. } => LeaveStatus::FullyApproved,
            LeaveState::Rejected { .. } => LeaveStatus::Rejected,
        }
    }
}

/// A leave request submitted by an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request.
    pub id: Uuid,
    /// The requesting employee.
    pub employee_id: i64,
    /// Leave category.
    pub category: LeaveCategory,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Inclusive number of calendar days.
    pub day_count: i64,
    /// Employee's reason.
    pub reason: String,
    /// Workflow state.
    pub state: LeaveState,
    /// When the request was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Optimistic concurrency version, bumped on every stored transition.
    pub version: u64,
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl LeaveRequest {
    /// Creates a `PENDING` request.
    ///
    /// Fails with `InvalidRange` when `end_date < start_date` and with
    /// `MissingReason` when the reason is blank.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_engine::models::{LeaveCategory, LeaveRequest, LeaveStatus};
    /// use chrono::{NaiveDate, Utc};
    ///
    /// let request = LeaveRequest::submit(
    ///     7,
    ///     LeaveCategory::Annual,
    ///     NaiveDate::from_ymd_opt(2024, 7, 29).unwrap(),
    ///     NaiveDate::from_ymd_opt(2024, 8, 2).unwrap(),
    ///     "Family trip",
    ///     Utc::now(),
    /// )
    /// .unwrap();
    /// assert_eq!(request.day_count, 5);
    /// assert_eq!(request.status(), LeaveStatus::Pending);
    /// ```
    pub fn submit(
        employee_id: i64,
        category: LeaveCategory,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        if end_date < start_date {
            return Err(EngineError::InvalidRange {
                start_date,
                end_date,
            });
        }
        let reason = non_blank(reason).ok_or_else(|| EngineError::MissingReason {
            action: "submit a leave request".to_string(),
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            employee_id,
            category,
            start_date,
            end_date,
            day_count: (end_date - start_date).num_days() + 1,
            reason,
            state: LeaveState::Pending,
            submitted_at: now,
            version: 0,
        })
    }

    /// Returns the fieldless status.
    pub fn status(&self) -> LeaveStatus {
        self.state.status()
    }

    fn illegal(&self, action: &str) -> EngineError {
        EngineError::IllegalTransition {
            request_id: self.id,
            from: self.status(),
            action: action.to_string(),
        }
    }

    /// `PENDING` → `PM_APPROVED`.
    pub fn approve_by_manager(
        self,
        approver_id: i64,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        match self.state {
            LeaveState::Pending => Ok(Self {
                state: LeaveState::PmApproved {
                    manager: SignOff {
                        approver_id,
                        at: now,
                        note: note.and_then(non_blank),
                    },
                },
                ..self
            }),
            _ => Err(self.illegal("approve by manager")),
        }
    }

    /// `PM_APPROVED` → `FULLY_APPROVED`, stamping the HR finalization.
    pub fn approve_by_accounting(
        self,
        approver_id: i64,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        match self.state {
            LeaveState::PmApproved { manager } => {
                let finalization = Finalization {
                    at: now,
                    note: format!(
                        "Approved by manager {} and accounting {}",
                        manager.approver_id, approver_id
                    ),
                };
                Ok(Self {
                    state: LeaveState::FullyApproved {
                        manager,
                        accounting: SignOff {
                            approver_id,
                            at: now,
                            note: note.and_then(non_blank),
                        },
                        finalization,
                    },
                    ..self
                })
            }
            _ => Err(self.illegal("approve by accounting")),
        }
    }

    /// `PENDING` or `PM_APPROVED` → `REJECTED`.
    ///
    /// The terminal-state check runs before the reason check, so rejecting an
    /// already closed request reports `IllegalTransition` whatever the reason.
    pub fn reject(self, rejecter_id: i64, reason: &str, now: DateTime<Utc>) -> EngineResult<Self> {
        let manager = match &self.state {
            LeaveState::Pending => None,
            LeaveState::PmApproved { manager } => Some(manager.clone()),
            LeaveState::FullyApproved { .. } | LeaveState::Rejected { .. } => {
                return Err(self.illegal("reject"));
            }
        };
        let reason = non_blank(reason).ok_or_else(|| EngineError::MissingReason {
            action: "reject a leave request".to_string(),
        })?;

        Ok(Self {
            state: LeaveState::Rejected {
                manager,
                rejection: Rejection {
                    rejecter_id,
                    at: now,
                    reason,
                },
            },
            ..self
        })
    }

    /// Returns true if the request's dates intersect `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// Number of the request's days inside `[start, end]`.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_engine::models::{LeaveCategory, LeaveRequest};
    /// use chrono::{NaiveDate, Utc};
    ///
    /// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
    /// let request =
    ///     LeaveRequest::submit(1, LeaveCategory::Annual, d(7, 29), d(8, 2), "Trip", Utc::now())
    ///         .unwrap();
    /// assert_eq!(request.days_within(d(7, 1), d(7, 31)), 3);
    /// assert_eq!(request.days_within(d(8, 1), d(8, 31)), 2);
    /// ```
    pub fn days_within(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let from = self.start_date.max(start);
        let to = self.end_date.min(end);
        if to < from {
            0
        } else {
            (to - from).num_days() + 1
        }
    }

    /// Iterates the request's dates inside `[start, end]`.
    pub fn dates_within(&self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> + use<> {
        let from = self.start_date.max(start);
        let to = self.end_date.min(end);
        from.iter_days().take_while(move |d| *d <= to)
    }

    /// The manager's sign-off, if given.
    pub fn manager_sign_off(&self) -> Option<&SignOff> {
        match &self.state {
            LeaveState::PmApproved { manager } | LeaveState::FullyApproved { manager, .. } => {
                Some(manager)
            }
            LeaveState::Rejected { manager, .. } => manager.as_ref(),
            LeaveState::Pending => None,
        }
    }

    /// The accounting sign-off, if given.
    pub fn accounting_sign_off(&self) -> Option<&SignOff> {
        match &self.state {
            LeaveState::FullyApproved { accounting, .. } => Some(accounting),
            _ => None,
        }
    }
}
