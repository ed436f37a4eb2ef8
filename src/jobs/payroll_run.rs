//! Monthly payroll batch run.

use std::collections::{BTreeSet, HashMap};

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::engine::HrEngine;
use crate::error::{EngineResult, ErrorKind};
use crate::models::{PayPeriod, PayrollAdjustments, PayrollRecord};

/// One employee the run could not compute.
#[derive(Debug, Clone)]
pub struct PayrollRunFailure {
    /// The employee whose payroll failed.
    pub employee_id: i64,
    /// The error message.
    pub message: String,
    /// The error kind; `None` when the worker task itself failed.
    pub kind: Option<ErrorKind>,
}

/// Outcome of a monthly run.
#[derive(Debug, Clone)]
pub struct PayrollRunReport {
    /// The period computed.
    pub period: PayPeriod,
    /// Stored drafts, ordered by employee id.
    pub succeeded: Vec<PayrollRecord>,
    /// Failures, ordered by employee id.
    pub failed: Vec<PayrollRunFailure>,
}

impl PayrollRunReport {
    /// True if any failure is a configuration error, which affects every
    /// employee and needs an operator.
    pub fn has_configuration_failure(&self) -> bool {
        self.failed
            .iter()
            .any(|f| f.kind == Some(ErrorKind::Configuration))
    }
}

/// Failures for employees whose task ended without reporting an outcome.
fn unfinished(pending: BTreeSet<i64>, cause: Option<&str>) -> Vec<PayrollRunFailure> {
    pending
        .into_iter()
        .map(|employee_id| {
            warn!(employee_id, "Payroll task ended without an outcome");
            PayrollRunFailure {
                employee_id,
                message: format!(
                    "payroll task did not complete: {}",
                    cause.unwrap_or("no outcome reported")
                ),
                kind: None,
            }
        })
        .collect()
}

/// Computes draft payrolls for `employee_ids` in parallel.
///
/// Each employee runs on the blocking pool; a failure is recorded in the
/// report and does not stop the others. Every distinct id appears exactly
/// once, in `succeeded` or in `failed`. Employees missing from `adjustments`
/// get none.
///
/// Fails only with `InvalidPeriod`.
pub async fn run_monthly_payroll(
    engine: HrEngine,
    employee_ids: Vec<i64>,
    year: i32,
    month: u32,
    adjustments: HashMap<i64, PayrollAdjustments>,
) -> EngineResult<PayrollRunReport> {
    let period = PayPeriod::new(year, month)?;
    let employee_ids: BTreeSet<i64> = employee_ids.into_iter().collect();
    info!(period = %period, employees = employee_ids.len(), "Starting payroll run");

    let mut pending = employee_ids.clone();
    let mut set = JoinSet::new();
    for employee_id in employee_ids {
        let engine = engine.clone();
        let adjustments = adjustments.get(&employee_id).cloned().unwrap_or_default();
        set.spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                engine.payroll().compute_payroll(employee_id, year, month, &adjustments)
            })
            .await;
            (employee_id, result)
        });
    }

    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    let mut task_error = None;
    while let Some(joined) = set.join_next().await {
        let (employee_id, result) = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(period = %period, error = %e, "Payroll run task failed");
                task_error = Some(e.to_string());
                continue;
            }
        };
        pending.remove(&employee_id);
        match result {
            Ok(Ok(record)) => succeeded.push(record),
            Ok(Err(e)) => {
                warn!(employee_id, period = %period, error = %e, "Payroll failed for employee");
                failed.push(PayrollRunFailure {
                    employee_id,
                    message: e.to_string(),
                    kind: Some(e.kind()),
                });
            }
            Err(e) => {
                error!(employee_id, period = %period, error = %e, "Payroll worker panicked");
                failed.push(PayrollRunFailure {
                    employee_id,
                    message: e.to_string(),
                    kind: None,
                });
            }
        }
    }
    failed.extend(unfinished(pending, task_error.as_deref()));

    succeeded.sort_by_key(|r| r.employee_id);
    failed.sort_by_key(|f| f.employee_id);

    info!(
        period = %period,
        succeeded = succeeded.len(),
        failed = failed.len(),
        "Payroll run finished"
    );

    Ok(PayrollRunReport {
        period,
        succeeded,
        failed,
    })
}
