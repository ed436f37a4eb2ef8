//! Contract resolution for a pay period.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Contract, Employee, PayPeriod};

/// The contract a payroll is computed from, with its audit step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractResolution {
    /// The contract active on the period's first day.
    pub contract: Contract,
    /// The audit step recording this lookup.
    pub audit_step: AuditStep,
}

/// Resolves the contract active on the first day of `period`.
///
/// Returns `NoActiveContract` when no active contract covers that date.
pub fn resolve_contract(
    employee: &Employee,
    period: &PayPeriod,
    step_number: u32,
) -> EngineResult<ContractResolution> {
    let date = period.start_date();
    let contract = employee
        .active_contract_on(date)
        .cloned()
        .ok_or(EngineError::NoActiveContract {
            employee_id: employee.id,
            date,
        })?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "contract_resolution".to_string(),
        rule_name: "Contract Resolution".to_string(),
        basis: "employee contract history".to_string(),
        input: serde_json::json!({
            "employee_id": employee.id,
            "as_of": date.to_string(),
            "contracts_on_file": employee.contracts.len()
        }),
        output: serde_json::json!({
            "contract_id": contract.id.to_string(),
            "kind": contract.kind,
            "base_salary": contract.base_salary.normalize().to_string(),
            "allowance": contract.allowance.normalize().to_string()
        }),
        reasoning: format!(
            "Contract {} (started {}) is active on {}",
            contract.id, contract.start_date, date
        ),
    };

    Ok(ContractResolution {
        contract,
        audit_step,
    })
}
