//! Employee directory seam.
//!
//! Employees and their contracts are owned by the surrounding HR system; the
//! engine only reads them through [`EmployeeDirectory`].

use dashmap::DashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{Contract, Employee};

/// Read access to employees and their contract history.
pub trait EmployeeDirectory: Send + Sync {
    /// Returns a snapshot of the employee.
    ///
    /// Fails with `EmployeeNotFound` for unknown ids.
    fn employee(&self, employee_id: i64) -> EngineResult<Employee>;
}

/// A directory held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeDirectory {
    employees: DashMap<i64, Employee>,
}

impl InMemoryEmployeeDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee.
    pub fn upsert(&self, employee: Employee) {
        self.employees.insert(employee.id, employee);
    }

    /// Appends a renewed contract to an employee's history.
    pub fn renew_contract(&self, employee_id: i64, contract: Contract) -> EngineResult<()> {
        let mut employee = self
            .employees
            .get_mut(&employee_id)
            .ok_or(EngineError::EmployeeNotFound { employee_id })?;
        employee.renew_contract(contract);
        Ok(())
    }

    /// Number of employees held.
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Returns true when no employees are held.
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn employee(&self, employee_id: i64) -> EngineResult<Employee> {
        self.employees
            .get(&employee_id)
            .map(|e| e.clone())
            .ok_or(EngineError::EmployeeNotFound { employee_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractKind, ContractStatus};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn employee(id: i64) -> Employee {
        Employee {
            id,
            full_name: format!("Employee {}", id),
            dependents: 0,
            contracts: vec![],
        }
    }

    #[test]
    fn test_unknown_employee() {
        let directory = InMemoryEmployeeDirectory::new();
        assert!(matches!(
            directory.employee(9),
            Err(EngineError::EmployeeNotFound { employee_id: 9 })
        ));
    }

    #[test]
    fn test_renew_contract_appends() {
        let directory = InMemoryEmployeeDirectory::new();
        directory.upsert(employee(1));
        directory
            .renew_contract(
                1,
                Contract {
                    id: Uuid::new_v4(),
                    kind: ContractKind::Probation,
                    base_salary: Decimal::new(8_000_000, 0),
                    allowance: Decimal::ZERO,
                    start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2024, 2, 29),
                    status: ContractStatus::Active,
                },
            )
            .unwrap();

        assert_eq!(directory.employee(1).unwrap().contracts.len(), 1);
        assert_eq!(directory.len(), 1);
        assert!(directory.renew_contract(2, directory.employee(1).unwrap().contracts[0].clone()).is_err());
    }
}
