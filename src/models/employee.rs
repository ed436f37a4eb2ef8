//! Employee model and contract history.
//!
//! This module defines the [`Employee`] struct and its [`Contract`] records.
//! An employee has at most one active contract on any date; renewals append
//! a new contract rather than editing the old one.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of labour contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Probationary contract, usually a few months.
    Probation,
    /// Fixed-term contract with an end date.
    FixedTerm,
    /// Indefinite contract without an end date.
    Indefinite,
}

/// Lifecycle status of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// The contract is in force between its start and end dates.
    Active,
    /// The contract ran to its end date.
    Expired,
    /// The contract was ended early.
    Terminated,
}

/// A labour contract carrying the salary terms payroll is computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier for the contract.
    pub id: Uuid,
    /// The kind of contract.
    pub kind: ContractKind,
    /// Monthly base salary.
    pub base_salary: Decimal,
    /// Fixed monthly allowance paid on top of the prorated base.
    #[serde(default)]
    pub allowance: Decimal,
    /// First day covered (inclusive).
    pub start_date: NaiveDate,
    /// Last day covered (inclusive); `None` for indefinite contracts.
    pub end_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: ContractStatus,
}

impl Contract {
    /// Returns true if the contract is active and its dates cover `date`.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_engine::models::{Contract, ContractKind, ContractStatus};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    /// use uuid::Uuid;
    ///
    /// let contract = Contract {
    ///     id: Uuid::nil(),
    ///     kind: ContractKind::FixedTerm,
    ///     base_salary: Decimal::new(15_000_000, 0),
    ///     allowance: Decimal::ZERO,
    ///     start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
    ///     status: ContractStatus::Active,
    /// };
    /// assert!(contract.covers(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
    /// assert!(!contract.covers(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    /// ```
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.status == ContractStatus::Active
            && self.start_date <= date
            && self.end_date.is_none_or(|end| date <= end)
    }
}

/// Represents an employee as supplied by the HR directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: i64,
    /// Display name.
    pub full_name: String,
    /// Number of registered dependents for the income tax allowance.
    #[serde(default)]
    pub dependents: u32,
    /// Contract history, oldest first.
    #[serde(default)]
    pub contracts: Vec<Contract>,
}

impl Employee {
    /// Returns the contract in force on `date`.
    ///
    /// When a renewal overlaps its predecessor, the contract that started
    /// most recently wins.
    pub fn active_contract_on(&self, date: NaiveDate) -> Option<&Contract> {
        self.contracts
            .iter()
            .filter(|c| c.covers(date))
            .max_by_key(|c| c.start_date)
    }

    /// Appends a renewed contract to the history.
    pub fn renew_contract(&mut self, contract: Contract) {
        self.contracts.push(contract);
    }
}
