//! Calculation logic for the HR compliance engine.
//!
//! This module contains the pure rules the components are built from:
//! geofence distance, punctuality classification and worked hours for
//! attendance, and contract resolution, working days, gross pay, statutory
//! insurance, income tax and rounding for payroll. Payroll rules return an
//! [`AuditStep`](crate::models::AuditStep) alongside their result.

mod contract_resolution;
mod geo_distance;
mod gross_pay;
mod income_tax;
mod punctuality;
mod rounding;
mod statutory_insurance;
mod worked_hours;
mod working_days;

pub use contract_resolution::{ContractResolution, resolve_contract};
pub use geo_distance::{EARTH_RADIUS_M, haversine_distance_m};
pub use gross_pay::{GrossPayInputs, GrossPayResult, calculate_gross_pay};
pub use income_tax::{IncomeTaxResult, calculate_income_tax, progressive_tax};
pub use punctuality::classify_punctuality;
pub use rounding::round_to_minor_units;
pub use statutory_insurance::{StatutoryInsuranceResult, calculate_statutory_insurance};
pub use worked_hours::{WorkedHours, compute_worked_hours};
pub use working_days::{
    WorkingDaysResult, calculate_working_days, is_working_day, standard_working_days,
};
