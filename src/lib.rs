//! HR compliance engine
//!
//! This crate validates geofenced attendance, runs two-step leave approval,
//! and computes statutory payroll from contracts, attendance and approved
//! leave. Every payroll record carries an audit trace of the rules applied.

#![warn(missing_docs)]

pub mod calculation;
pub mod clock;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;
pub mod store;

pub use engine::HrEngine;
