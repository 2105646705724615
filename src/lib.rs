//! Labor Cost & Overtime Payroll Engine
//!
//! This crate computes per-employee payroll line items for a payroll period
//! from role salary components, an attendance ledger and tiered overtime
//! rules, and allocates each employee's labor cost to the work orders the
//! hours were charged to.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
