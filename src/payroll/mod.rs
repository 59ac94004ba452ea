//! Payroll computation: monthly aggregation of attendance and unpaid leave,
//! the attendance-driven salary formula, and the ledger that persists one row
//! per employee per month.

pub mod aggregate;
pub mod calculator;
pub mod ledger;
pub mod month;
