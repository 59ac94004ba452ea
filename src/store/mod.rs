//! Persistence seam.
//!
//! Handlers and the payroll ledger talk to an [`HrStore`] rather than to a
//! pool directly. The production implementation is [`mysql::MySqlStore`];
//! tests run against an in-memory store with the same semantics, including
//! unique-constraint behaviour.

pub mod mysql;

#[cfg(test)]
pub mod memory;

use crate::model::{
    attendance::{Attendance, AttendanceFilter},
    employee::{Employee, EmployeeChanges, EmployeeFilter, NewEmployee},
    leave_request::{LeaveFilter, LeaveRequest, LeaveStatus, NewLeave},
    payroll::{Adjustment, NewPayroll, PayrollDetail, PayrollFilter, PayrollRecord},
    user::{NewUser, UserAccount},
};
use crate::payroll::month::Month;
use crate::utils::pagination::Pagination;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;
use rust_decimal::Decimal;

#[derive(Debug, Display)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[display(fmt = "duplicate entry: {}", _0)]
    Duplicate(String),

    /// The row is still referenced by other records.
    #[display(fmt = "row is referenced: {}", _0)]
    ForeignKey(String),

    #[display(fmt = "database error: {}", _0)]
    Database(String),
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait HrStore: Send + Sync {
    // users / tokens
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>>;
    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<UserAccount>>;
    async fn create_user(&self, user: &NewUser) -> StoreResult<u64>;
    async fn touch_last_login(&self, user_id: u64) -> StoreResult<()>;
    async fn save_refresh_token(&self, user_id: u64, jti: &str, expires_at: i64) -> StoreResult<()>;
    /// Revokes an active token; `false` if it was unknown or already revoked.
    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool>;

    // employees
    async fn create_employee(&self, employee: &NewEmployee) -> StoreResult<u64>;
    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>>;
    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<Employee>, i64)>;
    async fn update_employee(&self, id: u64, changes: &EmployeeChanges) -> StoreResult<bool>;
    async fn delete_employee(&self, id: u64) -> StoreResult<bool>;
    async fn all_employees(&self) -> StoreResult<Vec<Employee>>;

    // attendance
    async fn find_attendance(&self, employee_id: u64, date: NaiveDate) -> StoreResult<Option<Attendance>>;
    /// Fails with [`StoreError::Duplicate`] if the employee already has a row for `date`.
    async fn insert_check_in(&self, employee_id: u64, date: NaiveDate, at: NaiveDateTime) -> StoreResult<u64>;
    /// Closes the open row for `date`; `false` if there was none.
    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        at: NaiveDateTime,
        hours_worked: Decimal,
    ) -> StoreResult<bool>;
    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>>;
    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<Attendance>, i64)>;

    // leave
    async fn create_leave(&self, employee_id: u64, leave: &NewLeave) -> StoreResult<u64>;
    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>>;
    /// Moves a pending request to `status`; `false` if missing or already decided.
    async fn decide_leave(
        &self,
        id: u64,
        status: LeaveStatus,
        decided_by: u64,
        at: NaiveDateTime,
    ) -> StoreResult<bool>;
    async fn list_leaves(
        &self,
        filter: &LeaveFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<LeaveRequest>, i64)>;
    async fn leaves_starting_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>>;

    // payroll
    async fn payroll_month_exists(&self, month: Month) -> StoreResult<bool>;
    /// Inserts the whole batch in one transaction; nothing is kept on failure.
    async fn insert_payroll_batch(&self, rows: &[NewPayroll]) -> StoreResult<u64>;
    async fn find_payroll(&self, id: u64) -> StoreResult<Option<PayrollDetail>>;
    async fn list_payrolls(
        &self,
        filter: &PayrollFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<PayrollRecord>, i64)>;
    /// Applies the adjustment under a row lock and records it; `None` if the
    /// payroll row does not exist.
    async fn adjust_payroll(
        &self,
        id: u64,
        adjustment: &Adjustment,
        adjusted_by: u64,
    ) -> StoreResult<Option<PayrollRecord>>;
}
