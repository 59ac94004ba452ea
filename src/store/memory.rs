//! In-memory [`HrStore`] used by the HTTP tests.
//!
//! Mirrors the MySQL schema's unique and foreign-key constraints, and exposes
//! a few switches that reproduce races and failures a real database produces.

use super::{HrStore, StoreError, StoreResult};
use crate::model::{
    attendance::{Attendance, AttendanceFilter},
    employee::{Employee, EmployeeChanges, EmployeeFilter, NewEmployee},
    leave_request::{LeaveFilter, LeaveRequest, LeaveStatus, NewLeave},
    payroll::{
        Adjustment, NewPayroll, PayrollDetail, PayrollEmployee, PayrollFilter, PayrollRecord,
        PayrollUser,
    },
    user::{NewUser, UserAccount},
};
use crate::payroll::{
    calculator::{self, PayrollAmounts},
    month::Month,
};
use crate::utils::pagination::Pagination;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

struct RefreshToken {
    jti: String,
    expires_at: i64,
    revoked: bool,
}

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: Vec<UserAccount>,
    refresh_tokens: Vec<RefreshToken>,
    employees: Vec<Employee>,
    attendance: Vec<Attendance>,
    leaves: Vec<LeaveRequest>,
    payrolls: Vec<PayrollRecord>,
    adjustments: Vec<(u64, Adjustment, u64)>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// `find_attendance` misses, as if a concurrent check-in had not committed yet.
    pub hide_attendance_lookups: AtomicBool,
    /// `payroll_month_exists` misses, as if a concurrent batch had not committed yet.
    pub hide_payroll_months: AtomicBool,
    /// Batch insert fails when it reaches this employee.
    pub fail_payroll_insert_for: Mutex<Option<u64>>,
    /// Adjustment transaction fails after the row lock.
    pub fail_adjustments: AtomicBool,
}

fn page_of<T: Clone>(rows: Vec<T>, page: Pagination) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let data = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.per_page as usize)
        .collect();
    (data, total)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn seed_user(&self, username: &str, password_hash: &str, role_id: u8, employee_id: Option<u64>) -> u64 {
        let mut t = self.lock();
        let id = t.next_id();
        t.users.push(UserAccount {
            id,
            username: username.to_string(),
            password: password_hash.to_string(),
            role_id,
            employee_id,
            is_active: true,
            department: None,
        });
        id
    }

    pub fn set_user_active(&self, user_id: u64, active: bool) {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = active;
        }
    }

    /// Joins the linked employee's department like the SQL store.
    fn find_user(&self, pred: impl Fn(&UserAccount) -> bool) -> Option<UserAccount> {
        let t = self.lock();
        t.users.iter().find(|u| pred(u)).map(|u| {
            let department = u
                .employee_id
                .and_then(|id| t.employees.iter().find(|e| e.id == id))
                .map(|e| e.department.clone());
            UserAccount {
                department,
                ..u.clone()
            }
        })
    }

    pub fn seed_employee(&self, code: &str, department: &str, base_salary: Decimal) -> u64 {
        let mut t = self.lock();
        let id = t.next_id();
        t.employees.push(Employee {
            id,
            employee_code: code.to_string(),
            first_name: code.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@city.test", code.to_lowercase()),
            phone: None,
            department: department.to_string(),
            position: None,
            base_salary,
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            status: "active".to_string(),
        });
        id
    }

    pub fn seed_attendance(&self, employee_id: u64, date: NaiveDate, hours_worked: Decimal) {
        let mut t = self.lock();
        let id = t.next_id();
        t.attendance.push(Attendance {
            id,
            employee_id,
            date,
            check_in: date.and_hms_opt(8, 0, 0),
            check_out: date.and_hms_opt(16, 0, 0),
            hours_worked,
        });
    }

    pub fn seed_leave(
        &self,
        employee_id: u64,
        leave_type: crate::model::leave_request::LeaveType,
        status: LeaveStatus,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> u64 {
        let mut t = self.lock();
        let id = t.next_id();
        t.leaves.push(LeaveRequest {
            id,
            employee_id,
            leave_type,
            start_date,
            end_date,
            reason: None,
            status,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now().naive_utc(),
        });
        id
    }

    pub fn payroll_rows(&self) -> Vec<PayrollRecord> {
        self.lock().payrolls.clone()
    }

    pub fn attendance_rows(&self) -> Vec<Attendance> {
        self.lock().attendance.clone()
    }

    pub fn adjustment_count(&self) -> usize {
        self.lock().adjustments.len()
    }
}

#[async_trait]
impl HrStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        Ok(self.find_user(|u| u.username == username))
    }

    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<UserAccount>> {
        Ok(self.find_user(|u| u.id == id))
    }

    async fn create_user(&self, user: &NewUser) -> StoreResult<u64> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("users.username {}", user.username)));
        }
        if let Some(employee_id) = user.employee_id {
            if !t.employees.iter().any(|e| e.id == employee_id) {
                return Err(StoreError::ForeignKey(format!("employees.id {employee_id}")));
            }
        }
        let id = t.next_id();
        t.users.push(UserAccount {
            id,
            username: user.username.clone(),
            password: user.password_hash.clone(),
            role_id: user.role.id(),
            employee_id: user.employee_id,
            is_active: true,
            department: None,
        });
        Ok(id)
    }

    async fn touch_last_login(&self, _user_id: u64) -> StoreResult<()> {
        Ok(())
    }

    async fn save_refresh_token(&self, _user_id: u64, jti: &str, expires_at: i64) -> StoreResult<()> {
        self.lock().refresh_tokens.push(RefreshToken {
            jti: jti.to_string(),
            expires_at,
            revoked: false,
        });
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool> {
        let now = Utc::now().timestamp();
        let mut t = self.lock();
        match t
            .refresh_tokens
            .iter_mut()
            .find(|r| r.jti == jti && !r.revoked && r.expires_at > now)
        {
            Some(token) => {
                token.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_employee(&self, employee: &NewEmployee) -> StoreResult<u64> {
        let mut t = self.lock();
        if t
            .employees
            .iter()
            .any(|e| e.employee_code == employee.employee_code || e.email == employee.email)
        {
            return Err(StoreError::Duplicate("employees".into()));
        }
        let id = t.next_id();
        t.employees.push(Employee {
            id,
            employee_code: employee.employee_code.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            phone: employee.phone.clone(),
            department: employee.department.clone(),
            position: employee.position.clone(),
            base_salary: employee.base_salary,
            hire_date: employee.hire_date,
            status: "active".to_string(),
        });
        Ok(id)
    }

    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.lock().employees.iter().find(|e| e.id == id).cloned())
    }

    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<Employee>, i64)> {
        let t = self.lock();
        let mut rows: Vec<Employee> = t
            .employees
            .iter()
            .filter(|e| filter.department.as_ref().is_none_or(|d| &e.department == d))
            .filter(|e| filter.status.is_none_or(|s| e.status == s.to_string()))
            .filter(|e| {
                filter.search.as_ref().is_none_or(|q| {
                    e.first_name.contains(q.as_str())
                        || e.last_name.contains(q.as_str())
                        || e.email.contains(q.as_str())
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(page_of(rows, page))
    }

    async fn update_employee(&self, id: u64, changes: &EmployeeChanges) -> StoreResult<bool> {
        let mut t = self.lock();
        let Some(e) = t.employees.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        if let Some(v) = &changes.employee_code {
            e.employee_code = v.clone();
        }
        if let Some(v) = &changes.first_name {
            e.first_name = v.clone();
        }
        if let Some(v) = &changes.last_name {
            e.last_name = v.clone();
        }
        if let Some(v) = &changes.email {
            e.email = v.clone();
        }
        if let Some(v) = &changes.phone {
            e.phone = Some(v.clone());
        }
        if let Some(v) = &changes.department {
            e.department = v.clone();
        }
        if let Some(v) = &changes.position {
            e.position = Some(v.clone());
        }
        if let Some(v) = changes.base_salary {
            e.base_salary = v;
        }
        if let Some(v) = changes.hire_date {
            e.hire_date = v;
        }
        if let Some(v) = changes.status {
            e.status = v.to_string();
        }
        Ok(true)
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
        let mut t = self.lock();
        let referenced = t.payrolls.iter().any(|p| p.employee_id == id)
            || t.attendance.iter().any(|a| a.employee_id == id)
            || t.leaves.iter().any(|l| l.employee_id == id)
            || t.users.iter().any(|u| u.employee_id == Some(id));
        if referenced {
            return Err(StoreError::ForeignKey(format!("employees.id {id}")));
        }
        let before = t.employees.len();
        t.employees.retain(|e| e.id != id);
        Ok(t.employees.len() < before)
    }

    async fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.lock().employees.clone())
    }

    async fn find_attendance(&self, employee_id: u64, date: NaiveDate) -> StoreResult<Option<Attendance>> {
        if self.hide_attendance_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .lock()
            .attendance
            .iter()
            .find(|a| a.employee_id == employee_id && a.date == date)
            .cloned())
    }

    async fn insert_check_in(&self, employee_id: u64, date: NaiveDate, at: NaiveDateTime) -> StoreResult<u64> {
        let mut t = self.lock();
        if t
            .attendance
            .iter()
            .any(|a| a.employee_id == employee_id && a.date == date)
        {
            return Err(StoreError::Duplicate(format!(
                "attendance ({employee_id}, {date})"
            )));
        }
        let id = t.next_id();
        t.attendance.push(Attendance {
            id,
            employee_id,
            date,
            check_in: Some(at),
            check_out: None,
            hours_worked: Decimal::ZERO,
        });
        Ok(id)
    }

    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        at: NaiveDateTime,
        hours_worked: Decimal,
    ) -> StoreResult<bool> {
        let mut t = self.lock();
        match t
            .attendance
            .iter_mut()
            .find(|a| a.employee_id == employee_id && a.date == date && a.check_out.is_none())
        {
            Some(row) => {
                row.check_out = Some(at);
                row.hours_worked = hours_worked;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>> {
        Ok(self
            .lock()
            .attendance
            .iter()
            .filter(|a| a.employee_id == employee_id && a.date >= from && a.date <= to)
            .cloned()
            .collect())
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<Attendance>, i64)> {
        let mut rows: Vec<Attendance> = self
            .lock()
            .attendance
            .iter()
            .filter(|a| filter.employee_id.is_none_or(|id| a.employee_id == id))
            .filter(|a| filter.month.is_none_or(|m| m.contains(a.date)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(page_of(rows, page))
    }

    async fn create_leave(&self, employee_id: u64, leave: &NewLeave) -> StoreResult<u64> {
        let mut t = self.lock();
        if !t.employees.iter().any(|e| e.id == employee_id) {
            return Err(StoreError::ForeignKey(format!("employees.id {employee_id}")));
        }
        let id = t.next_id();
        t.leaves.push(LeaveRequest {
            id,
            employee_id,
            leave_type: leave.leave_type,
            start_date: leave.start_date,
            end_date: leave.end_date,
            reason: leave.reason.clone(),
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now().naive_utc(),
        });
        Ok(id)
    }

    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.lock().leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn decide_leave(
        &self,
        id: u64,
        status: LeaveStatus,
        decided_by: u64,
        at: NaiveDateTime,
    ) -> StoreResult<bool> {
        let mut t = self.lock();
        match t
            .leaves
            .iter_mut()
            .find(|l| l.id == id && l.status == LeaveStatus::Pending)
        {
            Some(leave) => {
                leave.status = status;
                leave.approved_by = Some(decided_by);
                leave.approved_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_leaves(
        &self,
        filter: &LeaveFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let mut rows: Vec<LeaveRequest> = self
            .lock()
            .leaves
            .iter()
            .filter(|l| filter.employee_id.is_none_or(|id| l.employee_id == id))
            .filter(|l| filter.status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page_of(rows, page))
    }

    async fn leaves_starting_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>> {
        Ok(self
            .lock()
            .leaves
            .iter()
            .filter(|l| l.employee_id == employee_id && l.start_date >= from && l.start_date <= to)
            .cloned()
            .collect())
    }

    async fn payroll_month_exists(&self, month: Month) -> StoreResult<bool> {
        if self.hide_payroll_months.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let key = month.to_string();
        Ok(self.lock().payrolls.iter().any(|p| p.month == key))
    }

    async fn insert_payroll_batch(&self, rows: &[NewPayroll]) -> StoreResult<u64> {
        let fail_for = *self.fail_payroll_insert_for.lock().unwrap();
        let mut t = self.lock();

        // stage everything, then commit at once
        let mut staged = Vec::with_capacity(rows.len());
        for row in rows {
            if fail_for == Some(row.employee_id) {
                return Err(StoreError::Database("simulated failure".into()));
            }
            let key = row.month.to_string();
            let clashes = t
                .payrolls
                .iter()
                .chain(staged.iter())
                .any(|p: &PayrollRecord| p.employee_id == row.employee_id && p.month == key);
            if clashes {
                return Err(StoreError::Duplicate(format!(
                    "payroll ({}, {key})",
                    row.employee_id
                )));
            }
            let id = t.next_id();
            staged.push(PayrollRecord {
                id,
                employee_id: row.employee_id,
                month: key,
                base_salary: row.base_salary,
                deductions: Decimal::ZERO,
                bonuses: Decimal::ZERO,
                net_salary: row.net_salary,
                generated_by: row.generated_by,
                generated_at: row.generated_at,
            });
        }

        let count = staged.len() as u64;
        t.payrolls.extend(staged);
        Ok(count)
    }

    async fn find_payroll(&self, id: u64) -> StoreResult<Option<PayrollDetail>> {
        let t = self.lock();
        let Some(payroll) = t.payrolls.iter().find(|p| p.id == id).cloned() else {
            return Ok(None);
        };
        let Some(e) = t.employees.iter().find(|e| e.id == payroll.employee_id) else {
            return Ok(None);
        };
        let user = t
            .users
            .iter()
            .find(|u| u.employee_id == Some(e.id))
            .map(|u| PayrollUser {
                id: u.id,
                username: u.username.clone(),
            });

        Ok(Some(PayrollDetail {
            employee: PayrollEmployee {
                id: e.id,
                employee_code: e.employee_code.clone(),
                first_name: e.first_name.clone(),
                last_name: e.last_name.clone(),
                email: e.email.clone(),
                department: e.department.clone(),
                user,
            },
            payroll,
        }))
    }

    async fn list_payrolls(
        &self,
        filter: &PayrollFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<PayrollRecord>, i64)> {
        let month = filter.month.map(|m| m.to_string());
        let mut rows: Vec<PayrollRecord> = self
            .lock()
            .payrolls
            .iter()
            .filter(|p| month.as_ref().is_none_or(|m| &p.month == m))
            .filter(|p| filter.employee_id.is_none_or(|id| p.employee_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.month.cmp(&a.month).then(a.id.cmp(&b.id)));
        Ok(page_of(rows, page))
    }

    async fn adjust_payroll(
        &self,
        id: u64,
        adjustment: &Adjustment,
        adjusted_by: u64,
    ) -> StoreResult<Option<PayrollRecord>> {
        let mut t = self.lock();
        let Some(row) = t.payrolls.iter().find(|p| p.id == id).cloned() else {
            return Ok(None);
        };
        if self.fail_adjustments.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated failure".into()));
        }

        let amounts = calculator::apply_adjustment(
            PayrollAmounts {
                base_salary: row.base_salary,
                bonuses: row.bonuses,
                deductions: row.deductions,
                net_salary: row.net_salary,
            },
            adjustment.kind,
            adjustment.amount,
        )
        .ok_or_else(|| StoreError::Database(format!("payroll {id} amounts out of range")))?;
        let updated = PayrollRecord {
            bonuses: amounts.bonuses,
            deductions: amounts.deductions,
            net_salary: amounts.net_salary,
            ..row
        };
        if let Some(slot) = t.payrolls.iter_mut().find(|p| p.id == id) {
            *slot = updated.clone();
        }
        t.adjustments.push((id, adjustment.clone(), adjusted_by));
        Ok(Some(updated))
    }
}
