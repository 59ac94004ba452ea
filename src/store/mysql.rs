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
use crate::utils::{
    db_utils::{SqlValue, UpdateBuilder, WhereClause, bind_query, bind_query_as, bind_scalar},
    pagination::Pagination,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool, Row, mysql::MySqlRow};
use std::str::FromStr;
use tracing::debug;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKey(db_err.message().to_string());
            }
        }
        StoreError::Database(e.to_string())
    }
}

fn parse_column<T: FromStr>(row: &MySqlRow, column: &str) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|_| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unexpected value '{raw}'").into(),
    })
}

// leave_type / status are VARCHAR columns holding the enum names
impl<'r> FromRow<'r, MySqlRow> for LeaveRequest {
    fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
        Ok(LeaveRequest {
            id: row.try_get("id")?,
            employee_id: row.try_get("employee_id")?,
            leave_type: parse_column(row, "leave_type")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            reason: row.try_get("reason")?,
            status: parse_column(row, "status")?,
            approved_by: row.try_get("approved_by")?,
            approved_at: row.try_get("approved_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(FromRow)]
struct PayrollDetailRow {
    id: u64,
    employee_id: u64,
    month: String,
    base_salary: Decimal,
    deductions: Decimal,
    bonuses: Decimal,
    net_salary: Decimal,
    generated_by: u64,
    generated_at: NaiveDateTime,
    employee_code: String,
    first_name: String,
    last_name: String,
    email: String,
    department: String,
    user_id: Option<u64>,
    username: Option<String>,
}

impl From<PayrollDetailRow> for PayrollDetail {
    fn from(r: PayrollDetailRow) -> Self {
        let user = match (r.user_id, r.username) {
            (Some(id), Some(username)) => Some(PayrollUser { id, username }),
            _ => None,
        };

        PayrollDetail {
            payroll: PayrollRecord {
                id: r.id,
                employee_id: r.employee_id,
                month: r.month,
                base_salary: r.base_salary,
                deductions: r.deductions,
                bonuses: r.bonuses,
                net_salary: r.net_salary,
                generated_by: r.generated_by,
                generated_at: r.generated_at,
            },
            employee: PayrollEmployee {
                id: r.employee_id,
                employee_code: r.employee_code,
                first_name: r.first_name,
                last_name: r.last_name,
                email: r.email,
                department: r.department,
                user,
            },
        }
    }
}

const EMPLOYEE_COLUMNS: &str = "id, employee_code, first_name, last_name, email, phone, \
     department, position, base_salary, hire_date, status";
const ATTENDANCE_COLUMNS: &str = "id, employee_id, date, check_in, check_out, hours_worked";
const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, reason, status, \
     approved_by, approved_at, created_at";
const PAYROLL_COLUMNS: &str = "id, employee_id, month, base_salary, deductions, bonuses, \
     net_salary, generated_by, generated_at";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn paginate<T>(
        &self,
        table: &str,
        columns: &str,
        clause: &WhereClause,
        order_by: &str,
        page: Pagination,
    ) -> StoreResult<(Vec<T>, i64)>
    where
        T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
    {
        let where_sql = clause.sql();

        let count_sql = format!("SELECT COUNT(*) FROM {table} {where_sql}");
        debug!(sql = %count_sql, bindings = ?clause.values(), "Counting rows");
        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql), clause.values())
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            "SELECT {columns} FROM {table} {where_sql} ORDER BY {order_by} LIMIT ? OFFSET ?"
        );
        debug!(sql = %data_sql, page = page.page, per_page = page.per_page, "Fetching rows");
        let rows = bind_query_as(sqlx::query_as::<_, T>(&data_sql), clause.values())
            .bind(page.per_page as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}

/// Account joined with the linked employee's department.
const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.password, u.role_id, u.employee_id, u.is_active,
           e.department
    FROM users u
    LEFT JOIN employees e ON e.id = u.employee_id
"#;

#[async_trait]
impl HrStore for MySqlStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        let sql = format!("{USER_SELECT} WHERE u.username = ?");
        let user = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<UserAccount>> {
        let sql = format!("{USER_SELECT} WHERE u.id = ?");
        let user = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create_user(&self, user: &NewUser) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password, role_id, employee_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.id())
        .bind(user.employee_id)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn touch_last_login(&self, user_id: u64) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_refresh_token(&self, user_id: u64, jti: &str, expires_at: i64) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, FROM_UNIXTIME(?))
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = ?
            AND revoked = FALSE
            AND expires_at > NOW()
            "#,
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_employee(&self, employee: &NewEmployee) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (employee_code, first_name, last_name, email, phone, department, position,
             base_salary, hire_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.employee_code)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(employee.base_salary)
        .bind(employee.hire_date)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn find_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<Employee>, i64)> {
        let mut clause = WhereClause::new();

        if let Some(department) = &filter.department {
            clause.push("department = ?", [SqlValue::from(department.as_str())]);
        }

        if let Some(status) = filter.status {
            clause.push("status = ?", [SqlValue::from(status.to_string())]);
        }

        if let Some(search) = &filter.search {
            let like = format!("%{}%", search);
            clause.push(
                "(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)",
                [
                    SqlValue::from(like.clone()),
                    SqlValue::from(like.clone()),
                    SqlValue::from(like),
                ],
            );
        }

        self.paginate("employees", EMPLOYEE_COLUMNS, &clause, "id DESC", page)
            .await
    }

    async fn update_employee(&self, id: u64, changes: &EmployeeChanges) -> StoreResult<bool> {
        let update = UpdateBuilder::new("employees")
            .set_opt("employee_code", changes.employee_code.clone())
            .set_opt("first_name", changes.first_name.clone())
            .set_opt("last_name", changes.last_name.clone())
            .set_opt("email", changes.email.clone())
            .set_opt("phone", changes.phone.clone())
            .set_opt("department", changes.department.clone())
            .set_opt("position", changes.position.clone())
            .set_opt("base_salary", changes.base_salary)
            .set_opt("hire_date", changes.hire_date)
            .set_opt("status", changes.status.map(|s| s.to_string()))
            .build("id", id);

        let Some(update) = update else {
            return Ok(self.find_employee(id).await?.is_some());
        };

        let result = bind_query(sqlx::query(&update.sql), &update.values)
            .execute(&self.pool)
            .await?;

        // MySQL reports 0 affected rows when the values did not change
        if result.rows_affected() == 0 {
            return Ok(self.find_employee(id).await?.is_some());
        }
        Ok(true)
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn all_employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn find_attendance(&self, employee_id: u64, date: NaiveDate) -> StoreResult<Option<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        );
        let row = sqlx::query_as::<_, Attendance>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_check_in(&self, employee_id: u64, date: NaiveDate, at: NaiveDateTime) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, check_in)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn record_check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        at: NaiveDateTime,
        hours_worked: Decimal,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, hours_worked = ?
            WHERE employee_id = ?
            AND date = ?
            AND check_out IS NULL
            "#,
        )
        .bind(at)
        .bind(hours_worked)
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE employee_id = ? AND date BETWEEN ? AND ? ORDER BY date"
        );
        let rows = sqlx::query_as::<_, Attendance>(&sql)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<Attendance>, i64)> {
        let mut clause = WhereClause::new();

        if let Some(employee_id) = filter.employee_id {
            clause.push("employee_id = ?", [SqlValue::from(employee_id)]);
        }

        if let Some(month) = filter.month {
            clause.push(
                "date BETWEEN ? AND ?",
                [SqlValue::from(month.first_day()), SqlValue::from(month.last_day())],
            );
        }

        self.paginate("attendance", ATTENDANCE_COLUMNS, &clause, "date DESC, id DESC", page)
            .await
    }

    async fn create_leave(&self, employee_id: u64, leave: &NewLeave) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, reason)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(leave.leave_type.to_string())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn find_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(leave)
    }

    async fn decide_leave(
        &self,
        id: u64,
        status: LeaveStatus,
        decided_by: u64,
        at: NaiveDateTime,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approved_by = ?, approved_at = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(status.to_string())
        .bind(decided_by)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_leaves(
        &self,
        filter: &LeaveFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let mut clause = WhereClause::new();

        if let Some(employee_id) = filter.employee_id {
            clause.push("employee_id = ?", [SqlValue::from(employee_id)]);
        }

        if let Some(status) = filter.status {
            clause.push("status = ?", [SqlValue::from(status.to_string())]);
        }

        self.paginate("leave_requests", LEAVE_COLUMNS, &clause, "created_at DESC, id DESC", page)
            .await
    }

    async fn leaves_starting_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests \
             WHERE employee_id = ? AND start_date BETWEEN ? AND ?"
        );
        let rows = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn payroll_month_exists(&self, month: Month) -> StoreResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payroll WHERE month = ?")
            .bind(month.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn insert_payroll_batch(&self, rows: &[NewPayroll]) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO payroll
                (employee_id, month, base_salary, deductions, bonuses, net_salary,
                 generated_by, generated_at)
                VALUES (?, ?, ?, 0, 0, ?, ?, ?)
                "#,
            )
            .bind(row.employee_id)
            .bind(row.month.to_string())
            .bind(row.base_salary)
            .bind(row.net_salary)
            .bind(row.generated_by)
            .bind(row.generated_at)
            .execute(&mut *tx)
            .await?;
        }

        // dropping `tx` on an early return rolls the batch back
        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn find_payroll(&self, id: u64) -> StoreResult<Option<PayrollDetail>> {
        let row = sqlx::query_as::<_, PayrollDetailRow>(
            r#"
            SELECT p.id, p.employee_id, p.month, p.base_salary, p.deductions, p.bonuses,
                   p.net_salary, p.generated_by, p.generated_at,
                   e.employee_code, e.first_name, e.last_name, e.email, e.department,
                   u.id AS user_id, u.username
            FROM payroll p
            JOIN employees e ON e.id = p.employee_id
            LEFT JOIN users u ON u.employee_id = e.id
            WHERE p.id = ?
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PayrollDetail::from))
    }

    async fn list_payrolls(
        &self,
        filter: &PayrollFilter,
        page: Pagination,
    ) -> StoreResult<(Vec<PayrollRecord>, i64)> {
        let mut clause = WhereClause::new();

        if let Some(month) = filter.month {
            clause.push("month = ?", [SqlValue::from(month.to_string())]);
        }

        if let Some(employee_id) = filter.employee_id {
            clause.push("employee_id = ?", [SqlValue::from(employee_id)]);
        }

        self.paginate("payroll", PAYROLL_COLUMNS, &clause, "month DESC, id ASC", page)
            .await
    }

    async fn adjust_payroll(
        &self,
        id: u64,
        adjustment: &Adjustment,
        adjusted_by: u64,
    ) -> StoreResult<Option<PayrollRecord>> {
        let mut tx = self.pool.begin().await?;

        let select_sql = format!("SELECT {PAYROLL_COLUMNS} FROM payroll WHERE id = ? FOR UPDATE");
        let current = sqlx::query_as::<_, PayrollRecord>(&select_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(None);
        };

        let amounts = calculator::apply_adjustment(
            PayrollAmounts {
                base_salary: current.base_salary,
                bonuses: current.bonuses,
                deductions: current.deductions,
                net_salary: current.net_salary,
            },
            adjustment.kind,
            adjustment.amount,
        )
        .ok_or_else(|| StoreError::Database(format!("payroll {id} amounts out of range")))?;

        sqlx::query(
            r#"
            UPDATE payroll
            SET bonuses = ?, deductions = ?, net_salary = ?
            WHERE id = ?
            "#,
        )
        .bind(amounts.bonuses)
        .bind(amounts.deductions)
        .bind(amounts.net_salary)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payroll_adjustments
            (payroll_id, adjustment_type, amount, note, adjusted_by)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(adjustment.kind.to_string())
        .bind(adjustment.amount)
        .bind(&adjustment.note)
        .bind(adjusted_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(PayrollRecord {
            bonuses: amounts.bonuses,
            deductions: amounts.deductions,
            net_salary: amounts.net_salary,
            ..current
        }))
    }
}
