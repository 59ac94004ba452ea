//! Payroll persistence: batch generation, adjustments and scoped reads.
//!
//! Every operation authorizes the caller first, then validates the request,
//! then touches the store.

use crate::{
    auth::context::RequestContext,
    error::AppError,
    model::payroll::{Adjustment, NewPayroll, PayrollDetail, PayrollFilter, PayrollRecord},
    payroll::{aggregate, calculator, month::Month},
    policy,
    store::{HrStore, StoreError},
    utils::pagination::Pagination,
    validation::Validate,
};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

pub const ALREADY_GENERATED: &str = "Payroll already generated for this month";
pub const NOT_FOUND: &str = "Payroll record not found";

/// Computes and stores one payroll row per employee for the requested month.
///
/// Returns the number of employees processed. The batch is all-or-nothing:
/// a month that already has rows, or a concurrent run that wins the unique
/// constraint, yields [`AppError::Conflict`] and nothing is written.
#[instrument(name = "payroll_generate", skip_all, fields(user_id = ctx.user_id))]
pub async fn generate<R>(store: &dyn HrStore, ctx: &RequestContext, request: R) -> Result<u64, AppError>
where
    R: Validate<Output = Month>,
{
    policy::payroll::generate(ctx)?;
    let month = request.validate()?;

    let exists = store.payroll_month_exists(month).await.map_err(|e| {
        error!(error = %e, %month, "Failed to check existing payroll");
        ctx.server_error(e)
    })?;
    if exists {
        info!(%month, "Payroll month already generated");
        return Err(AppError::conflict(ALREADY_GENERATED));
    }

    let employees = store.all_employees().await.map_err(|e| {
        error!(error = %e, %month, "Failed to load employees");
        ctx.server_error(e)
    })?;

    let generated_at = Utc::now().naive_utc();
    let (from, to) = (month.first_day(), month.last_day());
    let mut rows = Vec::with_capacity(employees.len());

    for employee in &employees {
        let attendance = store
            .attendance_between(employee.id, from, to)
            .await
            .map_err(|e| {
                error!(error = %e, employee_id = employee.id, %month, "Failed to load attendance");
                ctx.server_error(e)
            })?;
        let leaves = store
            .leaves_starting_between(employee.id, from, to)
            .await
            .map_err(|e| {
                error!(error = %e, employee_id = employee.id, %month, "Failed to load leave");
                ctx.server_error(e)
            })?;

        let hours = aggregate::worked_hours(&attendance, month);
        let unpaid_days = aggregate::unpaid_leave_days(&leaves, month);
        let pay = calculator::calculate(employee.base_salary, hours, unpaid_days);

        debug!(
            employee_id = employee.id,
            %hours,
            unpaid_days,
            net_salary = %pay.net_salary,
            "Computed payroll"
        );

        rows.push(NewPayroll {
            employee_id: employee.id,
            month,
            base_salary: employee.base_salary,
            net_salary: pay.net_salary,
            generated_by: ctx.user_id,
            generated_at,
        });
    }

    match store.insert_payroll_batch(&rows).await {
        Ok(count) => {
            info!(%month, employees_processed = count, "Payroll generated");
            Ok(count)
        }
        Err(StoreError::Duplicate(detail)) => {
            warn!(%month, %detail, "Concurrent payroll generation lost the race");
            Err(AppError::conflict(ALREADY_GENERATED))
        }
        Err(e) => {
            error!(error = %e, %month, "Payroll batch rolled back");
            Err(ctx.server_error(e))
        }
    }
}

/// Adds a bonus or deduction to an existing payroll row and returns the
/// updated row.
#[instrument(name = "payroll_adjust", skip_all, fields(user_id = ctx.user_id, payroll_id = payroll_id))]
pub async fn add_adjustment<R>(
    store: &dyn HrStore,
    ctx: &RequestContext,
    payroll_id: u64,
    request: R,
) -> Result<PayrollRecord, AppError>
where
    R: Validate<Output = Adjustment>,
{
    policy::payroll::adjust(ctx)?;
    let adjustment = request.validate()?;

    match store.adjust_payroll(payroll_id, &adjustment, ctx.user_id).await {
        Ok(Some(record)) => {
            info!(
                payroll_id,
                kind = %adjustment.kind,
                amount = %adjustment.amount,
                net_salary = %record.net_salary,
                "Payroll adjusted"
            );
            Ok(record)
        }
        Ok(None) => Err(AppError::not_found(NOT_FOUND)),
        Err(e) => {
            error!(error = %e, payroll_id, "Payroll adjustment rolled back");
            Err(ctx.server_error(e))
        }
    }
}

pub async fn list<R>(
    store: &dyn HrStore,
    ctx: &RequestContext,
    query: R,
    page: Pagination,
) -> Result<(Vec<PayrollRecord>, i64), AppError>
where
    R: Validate<Output = PayrollFilter>,
{
    let scope = policy::payroll::list(ctx)?;
    let mut filter = query.validate()?;
    filter.employee_id = scope.employee_filter(filter.employee_id);

    store.list_payrolls(&filter, page).await.map_err(|e| {
        error!(error = %e, employee_id = ?filter.employee_id, "Failed to list payroll");
        ctx.server_error(e)
    })
}

pub async fn show(store: &dyn HrStore, ctx: &RequestContext, payroll_id: u64) -> Result<PayrollDetail, AppError> {
    let detail = store
        .find_payroll(payroll_id)
        .await
        .map_err(|e| {
            error!(error = %e, payroll_id, "Failed to fetch payroll");
            ctx.server_error(e)
        })?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    policy::payroll::view(ctx, detail.payroll.employee_id)?;
    Ok(detail)
}
