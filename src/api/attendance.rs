use crate::auth::context::RequestContext;
use crate::error::AppError;
use crate::model::attendance::{Attendance, AttendanceFilter};
use crate::payroll::{calculator::round_money, month::Month};
use crate::policy;
use crate::store::{HrStore, StoreError};
use crate::utils::pagination::{PageQuery, Pagination};
use crate::validation::FieldErrors;
use actix_web::{HttpResponse, web};
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const ALREADY_CHECKED_IN: &str = "Already checked in today";
pub const NO_ACTIVE_CHECK_IN: &str = "No active check-in found for today";

#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub message: String,
    pub data: Attendance,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Officers only; others always see their own rows
    pub employee_id: Option<u64>,
    /// `YYYY-MM`
    pub month: Option<String>,
}

/// Elapsed time in hours, to the cent, never negative.
pub fn hours_between(check_in: NaiveDateTime, check_out: NaiveDateTime) -> Decimal {
    let minutes = (check_out - check_in).num_minutes().max(0);
    round_money(Decimal::from(minutes) / Decimal::from(60))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 201, description = "Checked in successfully", body = AttendanceResponse),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
) -> Result<HttpResponse, AppError> {
    let employee_id = policy::attendance::record(&ctx)?;
    let now = Utc::now().naive_utc();
    let today = now.date();

    let existing = store.find_attendance(employee_id, today).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Attendance lookup failed");
        ctx.server_error(e)
    })?;
    if existing.is_some() {
        return Err(AppError::bad_request(ALREADY_CHECKED_IN));
    }

    let id = match store.insert_check_in(employee_id, today, now).await {
        Ok(id) => id,
        // lost a race with a concurrent check-in
        Err(StoreError::Duplicate(_)) => return Err(AppError::bad_request(ALREADY_CHECKED_IN)),
        Err(e) => {
            tracing::error!(error = %e, employee_id, "Check-in failed");
            return Err(ctx.server_error(e));
        }
    };

    tracing::info!(employee_id, attendance_id = id, "Checked in");

    Ok(HttpResponse::Created().json(AttendanceResponse {
        message: "Checked in successfully".into(),
        data: Attendance {
            id,
            employee_id,
            date: today,
            check_in: Some(now),
            check_out: None,
            hours_worked: Decimal::ZERO,
        },
    }))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceResponse),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
) -> Result<HttpResponse, AppError> {
    let employee_id = policy::attendance::record(&ctx)?;
    let now = Utc::now().naive_utc();
    let today = now.date();

    let record = store
        .find_attendance(employee_id, today)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Attendance lookup failed");
            ctx.server_error(e)
        })?
        .filter(|a| a.check_out.is_none());

    let Some(check_in) = record.as_ref().and_then(|a| a.check_in) else {
        return Err(AppError::bad_request(NO_ACTIVE_CHECK_IN));
    };
    let hours_worked = hours_between(check_in, now);

    let closed = store
        .record_check_out(employee_id, today, now, hours_worked)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Check-out failed");
            ctx.server_error(e)
        })?;
    let Some(record) = record.filter(|_| closed) else {
        return Err(AppError::bad_request(NO_ACTIVE_CHECK_IN));
    };

    tracing::info!(employee_id, %hours_worked, "Checked out");

    Ok(HttpResponse::Ok().json(AttendanceResponse {
        message: "Checked out successfully".into(),
        data: Attendance {
            check_out: Some(now),
            hours_worked,
            ..record
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery, PageQuery),
    responses(
        (status = 200, body = AttendanceListResponse),
        (status = 403),
        (status = 422)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    query: web::Query<AttendanceQuery>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let scope = policy::attendance::list(&ctx)?;
    let page = Pagination::from(&*page);
    let query = query.into_inner();

    let month = match query.month.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(raw) => Some(
            raw.parse::<Month>()
                .map_err(|e| FieldErrors::single("month", e.to_string()))?,
        ),
        None => None,
    };
    let filter = AttendanceFilter {
        employee_id: scope.employee_filter(query.employee_id),
        month,
    };

    let (data, total) = store.list_attendance(&filter, page).await.map_err(|e| {
        tracing::error!(error = %e, employee_id = ?filter.employee_id, "Failed to list attendance");
        ctx.server_error(e)
    })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}
