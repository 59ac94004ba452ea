use crate::auth::context::RequestContext;
use crate::error::AppError;
use crate::model::leave_request::{LeaveFilter, LeaveRequest, LeaveStatus, LeaveType, NewLeave};
use crate::policy;
use crate::store::HrStore;
use crate::utils::pagination::{PageQuery, Pagination};
use crate::validation::{FieldErrors, Validate};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const NOT_FOUND: &str = "Leave request not found";
const ALREADY_PROCESSED: &str = "Leave request not found or already processed";

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "unpaid")]
    pub leave_type: Option<String>,
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-06", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Family matter")]
    pub reason: Option<String>,
}

impl Validate for CreateLeave {
    type Output = NewLeave;

    fn validate(self) -> Result<NewLeave, FieldErrors> {
        let mut errors = FieldErrors::new();
        let leave_type: Option<LeaveType> =
            errors.parse_choice("leave_type", self.leave_type, &LeaveType::NAMES);
        let start_date = errors.require("start_date", self.start_date);
        let end_date = errors.require("end_date", self.end_date);

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add(
                    "end_date",
                    "The end date must be a date after or equal to start date.",
                );
            }
        }

        let reason = self
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        errors.into_result(|| {
            Some(NewLeave {
                leave_type: leave_type?,
                start_date: start_date?,
                end_date: end_date?,
                reason,
            })
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveQuery {
    /// Filter by employee ID (officers only)
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    pub message: String,
    pub data: LeaveRequest,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

async fn load(store: &dyn HrStore, ctx: &RequestContext, id: u64) -> Result<LeaveRequest, AppError> {
    store
        .find_leave(id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id = id, "Failed to fetch leave request");
            ctx.server_error(e)
        })?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

async fn decide(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    id: u64,
    status: LeaveStatus,
) -> Result<HttpResponse, AppError> {
    policy::leave::decide(&ctx)?;

    let decided = store
        .decide_leave(id, status, ctx.user_id, Utc::now().naive_utc())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id = id, %status, "Failed to decide leave request");
            ctx.server_error(e)
        })?;
    if !decided {
        return Err(AppError::bad_request(ALREADY_PROCESSED));
    }

    tracing::info!(leave_id = id, %status, decided_by = ctx.user_id, "Leave request decided");

    let leave = load(store.get_ref(), &ctx, id).await?;
    let message = match status {
        LeaveStatus::Approved => "Leave approved",
        _ => "Leave rejected",
    };
    Ok(HttpResponse::Ok().json(LeaveResponse {
        message: message.into(),
        data: leave,
    }))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveResponse),
        (status = 403, description = "No employee profile"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    body: web::Json<CreateLeave>,
) -> Result<HttpResponse, AppError> {
    let employee_id = policy::leave::create(&ctx)?;
    let leave = body.into_inner().validate()?;

    let id = store.create_leave(employee_id, &leave).await.map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to create leave request");
        ctx.server_error(e)
    })?;
    let created = load(store.get_ref(), &ctx, id).await?;

    Ok(HttpResponse::Created().json(LeaveResponse {
        message: "Leave request submitted".into(),
        data: created,
    }))
}

/* =========================
Approve / reject
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{id}/approve",
    params(("id", description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave approved", body = LeaveResponse),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    decide(ctx, store, path.into_inner(), LeaveStatus::Approved).await
}

#[utoipa::path(
    put,
    path = "/api/leave/{id}/reject",
    params(("id", description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveResponse),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    decide(ctx, store, path.into_inner(), LeaveStatus::Rejected).await
}

/* =========================
Read
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{id}",
    params(("id", description = "Leave request ID")),
    responses(
        (status = 200, body = LeaveResponse),
        (status = 403),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave = load(store.get_ref(), &ctx, path.into_inner()).await?;
    policy::leave::view(&ctx, leave.employee_id)?;

    Ok(HttpResponse::Ok().json(LeaveResponse {
        message: "Leave request retrieved".into(),
        data: leave,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery, PageQuery),
    responses(
        (status = 200, body = LeaveListResponse),
        (status = 403),
        (status = 422)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    query: web::Query<LeaveQuery>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let scope = policy::leave::list(&ctx)?;
    let page = Pagination::from(&*page);
    let query = query.into_inner();

    let mut errors = FieldErrors::new();
    let status = match query.status.filter(|s| !s.trim().is_empty()) {
        Some(raw) => errors.parse_choice::<LeaveStatus>("status", Some(raw), &LeaveStatus::NAMES),
        None => None,
    };
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let filter = LeaveFilter {
        employee_id: scope.employee_filter(query.employee_id),
        status,
    };
    let (data, total) = store.list_leaves(&filter, page).await.map_err(|e| {
        tracing::error!(error = %e, employee_id = ?filter.employee_id, "Failed to list leave requests");
        ctx.server_error(e)
    })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}
