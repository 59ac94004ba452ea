use actix_web::{HttpResponse, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::context::RequestContext;
use crate::error::AppError;
use crate::model::payroll::{Adjustment, AdjustmentKind, PayrollDetail, PayrollFilter, PayrollRecord};
use crate::payroll::{ledger, month::Month};
use crate::store::HrStore;
use crate::utils::pagination::{PageQuery, Pagination};
use crate::validation::{FieldErrors, Validate};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GeneratePayroll {
    #[schema(example = "2026-01")]
    pub month: Option<String>,
}

impl Validate for GeneratePayroll {
    type Output = Month;

    fn validate(self) -> Result<Month, FieldErrors> {
        let mut errors = FieldErrors::new();
        let raw = errors.require_text("month", self.month);
        let month = raw.and_then(|raw| match raw.parse::<Month>() {
            Ok(month) => Some(month),
            Err(e) => {
                errors.add("month", e.to_string());
                None
            }
        });
        errors.into_result(|| month)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdjustPayroll {
    #[serde(rename = "type")]
    #[schema(example = "bonus")]
    pub kind: Option<String>,

    #[schema(example = "100.00", value_type = Option<String>)]
    pub amount: Option<Decimal>,

    #[schema(example = "Overtime in January")]
    pub note: Option<String>,
}

impl Validate for AdjustPayroll {
    type Output = Adjustment;

    fn validate(self) -> Result<Adjustment, FieldErrors> {
        let mut errors = FieldErrors::new();
        let kind: Option<AdjustmentKind> = errors.parse_choice("type", self.kind, &AdjustmentKind::NAMES);
        let amount = errors
            .require("amount", self.amount)
            .and_then(|amount| errors.check_money("amount", "amount", amount));
        let note = self
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if note.as_ref().is_some_and(|n| n.chars().count() > 255) {
            errors.add("note", "The note may not be greater than 255 characters.");
        }

        errors.into_result(|| Some(Adjustment { kind: kind?, amount: amount?, note }))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PayrollQuery {
    /// `YYYY-MM`
    pub month: Option<String>,
    /// Ignored for callers who may only see their own payroll
    pub employee_id: Option<u64>,
}

impl Validate for PayrollQuery {
    type Output = PayrollFilter;

    fn validate(self) -> Result<PayrollFilter, FieldErrors> {
        let mut errors = FieldErrors::new();
        let month = match self.month.filter(|m| !m.trim().is_empty()) {
            Some(raw) => match raw.trim().parse::<Month>() {
                Ok(m) => Some(m),
                Err(e) => {
                    errors.add("month", e.to_string());
                    None
                }
            },
            None => None,
        };
        errors.into_result(|| {
            Some(PayrollFilter {
                month,
                employee_id: self.employee_id,
            })
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    #[schema(example = "Payroll generated successfully")]
    pub message: String,
    #[schema(example = 42)]
    pub employees_processed: u64,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<PayrollRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct PayrollDetailResponse {
    pub message: String,
    pub data: PayrollDetail,
}

#[derive(Serialize, ToSchema)]
pub struct PayrollResponse {
    pub message: String,
    pub data: PayrollRecord,
}

#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    request_body = GeneratePayroll,
    responses(
        (status = 201, body = GenerateResponse),
        (status = 403, description = "Caller may not generate payroll"),
        (status = 409, description = "Payroll already generated for this month"),
        (status = 422, description = "Invalid month"),
        (status = 500)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    body: web::Json<GeneratePayroll>,
) -> Result<HttpResponse, AppError> {
    let processed = ledger::generate(store.get_ref(), &ctx, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(GenerateResponse {
        message: "Payroll generated successfully".into(),
        employees_processed: processed,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery, PageQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse),
        (status = 403),
        (status = 422)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    query: web::Query<PayrollQuery>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = Pagination::from(&*page);
    let (data, total) = ledger::list(store.get_ref(), &ctx, query.into_inner(), page).await?;

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(("payroll_id", description = "Payroll ID")),
    responses(
        (status = 200, body = PayrollDetailResponse),
        (status = 403),
        (status = 404, description = "Payroll record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let detail = ledger::show(store.get_ref(), &ctx, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(PayrollDetailResponse {
        message: "Payroll retrieved successfully".into(),
        data: detail,
    }))
}

#[utoipa::path(
    post,
    path = "/api/payroll/{payroll_id}/adjust",
    request_body = AdjustPayroll,
    params(("payroll_id", description = "Payroll ID")),
    responses(
        (status = 200, body = PayrollResponse),
        (status = 403),
        (status = 404, description = "Payroll record not found"),
        (status = 422),
        (status = 500)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn adjust_payroll(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
    body: web::Json<AdjustPayroll>,
) -> Result<HttpResponse, AppError> {
    let record = ledger::add_adjustment(store.get_ref(), &ctx, path.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(PayrollResponse {
        message: "Payroll adjusted successfully".into(),
        data: record,
    }))
}
