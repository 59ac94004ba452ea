use crate::auth::context::RequestContext;
use crate::error::AppError;
use crate::model::employee::{
    Employee, EmployeeChanges, EmployeeFilter, EmployeeStatus, NewEmployee,
};
use crate::policy;
use crate::store::{HrStore, StoreError};
use crate::utils::pagination::{PageQuery, Pagination};
use crate::validation::{FieldErrors, Validate};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const NOT_FOUND: &str = "Employee not found";

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: Option<String>,
    #[schema(example = "John")]
    pub first_name: Option<String>,
    #[schema(example = "Doe")]
    pub last_name: Option<String>,
    #[schema(example = "john.doe@city.gov")]
    pub email: Option<String>,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = "public_works")]
    pub department: Option<String>,
    #[schema(example = "Inspector")]
    pub position: Option<String>,
    #[schema(example = "2200.00", value_type = Option<String>)]
    pub base_salary: Option<Decimal>,
    #[schema(example = "2026-01-01", value_type = Option<String>, format = "date")]
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub employee_code: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    #[schema(value_type = Option<String>)]
    pub base_salary: Option<Decimal>,
    #[schema(value_type = Option<String>, format = "date")]
    pub hire_date: Option<NaiveDate>,
    #[schema(example = "active")]
    pub status: Option<String>,
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        errors.add("email", "The email must be a valid email address.");
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Validate for CreateEmployee {
    type Output = NewEmployee;

    fn validate(self) -> Result<NewEmployee, FieldErrors> {
        let mut errors = FieldErrors::new();
        let employee_code = errors.require_text("employee_code", self.employee_code);
        let first_name = errors.require_text("first_name", self.first_name);
        let last_name = errors.require_text("last_name", self.last_name);
        let email = errors.require_text("email", self.email).map(|e| e.to_lowercase());
        if let Some(email) = &email {
            check_email(&mut errors, email);
        }
        let department = errors
            .require_text("department", self.department)
            .map(|d| d.to_lowercase());
        let base_salary = errors
            .require("base_salary", self.base_salary)
            .and_then(|salary| errors.check_money("base_salary", "base salary", salary));
        let hire_date = errors.require("hire_date", self.hire_date);

        errors.into_result(|| {
            Some(NewEmployee {
                employee_code: employee_code?,
                first_name: first_name?,
                last_name: last_name?,
                email: email?,
                phone: trimmed(self.phone),
                department: department?,
                position: trimmed(self.position),
                base_salary: base_salary?,
                hire_date: hire_date?,
            })
        })
    }
}

impl Validate for UpdateEmployee {
    type Output = EmployeeChanges;

    fn validate(self) -> Result<EmployeeChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = trimmed(self.email).map(|e| e.to_lowercase());
        if let Some(email) = &email {
            check_email(&mut errors, email);
        }
        if let Some(salary) = self.base_salary {
            errors.check_money("base_salary", "base salary", salary);
        }
        let status = match self.status {
            Some(raw) => errors.parse_choice::<EmployeeStatus>("status", Some(raw), &["active", "inactive"]),
            None => None,
        };

        let changes = EmployeeChanges {
            employee_code: trimmed(self.employee_code),
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            email,
            phone: trimmed(self.phone),
            department: trimmed(self.department).map(|d| d.to_lowercase()),
            position: trimmed(self.position),
            base_salary: self.base_salary,
            hire_date: self.hire_date,
            status,
        };
        if errors.is_empty() && changes.is_empty() {
            errors.add("body", "At least one field must be provided.");
        }

        errors.into_result(|| Some(changes))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Department code, e.g. `hr`
    pub department: Option<String>,
    /// `active` or `inactive`
    pub status: Option<String>,
    /// Matches first name, last name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeResponse {
    pub message: String,
    pub data: Employee,
}

fn write_failure(ctx: &RequestContext, err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate(_) => {
            AppError::conflict("An employee with this code or email already exists")
        }
        e => {
            tracing::error!(error = %e, "Employee write failed");
            ctx.server_error(e)
        }
    }
}

async fn load(store: &dyn HrStore, ctx: &RequestContext, id: u64) -> Result<Employee, AppError> {
    store
        .find_employee(id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id = id, "Failed to fetch employee");
            ctx.server_error(e)
        })?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, body = EmployeeResponse),
        (status = 403),
        (status = 409, description = "Duplicate employee code or email"),
        (status = 422)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    body: web::Json<CreateEmployee>,
) -> Result<HttpResponse, AppError> {
    policy::employee::manage(&ctx)?;
    let employee = body.into_inner().validate()?;

    let id = store
        .create_employee(&employee)
        .await
        .map_err(|e| write_failure(&ctx, e))?;
    tracing::info!(employee_id = id, created_by = ctx.user_id, "Employee created");

    Ok(HttpResponse::Created().json(EmployeeResponse {
        message: "Employee created successfully".into(),
        data: load(store.get_ref(), &ctx, id).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery, PageQuery),
    responses(
        (status = 200, body = EmployeeListResponse),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    query: web::Query<EmployeeQuery>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    policy::employee::manage(&ctx)?;
    let page = Pagination::from(&*page);
    let query = query.into_inner();

    let mut errors = FieldErrors::new();
    let status = match trimmed(query.status) {
        Some(raw) => errors.parse_choice::<EmployeeStatus>("status", Some(raw), &["active", "inactive"]),
        None => None,
    };
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let filter = EmployeeFilter {
        department: trimmed(query.department).map(|d| d.to_lowercase()),
        status,
        search: trimmed(query.search),
    };
    let (data, total) = store.list_employees(&filter, page).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list employees");
        ctx.server_error(e)
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employee/{id}",
    params(("id", description = "Employee ID")),
    responses(
        (status = 200, body = EmployeeResponse),
        (status = 403),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    policy::employee::view(&ctx, id)?;

    Ok(HttpResponse::Ok().json(EmployeeResponse {
        message: "Employee retrieved successfully".into(),
        data: load(store.get_ref(), &ctx, id).await?,
    }))
}

#[utoipa::path(
    put,
    path = "/api/employee/{id}",
    request_body = UpdateEmployee,
    params(("id", description = "Employee ID")),
    responses(
        (status = 200, body = EmployeeResponse),
        (status = 403),
        (status = 404, description = "Employee not found"),
        (status = 409),
        (status = 422)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, AppError> {
    policy::employee::manage(&ctx)?;
    let id = path.into_inner();
    let changes = body.into_inner().validate()?;

    let found = store
        .update_employee(id, &changes)
        .await
        .map_err(|e| write_failure(&ctx, e))?;
    if !found {
        return Err(AppError::not_found(NOT_FOUND));
    }

    Ok(HttpResponse::Ok().json(EmployeeResponse {
        message: "Employee updated successfully".into(),
        data: load(store.get_ref(), &ctx, id).await?,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/employee/{id}",
    params(("id", description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 403),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee still has payroll, attendance or leave records")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    policy::employee::manage(&ctx)?;
    let id = path.into_inner();

    match store.delete_employee(id).await {
        Ok(true) => {
            tracing::info!(employee_id = id, deleted_by = ctx.user_id, "Employee deleted");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Successfully deleted"
            })))
        }
        Ok(false) => Err(AppError::not_found(NOT_FOUND)),
        Err(StoreError::ForeignKey(_)) => Err(AppError::conflict(
            "Employee still has payroll, attendance or leave records",
        )),
        Err(e) => {
            tracing::error!(error = %e, employee_id = id, "Failed to delete employee");
            Err(ctx.server_error(e))
        }
    }
}
