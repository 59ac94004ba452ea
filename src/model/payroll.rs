use crate::payroll::month::Month;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 7,
    "employee_id": 1001,
    "month": "2026-01",
    "base_salary": "2200.00",
    "deductions": "0.00",
    "bonuses": "0.00",
    "net_salary": "2200.00",
    "generated_by": 1,
    "generated_at": "2026-02-01T09:00:00"
}))]
pub struct PayrollRecord {
    pub id: u64,
    pub employee_id: u64,
    /// `YYYY-MM`
    pub month: String,
    /// Copied from the employee when the batch was generated
    #[schema(value_type = String)]
    pub base_salary: Decimal,
    #[schema(value_type = String)]
    pub deductions: Decimal,
    #[schema(value_type = String)]
    pub bonuses: Decimal,
    #[schema(value_type = String)]
    pub net_salary: Decimal,
    pub generated_by: u64,
    #[schema(value_type = String, format = "date-time")]
    pub generated_at: NaiveDateTime,
}

/// One row of a payroll batch, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayroll {
    pub employee_id: u64,
    pub month: Month,
    pub base_salary: Decimal,
    pub net_salary: Decimal,
    pub generated_by: u64,
    pub generated_at: NaiveDateTime,
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AdjustmentKind {
    Bonus,
    Deduction,
}

impl AdjustmentKind {
    pub const NAMES: [&'static str; 2] = ["bonus", "deduction"];
}

/// Validated bonus/deduction request. `amount` is always > 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    pub amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PayrollFilter {
    pub month: Option<Month>,
    pub employee_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollUser {
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollEmployee {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub user: Option<PayrollUser>,
}

/// Payroll row with its employee (and linked login) expanded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollDetail {
    #[serde(flatten)]
    pub payroll: PayrollRecord,
    pub employee: PayrollEmployee,
}
