use super::{Scope, can_read, read_scope, require_officer};
use crate::{auth::context::RequestContext, error::AppError};

pub fn generate(ctx: &RequestContext) -> Result<(), AppError> {
    require_officer(ctx)
}

pub fn adjust(ctx: &RequestContext) -> Result<(), AppError> {
    require_officer(ctx)
}

pub fn list(ctx: &RequestContext) -> Result<Scope, AppError> {
    read_scope(ctx)
}

pub fn view(ctx: &RequestContext, payroll_employee_id: u64) -> Result<(), AppError> {
    can_read(ctx, payroll_employee_id)
}
