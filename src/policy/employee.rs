use super::{can_read, require_officer};
use crate::{auth::context::RequestContext, error::AppError};

/// Create, list, update and delete.
pub fn manage(ctx: &RequestContext) -> Result<(), AppError> {
    require_officer(ctx)
}

pub fn view(ctx: &RequestContext, employee_id: u64) -> Result<(), AppError> {
    can_read(ctx, employee_id)
}
