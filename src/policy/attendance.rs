use super::{Scope, read_scope};
use crate::{auth::context::RequestContext, error::AppError};

/// Checking in or out needs a linked employee profile; returns its id.
pub fn record(ctx: &RequestContext) -> Result<u64, AppError> {
    ctx.require_employee_profile()
}

pub fn list(ctx: &RequestContext) -> Result<Scope, AppError> {
    read_scope(ctx)
}
