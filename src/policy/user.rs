use super::deny;
use crate::{auth::context::RequestContext, error::AppError, model::role::Role};

pub fn create(ctx: &RequestContext) -> Result<(), AppError> {
    if ctx.role == Role::Admin { Ok(()) } else { Err(deny()) }
}
