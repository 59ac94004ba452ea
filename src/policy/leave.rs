use super::{Scope, can_read, read_scope, require_officer};
use crate::{auth::context::RequestContext, error::AppError};

/// Leave is always requested for the caller's own profile.
pub fn create(ctx: &RequestContext) -> Result<u64, AppError> {
    ctx.require_employee_profile()
}

/// Approving and rejecting.
pub fn decide(ctx: &RequestContext) -> Result<(), AppError> {
    require_officer(ctx)
}

pub fn list(ctx: &RequestContext) -> Result<Scope, AppError> {
    read_scope(ctx)
}

pub fn view(ctx: &RequestContext, leave_employee_id: u64) -> Result<(), AppError> {
    can_read(ctx, leave_employee_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::context::context, model::role::Role};

    #[test]
    fn only_officers_decide() {
        assert!(decide(&context(Role::Admin, None, None)).is_ok());
        assert!(decide(&context(Role::HrManager, Some(1), Some("hr"))).is_ok());
        assert!(decide(&context(Role::HrManager, Some(1), Some("it"))).is_err());
        assert!(decide(&context(Role::Employee, Some(1), Some("hr"))).is_err());
    }

    #[test]
    fn creating_needs_a_profile() {
        assert_eq!(create(&context(Role::Employee, Some(5), None)).unwrap(), 5);
        assert!(create(&context(Role::Admin, None, None)).is_err());
    }
}
