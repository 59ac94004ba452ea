//! Authorization rules, one module per resource.
//!
//! Every check takes the caller's [`RequestContext`] explicitly. HR officers
//! (admins, and HR managers in the HR department) see everything; staff with
//! a linked employee profile see their own records; citizens see nothing.

pub mod attendance;
pub mod employee;
pub mod leave;
pub mod payroll;
pub mod user;

use crate::{auth::context::RequestContext, error::AppError, model::role::Role};

pub const UNAUTHORIZED_ACTION: &str = "This action is unauthorized.";

/// Which rows a list query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Own(u64),
}

impl Scope {
    /// Narrows a requested employee filter to what the scope allows.
    pub fn employee_filter(self, requested: Option<u64>) -> Option<u64> {
        match self {
            Scope::All => requested,
            Scope::Own(id) => Some(id),
        }
    }
}

pub(crate) fn deny() -> AppError {
    AppError::forbidden(UNAUTHORIZED_ACTION)
}

pub(crate) fn require_officer(ctx: &RequestContext) -> Result<(), AppError> {
    if ctx.is_hr_officer() { Ok(()) } else { Err(deny()) }
}

/// Employee id of a staff member acting on their own records.
pub(crate) fn own_profile(ctx: &RequestContext) -> Option<u64> {
    match ctx.role {
        Role::Citizen => None,
        _ => ctx.employee_id,
    }
}

pub(crate) fn read_scope(ctx: &RequestContext) -> Result<Scope, AppError> {
    if ctx.is_hr_officer() {
        return Ok(Scope::All);
    }
    own_profile(ctx).map(Scope::Own).ok_or_else(deny)
}

pub(crate) fn can_read(ctx: &RequestContext, owner: u64) -> Result<(), AppError> {
    match read_scope(ctx)? {
        Scope::All => Ok(()),
        Scope::Own(id) if id == owner => Ok(()),
        Scope::Own(_) => Err(deny()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::context::context;

    #[test]
    fn own_scope_overrides_requested_filter() {
        assert_eq!(Scope::Own(4).employee_filter(Some(9)), Some(4));
        assert_eq!(Scope::Own(4).employee_filter(None), Some(4));
        assert_eq!(Scope::All.employee_filter(Some(9)), Some(9));
        assert_eq!(Scope::All.employee_filter(None), None);
    }

    #[test]
    fn citizens_have_no_read_scope_even_with_a_profile() {
        assert!(read_scope(&context(Role::Citizen, Some(3), None)).is_err());
    }

    #[test]
    fn hr_manager_outside_hr_reads_only_own() {
        let ctx = context(Role::HrManager, Some(3), Some("finance"));
        assert_eq!(read_scope(&ctx).unwrap(), Scope::Own(3));
    }
}
