use crate::{
    error::AppError,
    model::{employee::HR_DEPARTMENT, role::Role},
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};
use std::fmt::Display;

/// Identity of the caller, built by the auth middleware and handed to every
/// service call explicitly.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    /// Department code of the linked employee
    pub department: Option<String>,

    /// Expose error details in 500 responses.
    pub debug: bool,
}

impl FromRequest for RequestContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<RequestContext>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Unauthenticated.".into())),
        )
    }
}

impl RequestContext {
    /// Admins, and HR managers who belong to the HR department.
    pub fn is_hr_officer(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::HrManager => self
                .department
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(HR_DEPARTMENT)),
            _ => false,
        }
    }

    pub fn require_employee_profile(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or_else(|| AppError::forbidden("No employee profile linked to this user"))
    }

    /// Caller must log the cause before surfacing this.
    pub fn server_error(&self, cause: impl Display) -> AppError {
        AppError::Server {
            detail: self.debug.then(|| cause.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) fn context(role: Role, employee_id: Option<u64>, department: Option<&str>) -> RequestContext {
    RequestContext {
        user_id: 1,
        username: "tester".into(),
        role,
        employee_id,
        department: department.map(str::to_string),
        debug: false,
    }
}
