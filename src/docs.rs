use crate::api::attendance::{AttendanceListResponse, AttendanceResponse};
use crate::api::employee::{
    CreateEmployee, EmployeeListResponse, EmployeeResponse, UpdateEmployee,
};
use crate::api::leave_request::{CreateLeave, LeaveListResponse, LeaveResponse};
use crate::api::payroll::{
    AdjustPayroll, GeneratePayroll, GenerateResponse, PaginatedPayrollResponse,
    PayrollDetailResponse, PayrollResponse,
};
use crate::api::users::{CreateUser, CreatedUser, UserResponse};
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::payroll::{
    AdjustmentKind, PayrollDetail, PayrollEmployee, PayrollRecord, PayrollUser,
};
use crate::model::role::Role;
use crate::models::{LoginReqDto, TokenPair};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Municipal HR API",
        version = "1.0.0",
        description = r#"
## Municipal Human Resources

HR slice of the municipality backend: employees, attendance, leave requests
and payroll.

### Key Features
- **Employee Management**
  - Create, update, list, view and delete employee profiles
- **Attendance**
  - Daily check-in and check-out; worked hours recorded at check-out
- **Leave Management**
  - Apply for leave, approve/reject requests, and view leave history
- **Payroll**
  - Generate a month's payroll from attendance and unpaid leave,
    adjust rows with bonuses and deductions, view payroll records

### Security
Endpoints under the API prefix require a **JWT Bearer** access token.
Payroll generation, adjustments and leave decisions are restricted to
admins and HR managers of the HR department.

### Response Format
- JSON responses with a `message` field and a `data` payload
- Pagination (`page`, `per_page`, `total`) on list endpoints
- Validation failures return 422 with per-field `errors`
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::api::users::create_user,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::payroll::generate_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::get_payroll,
        crate::api::payroll::adjust_payroll
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            CreateUser,
            CreatedUser,
            UserResponse,
            Role,
            CreateLeave,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            LeaveResponse,
            LeaveListResponse,
            Attendance,
            AttendanceResponse,
            AttendanceListResponse,
            CreateEmployee,
            UpdateEmployee,
            Employee,
            EmployeeResponse,
            EmployeeListResponse,
            GeneratePayroll,
            GenerateResponse,
            AdjustPayroll,
            AdjustmentKind,
            PayrollRecord,
            PayrollUser,
            PayrollEmployee,
            PayrollDetail,
            PayrollDetailResponse,
            PayrollResponse,
            PaginatedPayrollResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and account provisioning"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Payroll generation and adjustment APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
