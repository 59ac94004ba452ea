use crate::auth::{context::RequestContext, password::hash_password};
use crate::error::AppError;
use crate::model::{role::Role, user::NewUser};
use crate::policy;
use crate::store::{HrStore, StoreError};
use crate::validation::{FieldErrors, Validate};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "jane.doe")]
    pub username: Option<String>,
    #[schema(example = "s3cret-pass")]
    pub password: Option<String>,
    #[schema(example = "employee")]
    pub role: Option<String>,
    /// Links the login to an employee profile
    #[schema(example = 1)]
    pub employee_id: Option<u64>,
}

/// Validated account request; the password is still plain text here.
#[derive(Debug)]
pub struct UserCommand {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub employee_id: Option<u64>,
}

impl Validate for CreateUser {
    type Output = UserCommand;

    fn validate(self) -> Result<UserCommand, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = errors
            .require_text("username", self.username)
            .map(|u| u.to_lowercase());
        let password = errors.require("password", self.password.filter(|p| !p.is_empty()));
        if password.as_ref().is_some_and(|p| p.chars().count() < MIN_PASSWORD_LEN) {
            errors.add(
                "password",
                format!("The password must be at least {MIN_PASSWORD_LEN} characters."),
            );
        }
        let role: Option<Role> = errors.parse_choice("role", self.role, &Role::NAMES);
        if matches!(role, Some(Role::Employee | Role::HrManager)) && self.employee_id.is_none() {
            errors.add("employee_id", "Staff accounts must be linked to an employee.");
        }

        errors.into_result(|| {
            Some(UserCommand {
                username: username?,
                password: password?,
                role: role?,
                employee_id: self.employee_id,
            })
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreatedUser {
    pub id: u64,
    pub username: String,
    pub role: Role,
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub data: CreatedUser,
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, body = UserResponse),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Username already taken"),
        (status = 422)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn create_user(
    ctx: RequestContext,
    store: web::Data<dyn HrStore>,
    body: web::Json<CreateUser>,
) -> Result<HttpResponse, AppError> {
    policy::user::create(&ctx)?;
    let command = body.into_inner().validate()?;

    let password_hash = hash_password(&command.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ctx.server_error(e)
    })?;
    let user = NewUser {
        username: command.username,
        password_hash,
        role: command.role,
        employee_id: command.employee_id,
    };

    let id = match store.create_user(&user).await {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => return Err(AppError::conflict("Username already taken")),
        Err(StoreError::ForeignKey(_)) => {
            return Err(FieldErrors::single("employee_id", "The selected employee_id is invalid.").into());
        }
        Err(e) => {
            tracing::error!(error = %e, username = %user.username, "Failed to register user");
            return Err(ctx.server_error(e));
        }
    };
    tracing::info!(user_id = id, role = %user.role, created_by = ctx.user_id, "User registered");

    Ok(HttpResponse::Created().json(UserResponse {
        message: "User registered successfully".into(),
        data: CreatedUser {
            id,
            username: user.username,
            role: user.role,
            employee_id: user.employee_id,
        },
    }))
}
