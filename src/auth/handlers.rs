use crate::{
    auth::{
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::AppError,
    models::{Claims, LoginReqDto, TokenPair, TokenType},
    store::HrStore,
    validation::FieldErrors,
};
use actix_web::{HttpRequest, HttpResponse, web};
use std::fmt::Display;
use tracing::{debug, error, info, instrument, warn};

fn internal(config: &Config, cause: impl Display) -> AppError {
    AppError::Server {
        detail: config.debug.then(|| cause.to_string()),
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Signs a fresh access/refresh pair and records the refresh token's `jti`.
async fn issue_pair(
    store: &dyn HrStore,
    config: &Config,
    subject: &TokenSubject,
) -> Result<TokenPair, AppError> {
    let access_token = generate_access_token(subject, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            internal(config, e)
        })?;

    let (refresh_token, refresh_claims) =
        generate_refresh_token(subject, &config.jwt_secret, config.refresh_token_ttl).map_err(|e| {
            error!(error = %e, "Failed to sign refresh token");
            internal(config, e)
        })?;

    debug!(user_id = subject.user_id, jti = %refresh_claims.jti, "Storing refresh token");

    store
        .save_refresh_token(subject.user_id, &refresh_claims.jti, refresh_claims.exp as i64)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = subject.user_id, "Failed to store refresh token");
            internal(config, e)
        })?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, body = TokenPair),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Missing username or password")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    let mut errors = FieldErrors::new();
    errors.require_text("username", Some(user.username.clone()));
    if user.password.is_empty() {
        errors.add("password", "The password field is required.");
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let account = match store.find_user_by_username(&user.username.trim().to_lowercase()).await {
        Ok(Some(account)) if account.is_active => account,
        Ok(_) => {
            info!("Invalid credentials: unknown or inactive user");
            return Err(invalid_credentials());
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return Err(internal(&config, e));
        }
    };

    if let Err(e) = verify_password(&user.password, &account.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid_credentials());
    }

    let pair = issue_pair(store.get_ref(), &config, &TokenSubject::from(&account)).await?;

    if let Err(e) = store.touch_last_login(account.id).await {
        // login still succeeds
        warn!(error = %e, user_id = account.id, "Failed to update last_login_at");
    }

    info!(user_id = account.id, "Login successful");
    Ok(HttpResponse::Ok().json(pair))
}

fn refresh_claims(req: &HttpRequest, config: &Config) -> Option<Claims> {
    let claims = verify_token(bearer(req)?, &config.jwt_secret).ok()?;
    (claims.token_type == TokenType::Refresh).then_some(claims)
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, body = TokenPair),
        (status = 401, description = "Refresh token missing, invalid or already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let claims = refresh_claims(&req, &config)
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

    // rotation: the presented token can be used once
    let revoked = store.revoke_refresh_token(&claims.jti).await.map_err(|e| {
        error!(error = %e, jti = %claims.jti, "Failed to revoke refresh token");
        internal(&config, e)
    })?;
    if !revoked {
        info!(user_id = claims.user_id, jti = %claims.jti, "Refresh token reused or revoked");
        return Err(AppError::Unauthorized("Invalid refresh token".into()));
    }

    // role, department and active flag may have changed since the last pair
    let account = match store.find_user_by_id(claims.user_id).await {
        Ok(Some(account)) if account.is_active => account,
        Ok(_) => {
            info!(user_id = claims.user_id, "Refresh denied: unknown or inactive user");
            return Err(AppError::Unauthorized("Invalid refresh token".into()));
        }
        Err(e) => {
            error!(error = %e, user_id = claims.user_id, "Database error while reloading user");
            return Err(internal(&config, e));
        }
    };

    let pair = issue_pair(store.get_ref(), &config, &TokenSubject::from(&account)).await?;
    Ok(HttpResponse::Ok().json(pair))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked (idempotent)")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> HttpResponse {
    if let Some(claims) = refresh_claims(&req, &config) {
        if let Err(e) = store.revoke_refresh_token(&claims.jti).await {
            warn!(error = %e, jti = %claims.jti, "Failed to revoke refresh token on logout");
        }
    }

    HttpResponse::NoContent().finish()
}
