//! HTTP-level tests against the in-memory store.

mod employee;

use crate::{
    auth::jwt::{TokenSubject, generate_access_token},
    config::Config,
    model::role::Role,
    store::memory::MemoryStore,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;

pub const SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 604_800,
        db_max_connections: 1,
        run_migrations: false,
        rate_limit_enabled: false,
        rate_login_per_min: 60,
        rate_refresh_per_min: 30,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        debug: false,
        log_dir: "logs".into(),
        log_level: "debug".into(),
    }
}

/// Builds the full application around `$store` (an `Arc<MemoryStore>`).
macro_rules! test_app {
    ($store:expr) => {
        test_app!($store, $crate::tests::test_config())
    };
    ($store:expr, $config:expr) => {{
        let config: $crate::config::Config = $config;
        let limiters = $crate::routes::RateLimiters::from_config(&config).unwrap();
        let store: std::sync::Arc<dyn $crate::store::HrStore> = $store.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from(store))
                .app_data(actix_web::web::Data::new(config.clone()))
                .configure(|cfg| $crate::routes::configure(cfg, &config, &limiters)),
        )
        .await
    }};
}
pub(crate) use test_app;

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `Authorization` header value for a caller with the given identity.
pub fn bearer(user_id: u64, role: Role, employee_id: Option<u64>, department: Option<&str>) -> String {
    let subject = TokenSubject {
        user_id,
        username: format!("user{user_id}"),
        role: role.id(),
        employee_id,
        department: department.map(str::to_string),
    };
    let token = generate_access_token(&subject, SECRET, 900).unwrap();
    format!("Bearer {token}")
}

pub fn admin() -> String {
    bearer(1, Role::Admin, None, None)
}

pub fn hr_officer() -> String {
    bearer(2, Role::HrManager, Some(900), Some("hr"))
}

pub fn employee(employee_id: u64) -> String {
    bearer(100 + employee_id, Role::Employee, Some(employee_id), Some("public_works"))
}

/// Money fields are serialized as strings.
pub fn money(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected a decimal string, got {value}"))
        .parse()
        .unwrap()
}
