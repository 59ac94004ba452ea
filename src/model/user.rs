use crate::model::role::Role;

/// Login account row, joined with the linked employee's department.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAccount {
    pub id: u64, // BIGINT UNSIGNED
    pub username: String,
    /// argon2 PHC string
    pub password: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
    pub is_active: bool,
    pub department: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub employee_id: Option<u64>,
}
