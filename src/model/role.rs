use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin = 1,
    HrManager = 2,
    Employee = 3,
    Citizen = 4,
}

impl Role {
    pub const NAMES: [&'static str; 4] = ["admin", "hr_manager", "employee", "citizen"];

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::HrManager),
            3 => Some(Role::Employee),
            4 => Some(Role::Citizen),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}
