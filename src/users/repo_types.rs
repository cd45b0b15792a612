use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::roles::Role;

/// User row joined with its role name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String, // `<ivHex>:<cipherHex>`, scrubbed before leaving the service
    pub profile_picture: Option<String>,
    pub image_format: Option<String>,
    pub verification_code: Option<String>,
    pub is_verified: bool,
    pub role_id: Option<i32>,
    pub role_name: Option<String>, // from LEFT JOIN roles, None when unassigned
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role_name.as_deref().and_then(Role::from_name)
    }

    /// Drops the stored ciphertext; every user handed to a caller goes through here.
    pub fn scrubbed(mut self) -> Self {
        self.password = String::new();
        self
    }
}

/// Profile fields as written to the store. `password` is already sealed.
/// The role is not part of it; it is set on insert and changed only through `set_role_id`.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<String>,
    pub image_format: Option<String>,
    pub verification_code: Option<String>,
    pub is_verified: bool,
}
