use serde::{Deserialize, Serialize};

use crate::metrics::services::{Metrics, UserWithMetrics};
use crate::roles::Role;
use crate::users::repo_types::User;

/// Profile fields. `PATCH /user/:id` replaces all of them; the role is never part of an update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<String>,
    pub image_format: Option<String>,
    pub verification_code: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

/// Request body for creating a user: the profile plus the initial role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub profile: UpdateUserRequest,
    pub role_id: Option<i32>, // defaults to ATTENDEE
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RoleRef {
    pub id: i32,
    pub name: String,
}

/// Public part of the user returned to the client. Never carries the password.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub image_format: Option<String>,
    pub is_verified: bool,
    pub role: Option<RoleRef>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        let role = match (u.role_id, u.role_name) {
            (Some(id), Some(name)) => Some(RoleRef { id, name }),
            _ => None,
        };
        Self {
            id: u.id,
            name: u.name,
            username: u.username,
            email: u.email,
            profile_picture: u.profile_picture,
            image_format: u.image_format,
            is_verified: u.is_verified,
            role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserWithMetricsResponse {
    pub user: UserResponse,
    pub metrics: Metrics,
}

impl From<UserWithMetrics> for UserWithMetricsResponse {
    fn from(v: UserWithMetrics) -> Self {
        Self {
            user: v.user.into(),
            metrics: v.metrics,
        }
    }
}
