use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::error::AppError;
use crate::metrics::services::{compute_metrics, UserWithMetrics};
use crate::roles::Role;
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest};
use crate::users::repo_types::{User, UserRecord};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Role asked for on create; ATTENDEE when absent.
pub(crate) fn requested_role(req: &CreateUserRequest) -> Result<Role, AppError> {
    match req.role_id {
        None => Ok(Role::Attendee),
        Some(id) => {
            Role::from_id(id).ok_or_else(|| AppError::BadRequest(format!("Unknown role id {id}")))
        }
    }
}

/// Validates the profile and seals its password into a storable record.
async fn to_record(st: &AppState, req: UpdateUserRequest) -> Result<UserRecord, AppError> {
    let email = normalize_email(&req.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password must not be empty".into()));
    }

    let password = st.codec.seal(&req.password).await?;

    Ok(UserRecord {
        name: req.name,
        username: req.username.trim().to_string(),
        email,
        password,
        profile_picture: req.profile_picture,
        image_format: req.image_format,
        verification_code: req.verification_code,
        is_verified: req.is_verified,
    })
}

pub async fn create(st: &AppState, req: CreateUserRequest) -> Result<User, AppError> {
    let role = requested_role(&req)?;
    let record = to_record(st, req.profile).await?;
    let user = st.users.insert(&record, role.id()).await?;
    info!(user_id = user.id, username = %user.username, role = role.name(), "user created");
    Ok(user.scrubbed())
}

pub async fn find_all(st: &AppState) -> Result<Vec<User>, AppError> {
    let users = st.users.list().await?;
    Ok(users.into_iter().map(User::scrubbed).collect())
}

pub async fn find_one(st: &AppState, id: i32) -> Result<User, AppError> {
    st.users
        .find_by_id(id)
        .await?
        .map(User::scrubbed)
        .ok_or(AppError::NotFound)
}

pub async fn find_one_by_email(st: &AppState, email: &str) -> Result<User, AppError> {
    st.users
        .find_by_email(&normalize_email(email))
        .await?
        .map(User::scrubbed)
        .ok_or(AppError::NotFound)
}

/// Full replace of the profile fields; the new password is re-sealed with a fresh IV.
/// The role is left as stored.
pub async fn update(st: &AppState, id: i32, req: UpdateUserRequest) -> Result<User, AppError> {
    let record = to_record(st, req).await?;
    let user = st
        .users
        .update(id, &record)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = user.id, "user updated");
    Ok(user.scrubbed())
}

pub async fn remove(st: &AppState, id: i32) -> Result<(), AppError> {
    if !st.users.delete(id).await? {
        return Err(AppError::NotFound);
    }
    info!(user_id = id, "user removed");
    Ok(())
}

pub async fn find_by_username(st: &AppState, username: &str) -> Result<UserWithMetrics, AppError> {
    let user = st
        .users
        .find_by_username(username.trim())
        .await?
        .ok_or(AppError::NotFound)?;
    compute_metrics(st.metrics.as_ref(), user).await
}

pub async fn set_role(st: &AppState, id: i32, role: Role) -> Result<User, AppError> {
    let mut user = st.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    if !st.users.set_role_id(id, role.id()).await? {
        // Deleted between the read and the write.
        return Err(AppError::NotFound);
    }
    info!(user_id = id, from = ?user.role_name, to = role.name(), "user role changed");
    user.role_id = Some(role.id());
    user.role_name = Some(role.name().to_string());
    Ok(user.scrubbed())
}

/// Resets a user back to the default ATTENDEE role.
pub async fn reset_role(st: &AppState, id: i32) -> Result<User, AppError> {
    set_role(st, id, Role::Attendee).await
}
