use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    error::AppError,
    roles::Role,
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, SetRoleRequest, UpdateUserRequest, UserResponse,
            UserWithMetricsResponse,
        },
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", post(create_user).get(list_users))
        .route(
            "/user/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/user/email/:email", get(get_user_by_email))
        .route("/user/username/:username", get(get_user_by_username))
        .route("/user/:id/role", patch(set_user_role))
        .route("/user/:id/role/reset", patch(reset_user_role))
}

/// Anyone may sign up as ATTENDEE; any other initial role needs an admin token.
#[instrument(skip(state, auth, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    if services::requested_role(&payload)? != Role::Attendee {
        require_admin(auth.as_ref())?;
    }
    let user = services::create(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = services::find_all(&state).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(services::find_one(&state, id).await?.into()))
}

#[instrument(skip(state))]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(services::find_one_by_email(&state, &email).await?.into()))
}

#[instrument(skip(state))]
pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserWithMetricsResponse>, AppError> {
    Ok(Json(services::find_by_username(&state, &username).await?.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(services::update(&state, id, payload).await?.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::remove(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth), fields(actor = auth.user_id))]
pub async fn set_user_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    require_admin(Some(&auth))?;
    Ok(Json(services::set_role(&state, id, payload.role).await?.into()))
}

#[instrument(skip(state, auth), fields(actor = auth.user_id))]
pub async fn reset_user_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    require_admin(Some(&auth))?;
    Ok(Json(services::reset_role(&state, id).await?.into()))
}

fn require_admin(auth: Option<&AuthUser>) -> Result<(), AppError> {
    let Some(auth) = auth else {
        warn!("role assignment without token");
        return Err(AppError::Unauthorized);
    };
    if auth.role != Some(Role::Admin) {
        warn!(user_id = auth.user_id, role = ?auth.role, "role assignment without admin role");
        return Err(AppError::Forbidden);
    }
    Ok(())
}
