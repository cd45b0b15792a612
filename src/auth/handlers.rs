use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest},
        jwt::{AuthUser, JwtKeys},
    },
    error::AppError,
    state::AppState,
    users::{
        dto::UserResponse,
        repo_types::User,
        services::{self, is_valid_email, normalize_email},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Looks the user up by email and checks the password against the sealed credential.
/// Unknown email and wrong password are indistinguishable to the caller.
async fn check_credentials(st: &AppState, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }

    let Some(user) = st.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized);
    };

    if !st.codec.verify(password, &user.password).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::Unauthorized);
    }

    Ok(user.scrubbed())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = check_credentials(&state, &payload.email, &payload.password).await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id, user.role()).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e.to_string())
    })?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::find_one(&state, auth.user_id).await.map_err(|e| {
        warn!(error = %e, user_id = auth.user_id, "token for missing user");
        match e {
            AppError::NotFound => AppError::Unauthorized,
            other => other,
        }
    })?;
    Ok(Json(user.into()))
}
