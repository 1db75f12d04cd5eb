use crate::{
    auth::{AuthUser, verify_password},
    dtos::{
        auth::{LoginRequest, LoginResponse},
        user::UserResponse,
    },
    error::{ApiError, ErrorResponse},
    extract::Json,
    state::AppState,
};
use axum::extract::State;
use database::{Error, services::user::UserService};
use log::{debug, info};

/// Exchanges email and password for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Unknown email or wrong password", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = UserService::find_by_email(&state.db, &request.email).await?;

    // Same answer for unknown email and wrong password
    let Some(user) = user.filter(|u| verify_password(&request.password, &u.password_hash)) else {
        debug!("Failed login for {}", request.email.trim());
        return Err(Error::Unauthorized.into());
    };

    let token = state.jwt.issue(user.id, user.role)?;
    info!("User {} logged in", user.email);

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_owned(),
        expires_in: state.jwt.ttl().as_secs(),
        user: user.into(),
    }))
}

/// Returns the account behind the bearer token
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(
        ("jwt" = [])
    ),
    tag = "Authentication"
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    // A token can outlive its account
    let user = UserService::get(&state.db, &actor, actor.user_id)
        .await
        .map_err(|err| match err {
            Error::NotFound(_) => Error::Unauthorized,
            other => other,
        })?;

    Ok(Json(user.into()))
}
