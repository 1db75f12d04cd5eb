use crate::{
    auth::AuthUser,
    dtos::user::{UpdateProfileRequest, UserResponse},
    error::{ApiError, ErrorResponse},
    extract::Json,
    state::AppState,
};
use axum::extract::State;
use database::services::user::{ProfileChanges, UserService};

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The caller's account", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = UserService::get(&state.db, &actor, actor.user_id).await?;
    Ok(Json(user.into()))
}

/// Update the caller's name and contact details
#[utoipa::path(
    put,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Blank name", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let changes = ProfileChanges {
        full_name: request.full_name,
        department: request.department,
        phone: request.phone,
    };

    let user = UserService::update_profile(&state.db, &actor, changes).await?;
    Ok(Json(user.into()))
}
