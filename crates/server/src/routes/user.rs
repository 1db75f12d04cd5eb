use crate::{
    auth::{AdminUser, AuthUser, hash_password},
    dtos::user::{
        CreateUserRequest, ResetPasswordRequest, UpdateUserRequest, UserQueryParams, UserResponse,
    },
    error::{ApiError, ErrorResponse},
    extract::{Json, Path, Query},
    routes::parse_param,
    state::AppState,
};
use axum::{extract::State, http::StatusCode};
use database::services::user::{NewUser, UserChanges, UserService};
use models::Role;
use sea_orm::prelude::Uuid;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/users",
    params(UserQueryParams),
    responses(
        (status = 200, description = "Accounts ordered by name", body = Vec<UserResponse>),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Query(params): Query<UserQueryParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let role = parse_param::<Role>(params.role.as_deref())?;
    let users = UserService::list(&state.db, &actor, role).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Registers a student or admin account
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid fields or email already registered", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;
    let role = parse_param::<Role>(request.role.as_deref())?.unwrap_or(Role::Student);

    let new = NewUser {
        full_name: request.full_name,
        email: request.email,
        department: request.department,
        phone: request.phone,
        role,
        password_hash: hash_password(&request.password)?,
    };

    let user = UserService::create(&state.db, &actor, new, state.now()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account found", body = UserResponse),
        (status = 403, description = "Someone else's account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = UserService::get(&state.db, &actor, id).await?;
    Ok(Json(user.into()))
}

/// Admin edit of an account, including its role
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Invalid fields or email already registered", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    request.validate()?;

    let changes = UserChanges {
        full_name: request.full_name,
        email: request.email,
        department: request.department,
        phone: request.phone,
        role: parse_param::<Role>(request.role.as_deref())?,
    };

    let user = UserService::update(&state.db, &actor, id, changes).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/users/{id}/reset-password",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password replaced"),
        (status = 400, description = "Password too short", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    let password_hash = hash_password(&request.new_password)?;
    UserService::reset_password(&state.db, &actor, id, password_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 409, description = "User has active bookings or penalty history", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    UserService::delete(&state.db, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
