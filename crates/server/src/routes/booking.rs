use crate::{
    auth::{AdminUser, AuthUser},
    dtos::booking::{
        BookingQueryParams, BookingResponse, CreateBookingRequest, DeleteBookingResponse,
        RejectBookingRequest, ReturnResponse, SweepResponse,
    },
    error::{ApiError, ErrorResponse},
    extract::{Json, Path, Query},
    routes::parse_param,
    state::AppState,
};
use axum::{extract::State, http::StatusCode};
use database::services::booking::{BookingFilter, BookingService, NewBooking};
use sea_orm::prelude::Uuid;

/// Request a component
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking requested", body = BookingResponse),
        (status = 400, description = "Invalid quantity, date or reason, or retired component", body = ErrorResponse),
        (status = 404, description = "Component not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let booking = BookingService::create(
        &state.db,
        &actor,
        NewBooking {
            component_id: request.component_id,
            quantity: request.quantity,
            expected_return_date: request.expected_return_date,
            reason: request.reason,
        },
        state.now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// List bookings; admins see all, students their own
#[utoipa::path(
    get,
    path = "/bookings",
    params(BookingQueryParams),
    responses(
        (status = 200, description = "Bookings, newest first", body = Vec<BookingResponse>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<BookingQueryParams>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let filter = BookingFilter {
        status: parse_param(params.status.as_deref())?,
        user_id: params.user_id,
        component_id: params.component_id,
    };

    let bookings = BookingService::list(&state.db, &actor, filter).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

/// List the caller's own bookings
#[utoipa::path(
    get,
    path = "/bookings/my",
    responses(
        (status = 200, description = "Caller's bookings", body = Vec<BookingResponse>)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = BookingService::list_for_user(&state.db, &actor).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

/// Requests awaiting a decision, oldest first
#[utoipa::path(
    get,
    path = "/bookings/pending",
    responses(
        (status = 200, description = "Pending requests", body = Vec<BookingResponse>),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn pending_bookings(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = BookingService::list_pending(&state.db, &actor).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking found", body = BookingResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = BookingService::get(&state.db, &actor, id).await?;
    Ok(Json(booking.into()))
}

/// Approve a request and reserve its stock
#[utoipa::path(
    patch,
    path = "/bookings/{id}/approve",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking approved", body = BookingResponse),
        (status = 409, description = "Booking is not awaiting a decision", body = ErrorResponse),
        (status = 422, description = "Not enough units available", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn approve_booking(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = BookingService::approve(&state.db, &actor, id, state.now()).await?;
    Ok(Json(booking.into()))
}

#[utoipa::path(
    patch,
    path = "/bookings/{id}/reject",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = RejectBookingRequest,
    responses(
        (status = 200, description = "Booking rejected", body = BookingResponse),
        (status = 409, description = "Booking is not awaiting a decision", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn reject_booking(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    request: Option<Json<RejectBookingRequest>>,
) -> Result<Json<BookingResponse>, ApiError> {
    let reason = request.and_then(|Json(r)| r.reason);
    let booking = BookingService::reject(&state.db, &actor, id, reason, state.now()).await?;
    Ok(Json(booking.into()))
}

/// Close a loan; late returns are charged
#[utoipa::path(
    patch,
    path = "/bookings/{id}/return",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking returned", body = ReturnResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 409, description = "Booking is not on loan", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn return_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let (booking, assessment) =
        BookingService::mark_returned(&state.db, &state.policy, &actor, id, state.now()).await?;

    Ok(Json(ReturnResponse {
        booking: booking.into(),
        penalty: assessment.penalty().cloned().map(Into::into),
    }))
}

/// Flag a late loan as overdue without waiting for the sweep
#[utoipa::path(
    patch,
    path = "/bookings/{id}/overdue",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking marked overdue", body = ReturnResponse),
        (status = 409, description = "Booking is not an approved loan past its due date", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn mark_overdue(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let (booking, assessment) =
        BookingService::mark_overdue(&state.db, &state.policy, &actor, id, state.now()).await?;

    Ok(Json(ReturnResponse {
        booking: booking.into(),
        penalty: assessment.penalty().cloned().map(Into::into),
    }))
}

/// Run the overdue sweep now
#[utoipa::path(
    post,
    path = "/bookings/sweep-overdue",
    responses(
        (status = 200, description = "Sweep finished", body = SweepResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn sweep_overdue(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<SweepResponse>, ApiError> {
    let report = BookingService::sweep_overdue(&state.db, &state.policy, state.now()).await?;
    Ok(Json(report.into()))
}

/// Students cancel their request; admins cancel requests or purge closed bookings
#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled or deleted", body = DeleteBookingResponse),
        (status = 409, description = "Booking holds stock or has penalties", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Bookings"
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteBookingResponse>, ApiError> {
    let removal = BookingService::delete(&state.db, &actor, id, state.now()).await?;
    Ok(Json(removal.into()))
}
