use crate::{
    auth::{AdminUser, AuthUser},
    dtos::penalty::{
        CreatePenaltyRequest, PenaltyQueryParams, PenaltyResponse, UpdatePenaltyStatusRequest,
    },
    error::{ApiError, ErrorResponse},
    extract::{Json, Path, Query},
    routes::parse_param,
    state::AppState,
};
use axum::{extract::State, http::StatusCode};
use database::services::penalty::{DamageReport, PenaltyFilter, PenaltyService};
use models::{DamageSeverity, PenaltyStatus};
use sea_orm::prelude::Uuid;

/// Lists penalties, newest first
///
/// Students only ever see their own records.
#[utoipa::path(
    get,
    path = "/penalties",
    params(PenaltyQueryParams),
    responses(
        (status = 200, description = "Matching penalties", body = Vec<PenaltyResponse>),
        (status = 400, description = "Unknown status or type", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Penalties"
)]
pub async fn list_penalties(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<PenaltyQueryParams>,
) -> Result<Json<Vec<PenaltyResponse>>, ApiError> {
    let filter = PenaltyFilter {
        user_id: params.user_id,
        status: parse_param(params.status.as_deref())?,
        penalty_type: parse_param(params.penalty_type.as_deref())?,
    };

    let penalties = PenaltyService::list(&state.db, &actor, filter).await?;
    Ok(Json(penalties.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/penalties/my",
    responses(
        (status = 200, description = "The caller's penalties", body = Vec<PenaltyResponse>)
    ),
    security(("jwt" = [])),
    tag = "Penalties"
)]
pub async fn my_penalties(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<PenaltyResponse>>, ApiError> {
    let filter = PenaltyFilter {
        user_id: Some(actor.user_id),
        ..Default::default()
    };

    let penalties = PenaltyService::list(&state.db, &actor, filter).await?;
    Ok(Json(penalties.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/penalties/{id}",
    params(("id" = Uuid, Path, description = "Penalty ID")),
    responses(
        (status = 200, description = "Penalty found", body = PenaltyResponse),
        (status = 403, description = "Someone else's penalty", body = ErrorResponse),
        (status = 404, description = "Penalty not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Penalties"
)]
pub async fn get_penalty(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PenaltyResponse>, ApiError> {
    let penalty = PenaltyService::get(&state.db, &actor, id).await?;
    Ok(Json(penalty.into()))
}

/// Records a damage or loss charge
#[utoipa::path(
    post,
    path = "/penalties",
    request_body = CreatePenaltyRequest,
    responses(
        (status = 201, description = "Penalty recorded", body = PenaltyResponse),
        (status = 400, description = "Unknown severity or amount outside its range", body = ErrorResponse),
        (status = 404, description = "Component, booking or user not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Penalties"
)]
pub async fn create_penalty(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Json(request): Json<CreatePenaltyRequest>,
) -> Result<(StatusCode, Json<PenaltyResponse>), ApiError> {
    let severity = request
        .severity
        .trim()
        .parse::<DamageSeverity>()
        .map_err(ApiError::bad_request)?;

    let report = DamageReport {
        component_id: request.component_id,
        booking_id: request.booking_id,
        user_id: request.user_id,
        severity,
        amount: request.amount,
        notes: request.notes,
    };

    let penalty =
        PenaltyService::assess_damage(&state.db, &state.policy, &actor, report, state.now())
            .await?;
    Ok((StatusCode::CREATED, Json(penalty.into())))
}

/// Settles a pending penalty
#[utoipa::path(
    patch,
    path = "/penalties/{id}/status",
    params(("id" = Uuid, Path, description = "Penalty ID")),
    request_body = UpdatePenaltyStatusRequest,
    responses(
        (status = 200, description = "Penalty marked paid", body = PenaltyResponse),
        (status = 400, description = "Status other than paid", body = ErrorResponse),
        (status = 409, description = "Penalty is already paid", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Penalties"
)]
pub async fn update_penalty_status(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePenaltyStatusRequest>,
) -> Result<Json<PenaltyResponse>, ApiError> {
    let status = request
        .status
        .trim()
        .parse::<PenaltyStatus>()
        .map_err(ApiError::bad_request)?;
    if status != PenaltyStatus::Paid {
        return Err(ApiError::bad_request(
            "a penalty can only be moved to paid",
        ));
    }

    let penalty = PenaltyService::mark_paid(&state.db, &actor, id, request.notes, state.now()).await?;
    Ok(Json(penalty.into()))
}
