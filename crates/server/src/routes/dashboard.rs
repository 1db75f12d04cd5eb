use crate::{
    auth::{AdminUser, AuthUser},
    dtos::{
        booking::BookingResponse,
        component::ComponentResponse,
        dashboard::{
            AdminStatsResponse, CategorySummaryResponse, ListingQueryParams, LowStockQueryParams,
            TopComponentResponse, UserStatsResponse,
        },
    },
    error::{ApiError, ErrorResponse},
    extract::{Json, Query},
    state::AppState,
};
use axum::extract::State;
use database::services::stats::StatsService;

/// Inventory, booking and penalty figures across the lab
#[utoipa::path(
    get,
    path = "/dashboard/admin/stats",
    responses(
        (status = 200, description = "Lab-wide figures", body = AdminStatsResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn admin_stats(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
) -> Result<Json<AdminStatsResponse>, ApiError> {
    let stats = StatsService::admin_stats(&state.db, &actor).await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/dashboard/low-stock",
    params(LowStockQueryParams),
    responses(
        (status = 200, description = "Components at or below the threshold", body = Vec<ComponentResponse>)
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Query(params): Query<LowStockQueryParams>,
) -> Result<Json<Vec<ComponentResponse>>, ApiError> {
    let components = StatsService::low_stock(&state.db, &actor, params.threshold).await?;
    Ok(Json(components.into_iter().map(Into::into).collect()))
}

/// The caller's own booking and penalty figures
#[utoipa::path(
    get,
    path = "/dashboard/user/stats",
    responses(
        (status = 200, description = "Personal figures", body = UserStatsResponse)
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn user_stats(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<UserStatsResponse>, ApiError> {
    let stats = StatsService::user_stats(&state.db, &actor).await?;
    Ok(Json(stats.into()))
}

/// Loans past their due date, oldest first
#[utoipa::path(
    get,
    path = "/dashboard/overdue-bookings",
    responses(
        (status = 200, description = "Overdue loans", body = Vec<BookingResponse>),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn overdue_bookings(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = StatsService::overdue_bookings(&state.db, &actor, state.today()).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/dashboard/recent-bookings",
    params(ListingQueryParams),
    responses(
        (status = 200, description = "Newest requests first", body = Vec<BookingResponse>),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn recent_bookings(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Query(params): Query<ListingQueryParams>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = StatsService::recent_bookings(&state.db, &actor, params.limit).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

/// Components ranked by units lent
#[utoipa::path(
    get,
    path = "/dashboard/top-components",
    params(ListingQueryParams),
    responses(
        (status = 200, description = "Most borrowed components", body = Vec<TopComponentResponse>),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn top_components(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Query(params): Query<ListingQueryParams>,
) -> Result<Json<Vec<TopComponentResponse>>, ApiError> {
    let ranked = StatsService::top_components(&state.db, &actor, params.limit).await?;
    Ok(Json(ranked.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/dashboard/category-summary",
    responses(
        (status = 200, description = "Bookable stock per category", body = Vec<CategorySummaryResponse>)
    ),
    security(("jwt" = [])),
    tag = "Dashboard"
)]
pub async fn category_summary(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<CategorySummaryResponse>>, ApiError> {
    let summary = StatsService::category_summary(&state.db).await?;
    Ok(Json(summary.into_iter().map(Into::into).collect()))
}
