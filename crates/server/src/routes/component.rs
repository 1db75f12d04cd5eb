use crate::{
    auth::{AdminUser, AuthUser},
    dtos::component::{
        ComponentQueryParams, ComponentResponse, CreateComponentRequest, RemoveComponentResponse,
        StockLevelsResponse, StockMoveRequest, UpdateComponentRequest,
    },
    error::{ApiError, ErrorResponse},
    extract::{Json, Path, Query},
    routes::parse_param,
    state::AppState,
};
use axum::{extract::State, http::StatusCode};
use database::services::component::{
    ComponentChanges, ComponentFilter, ComponentService, NewComponent, StockMove,
};
use models::StockBucket;
use sea_orm::prelude::Uuid;

/// Browse the catalogue
#[utoipa::path(
    get,
    path = "/components",
    params(ComponentQueryParams),
    responses(
        (status = 200, description = "Components by category and name", body = Vec<ComponentResponse>)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn list_components(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(params): Query<ComponentQueryParams>,
) -> Result<Json<Vec<ComponentResponse>>, ApiError> {
    let filter = ComponentFilter {
        category: params.category,
        search: params.search,
        include_retired: params.include_retired,
    };

    let components = ComponentService::list(&state.db, filter).await?;
    Ok(Json(components.into_iter().map(Into::into).collect()))
}

/// Categories that currently have bookable components
#[utoipa::path(
    get,
    path = "/components/categories",
    responses(
        (status = 200, description = "Distinct categories", body = Vec<String>)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(ComponentService::categories(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/components/{id}",
    params(("id" = Uuid, Path, description = "Component ID")),
    responses(
        (status = 200, description = "Component found", body = ComponentResponse),
        (status = 404, description = "Component not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn get_component(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ComponentResponse>, ApiError> {
    let component = ComponentService::get(&state.db, id).await?;
    Ok(Json(component.into()))
}

#[utoipa::path(
    post,
    path = "/components",
    request_body = CreateComponentRequest,
    responses(
        (status = 201, description = "Component created", body = ComponentResponse),
        (status = 400, description = "Missing fields or duplicate code", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn create_component(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Json(request): Json<CreateComponentRequest>,
) -> Result<(StatusCode, Json<ComponentResponse>), ApiError> {
    let component = ComponentService::create(
        &state.db,
        &actor,
        NewComponent {
            name: request.name,
            code: request.code,
            category: request.category,
            description: request.description,
            total_quantity: request.total_quantity,
            replacement_cost: request.replacement_cost,
        },
        state.now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(component.into())))
}

/// Look a component up by its inventory code, ignoring case
#[utoipa::path(
    get,
    path = "/components/code/{code}",
    params(("code" = String, Path, description = "Inventory code")),
    responses(
        (status = 200, description = "Component found", body = ComponentResponse),
        (status = 404, description = "No component with that code", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn get_component_by_code(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(code): Path<String>,
) -> Result<Json<ComponentResponse>, ApiError> {
    let component = ComponentService::get_by_code(&state.db, &code).await?;
    Ok(Json(component.into()))
}

/// Edit descriptive fields and optionally correct the total
#[utoipa::path(
    put,
    path = "/components/{id}",
    params(("id" = Uuid, Path, description = "Component ID")),
    request_body = UpdateComponentRequest,
    responses(
        (status = 200, description = "Component updated", body = ComponentResponse),
        (status = 400, description = "Total would not cover units in use", body = ErrorResponse),
        (status = 404, description = "Component not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn update_component(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateComponentRequest>,
) -> Result<Json<ComponentResponse>, ApiError> {
    let changes = ComponentChanges {
        name: request.name,
        category: request.category,
        description: request.description,
        replacement_cost: request.replacement_cost,
        total_quantity: request.total_quantity,
    };

    let component = ComponentService::update(&state.db, &actor, id, changes, state.now()).await?;
    Ok(Json(component.into()))
}

/// Delete a component, or retire it if it has history
#[utoipa::path(
    delete,
    path = "/components/{id}",
    params(("id" = Uuid, Path, description = "Component ID")),
    responses(
        (status = 200, description = "Component deleted or retired", body = RemoveComponentResponse),
        (status = 404, description = "Component not found", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn delete_component(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RemoveComponentResponse>, ApiError> {
    let removal = ComponentService::remove(&state.db, &actor, id, state.now()).await?;
    Ok(Json(removal.into()))
}

/// Add newly purchased units
#[utoipa::path(
    post,
    path = "/components/{id}/restock",
    params(("id" = Uuid, Path, description = "Component ID")),
    request_body = StockMoveRequest,
    responses(
        (status = 200, description = "Stock after the move", body = StockLevelsResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn restock(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<StockMoveRequest>,
) -> Result<Json<StockLevelsResponse>, ApiError> {
    move_stock(&state, actor, id, StockMove::Restock, request.quantity).await
}

/// Write units off as damaged
#[utoipa::path(
    post,
    path = "/components/{id}/damaged",
    params(("id" = Uuid, Path, description = "Component ID")),
    request_body = StockMoveRequest,
    responses(
        (status = 200, description = "Stock after the move", body = StockLevelsResponse),
        (status = 422, description = "Source bucket holds fewer units", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn mark_damaged(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<StockMoveRequest>,
) -> Result<Json<StockLevelsResponse>, ApiError> {
    let source = bucket_or(request.bucket.as_deref(), StockBucket::Available)?;
    move_stock(&state, actor, id, StockMove::Damaged { source }, request.quantity).await
}

/// Send units to maintenance
#[utoipa::path(
    post,
    path = "/components/{id}/maintenance",
    params(("id" = Uuid, Path, description = "Component ID")),
    request_body = StockMoveRequest,
    responses(
        (status = 200, description = "Stock after the move", body = StockLevelsResponse),
        (status = 422, description = "Source bucket holds fewer units", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn mark_under_maintenance(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<StockMoveRequest>,
) -> Result<Json<StockLevelsResponse>, ApiError> {
    let source = bucket_or(request.bucket.as_deref(), StockBucket::Available)?;
    move_stock(
        &state,
        actor,
        id,
        StockMove::Maintenance { source },
        request.quantity,
    )
    .await
}

/// Return repaired units to the shelf
#[utoipa::path(
    post,
    path = "/components/{id}/restore",
    params(("id" = Uuid, Path, description = "Component ID")),
    request_body = StockMoveRequest,
    responses(
        (status = 200, description = "Stock after the move", body = StockLevelsResponse),
        (status = 422, description = "Source bucket holds fewer units", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Components"
)]
pub async fn restore(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<StockMoveRequest>,
) -> Result<Json<StockLevelsResponse>, ApiError> {
    let from = bucket_or(request.bucket.as_deref(), StockBucket::Damaged)?;
    move_stock(&state, actor, id, StockMove::Restore { from }, request.quantity).await
}

async fn move_stock(
    state: &AppState,
    actor: database::Actor,
    id: Uuid,
    movement: StockMove,
    quantity: i32,
) -> Result<Json<StockLevelsResponse>, ApiError> {
    let levels = ComponentService::move_stock(&state.db, &actor, id, movement, quantity).await?;
    Ok(Json(levels.into()))
}

fn bucket_or(value: Option<&str>, default: StockBucket) -> Result<StockBucket, ApiError> {
    Ok(parse_param(value)?.unwrap_or(default))
}
