use crate::{
    dtos::{
        auth::{LoginRequest, LoginResponse},
        booking::{
            BookingResponse, CreateBookingRequest, DeleteBookingResponse, RejectBookingRequest,
            ReturnResponse, SweepResponse,
        },
        component::{
            ComponentResponse, CreateComponentRequest, RemoveComponentResponse,
            StockLevelsResponse, StockMoveRequest, UpdateComponentRequest,
        },
        dashboard::{
            AdminStatsResponse, CategorySummaryResponse, InventoryTotalsResponse,
            TopComponentResponse, UserStatsResponse,
        },
        penalty::{
            CreatePenaltyRequest, PenaltyResponse, PenaltyTotalsResponse,
            UpdatePenaltyStatusRequest,
        },
        user::{
            CreateUserRequest, ResetPasswordRequest, UpdateProfileRequest, UpdateUserRequest,
            UserResponse,
        },
    },
    error::ErrorResponse,
    routes::{auth, booking, component, dashboard, health, penalty, profile, root, user},
};
use axum::Json;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        auth::login,
        auth::me,
        profile::get_profile,
        profile::update_profile,
        booking::create_booking,
        booking::list_bookings,
        booking::my_bookings,
        booking::pending_bookings,
        booking::get_booking,
        booking::approve_booking,
        booking::reject_booking,
        booking::return_booking,
        booking::mark_overdue,
        booking::sweep_overdue,
        booking::delete_booking,
        component::list_components,
        component::list_categories,
        component::get_component,
        component::get_component_by_code,
        component::create_component,
        component::update_component,
        component::delete_component,
        component::restock,
        component::mark_damaged,
        component::mark_under_maintenance,
        component::restore,
        penalty::list_penalties,
        penalty::my_penalties,
        penalty::get_penalty,
        penalty::create_penalty,
        penalty::update_penalty_status,
        user::list_users,
        user::create_user,
        user::get_user,
        user::update_user,
        user::reset_password,
        user::delete_user,
        dashboard::admin_stats,
        dashboard::low_stock,
        dashboard::user_stats,
        dashboard::overdue_bookings,
        dashboard::recent_bookings,
        dashboard::top_components,
        dashboard::category_summary,
    ),
    components(schemas(
        ErrorResponse,
        LoginRequest,
        LoginResponse,
        BookingResponse,
        CreateBookingRequest,
        RejectBookingRequest,
        ReturnResponse,
        DeleteBookingResponse,
        SweepResponse,
        ComponentResponse,
        CreateComponentRequest,
        UpdateComponentRequest,
        RemoveComponentResponse,
        StockMoveRequest,
        StockLevelsResponse,
        PenaltyResponse,
        CreatePenaltyRequest,
        UpdatePenaltyStatusRequest,
        PenaltyTotalsResponse,
        UserResponse,
        CreateUserRequest,
        UpdateUserRequest,
        ResetPasswordRequest,
        UpdateProfileRequest,
        AdminStatsResponse,
        TopComponentResponse,
        CategorySummaryResponse,
        InventoryTotalsResponse,
        UserStatsResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and service banner"),
        (name = "Authentication", description = "Login and the current account"),
        (name = "Bookings", description = "Borrowing requests and their lifecycle"),
        (name = "Components", description = "Catalogue and stock buckets"),
        (name = "Penalties", description = "Overdue, damage and loss charges"),
        (name = "Users", description = "Student and admin accounts"),
        (name = "Profile", description = "The caller's own account details"),
        (name = "Dashboard", description = "Aggregated figures"),
    ),
    info(
        title = "Lab Inventory API",
        version = "1.0.0",
        description = "Hardware lending for university labs",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
