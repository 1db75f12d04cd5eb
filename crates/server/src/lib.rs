//! HTTP surface of the lab inventory service.

pub mod auth;
pub mod config;
pub mod doc;
pub mod dtos;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod routes;
pub mod state;
pub mod utils;

use crate::{
    routes::{
        auth as auth_routes, booking, component, dashboard, health, penalty, profile, root, user,
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;

/// Builds the router with every route and middleware attached
pub fn app(state: AppState) -> Router {
    let bookings = Router::new()
        .route(
            "/",
            post(booking::create_booking).get(booking::list_bookings),
        )
        .route("/my", get(booking::my_bookings))
        .route("/pending", get(booking::pending_bookings))
        .route("/sweep-overdue", post(booking::sweep_overdue))
        .route(
            "/{id}",
            get(booking::get_booking).delete(booking::delete_booking),
        )
        .route("/{id}/approve", patch(booking::approve_booking))
        .route("/{id}/reject", patch(booking::reject_booking))
        .route("/{id}/return", patch(booking::return_booking))
        .route("/{id}/overdue", patch(booking::mark_overdue));

    let components = Router::new()
        .route(
            "/",
            get(component::list_components).post(component::create_component),
        )
        .route("/categories", get(component::list_categories))
        .route("/code/{code}", get(component::get_component_by_code))
        .route(
            "/{id}",
            get(component::get_component)
                .put(component::update_component)
                .patch(component::update_component)
                .delete(component::delete_component),
        )
        .route("/{id}/restock", post(component::restock))
        .route("/{id}/damaged", post(component::mark_damaged))
        .route("/{id}/maintenance", post(component::mark_under_maintenance))
        .route("/{id}/restore", post(component::restore));

    let penalties = Router::new()
        .route(
            "/",
            get(penalty::list_penalties).post(penalty::create_penalty),
        )
        .route("/my", get(penalty::my_penalties))
        .route("/{id}", get(penalty::get_penalty))
        .route("/{id}/status", patch(penalty::update_penalty_status));

    let users = Router::new()
        .route("/", get(user::list_users).post(user::create_user))
        .route(
            "/{id}",
            get(user::get_user)
                .put(user::update_user)
                .patch(user::update_user)
                .delete(user::delete_user),
        )
        .route("/{id}/reset-password", put(user::reset_password));

    let dashboard = Router::new()
        .route("/admin/stats", get(dashboard::admin_stats))
        .route("/low-stock", get(dashboard::low_stock))
        .route("/user/stats", get(dashboard::user_stats))
        .route("/overdue-bookings", get(dashboard::overdue_bookings))
        .route("/recent-bookings", get(dashboard::recent_bookings))
        .route("/top-components", get(dashboard::top_components))
        .route("/category-summary", get(dashboard::category_summary));

    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .route("/login", post(auth_routes::login))
        .route("/me", get(auth_routes::me))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api-docs/openapi.json", get(doc::openapi_json))
        .nest("/bookings", bookings)
        .nest("/components", components)
        .nest("/penalties", penalties)
        .nest("/users", users)
        .nest("/dashboard", dashboard)
        .layer(ServiceBuilder::new().layer(CompressionLayer::new()))
        .with_state(state)
}
