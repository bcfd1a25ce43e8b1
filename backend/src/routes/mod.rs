//! Route definitions for the Pharma QC Records API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes
        .merge(protected_routes(state))
}

/// Everything behind bearer authentication
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .nest("/materials", material_routes())
        .nest("/samples", sample_routes())
        .route("/reports/coas", get(handlers::get_coa_register))
        .route("/audit-log", get(handlers::list_audit_log))
        .route("/accession/next", get(handlers::next_accession))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Raw material routes
fn material_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_materials).post(handlers::receive_material),
        )
        .route(
            "/:material_id",
            get(handlers::get_material).delete(handlers::delete_material),
        )
        .route(
            "/:material_id/specifications",
            get(handlers::list_specifications).post(handlers::add_specification),
        )
        .route("/:material_id/samples", post(handlers::take_sample))
}

/// Sample, result and COA routes
fn sample_routes() -> Router<AppState> {
    Router::new()
        .route("/:sample_id", get(handlers::get_sample))
        .route("/:sample_id/results", post(handlers::record_result))
        .route(
            "/:sample_id/coa",
            get(handlers::get_coa).post(handlers::generate_coa),
        )
}
