//! Pharma QC Records - Backend
//!
//! Raw material receipt, sampling, specification, testing and certificates
//! of analysis for a pharmaceutical quality-control laboratory.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod services;

pub use config::Config;
use repository::SharedRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: SharedRepository,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: SharedRepository, config: Config) -> Self {
        Self {
            repo,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Pharma QC Records API v1.0"
}
