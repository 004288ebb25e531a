//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Time slots
        .route("/horarios", post(handlers::create_slot))
        .route("/horarios", get(handlers::list_slots))
        .route("/horarios/modalidad/{modalidad}", get(handlers::list_slots_by_modalidad))
        .route("/horarios/{id}", get(handlers::get_slot))
        .route("/horarios/{id}", put(handlers::update_slot))
        .route("/horarios/{id}", delete(handlers::delete_slot))
        // Rooms
        .route("/aulas", post(handlers::create_room))
        .route("/aulas", get(handlers::list_rooms))
        .route("/aulas/{id}", get(handlers::get_room))
        // Enrollments
        .route("/matriculas", post(handlers::create_enrollment))
        .route("/matriculas", get(handlers::list_enrollments))
        .route("/matriculas/{id}", get(handlers::get_enrollment))
        .route("/matriculas/{id}", patch(handlers::update_enrollment))
        .route("/matriculas/{id}", delete(handlers::delete_enrollment))
        .route("/matriculas/{id}/horarios", get(handlers::get_enrollment_schedule))
        .route("/matriculas/{id}/materias", get(handlers::get_enrollment_subjects))
        .route("/usuarios/{id}/matriculas", get(handlers::list_enrollments_by_teacher));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
