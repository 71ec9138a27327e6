use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use timetable_core::TimetableConfig;
use timetable_scheduler::RoutineScheduler;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::http::{health, routine};

/// Shared state handed to every Axum handler as `Arc<AppState>`.
pub struct AppState {
    pub config: TimetableConfig,
    pub scheduler: RoutineScheduler,
}

impl AppState {
    pub fn new(config: TimetableConfig, scheduler: RoutineScheduler) -> Self {
        Self { config, scheduler }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/routine/slots", get(routine::slots))
        .route(
            "/routine/entries",
            get(routine::list_entries).post(routine::add_entry),
        )
        .route(
            "/routine/entries/{id}",
            get(routine::get_entry)
                .patch(routine::update_entry)
                .delete(routine::delete_entry),
        )
        .route("/routine/check", post(routine::check_entry))
        .route("/routine/audit", get(routine::audit))
        .with_state(state)
        // The dashboard front-end is served from a different origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
