//! Defines routes for the gallery API.
//!
//! ## Structure
//! - `GET  /healthz`: liveness
//! - `GET  /readyz`: readiness (store reachable)
//! - `ANY  /api/imageHandler`: create (POST), list (GET), comment (PATCH);
//!   anything else is 405

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        image_handlers::{IMAGE_HANDLER_PATH, image_handler},
    },
    services::image_service::ImageService,
};
use axum::{
    Router,
    routing::{any, get},
};

/// Build the router. Handlers share `ImageService` as state.
pub fn routes() -> Router<ImageService> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(IMAGE_HANDLER_PATH, any(image_handler))
}
