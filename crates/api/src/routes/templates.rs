//! Route definitions for configuration templates.
//!
//! Mounted at `/templates`.
//!
//! ```text
//! GET    /                              list_templates (?scope=)
//! POST   /                              create_template
//! GET    /{id}                          get_template
//! PUT    /{id}                          update_template
//! DELETE /{id}                          delete_template
//! GET    /{id}/devices                  affected_devices
//! PUT    /{id}/devices/{device_id}      assign_device
//! DELETE /{id}/devices/{device_id}      unassign_device
//! ```

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::templates;
use crate::state::AppState;

/// Template routes, mounted at `/templates`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/{id}",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/{id}/devices", get(templates::affected_devices))
        .route(
            "/{id}/devices/{device_id}",
            put(templates::assign_device).delete(templates::unassign_device),
        )
}
