pub mod health;
pub mod templates;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /templates                                       list, create
/// /templates/{id}                                  get, update, delete
/// /templates/{id}/devices                          affected devices
/// /templates/{id}/devices/{device_id}              assign, unassign
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/templates", templates::router())
}
