//! Handlers for configuration templates and their device assignments.
//!
//! Thin adapters: decode the request, call [`TemplateService`], wrap the
//! result in the `{ "data": ... }` envelope. All rules live in the service.
//!
//! [`TemplateService`]: devcfg_core::service::TemplateService

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use devcfg_core::template::{self, CreateTemplate, UpdateTemplate};
use devcfg_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameters / responses
// ---------------------------------------------------------------------------

/// Query parameters for listing templates (`?scope=`).
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub scope: Option<String>,
}

/// Devices currently using a template.
#[derive(Debug, Serialize)]
pub struct AffectedDevicesResponse {
    pub template_id: DbId,
    pub device_ids: Vec<String>,
    pub device_count: usize,
}

// ---------------------------------------------------------------------------
// GET /templates
// ---------------------------------------------------------------------------

/// List templates, optionally filtered by scope.
pub async fn list_templates(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params?;
    let scope = match template::non_blank(params.scope.as_deref()) {
        Some(s) => Some(template::parse_scope(Some(s))?),
        None => None,
    };
    let items = state.templates.list_templates(scope).await?;
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// POST /templates
// ---------------------------------------------------------------------------

/// Create a new template.
pub async fn create_template(
    State(state): State<AppState>,
    input: Result<Json<CreateTemplate>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = input?;
    let created = state.templates.create_template(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// GET /templates/{id}
// ---------------------------------------------------------------------------

/// Get a single template by ID.
pub async fn get_template(
    State(state): State<AppState>,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(id) = id?;
    let t = state.templates.get_template(id).await?;
    Ok(Json(DataResponse { data: t }))
}

// ---------------------------------------------------------------------------
// PUT /templates/{id}
// ---------------------------------------------------------------------------

/// Partially update a template. Returns it with the affected device count.
pub async fn update_template(
    State(state): State<AppState>,
    id: Result<Path<DbId>, PathRejection>,
    input: Result<Json<UpdateTemplate>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(id) = id?;
    let Json(input) = input?;
    let updated = state.templates.update_template(id, input).await?;
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// DELETE /templates/{id}
// ---------------------------------------------------------------------------

/// Delete a template that no device uses.
pub async fn delete_template(
    State(state): State<AppState>,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = id?;
    state.templates.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /templates/{id}/devices
// ---------------------------------------------------------------------------

/// List the devices assigned to a template.
pub async fn affected_devices(
    State(state): State<AppState>,
    id: Result<Path<DbId>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let Path(id) = id?;
    let devices = state.templates.affected_devices(id).await?;
    let device_ids: Vec<String> = devices.into_iter().collect();
    Ok(Json(DataResponse {
        data: AffectedDevicesResponse {
            template_id: id,
            device_count: device_ids.len(),
            device_ids,
        },
    }))
}

// ---------------------------------------------------------------------------
// PUT /templates/{id}/devices/{device_id}
// ---------------------------------------------------------------------------

/// Record that a device uses this template.
pub async fn assign_device(
    State(state): State<AppState>,
    path: Result<Path<(DbId, String)>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path((id, device_id)) = path?;
    state.templates.assign_device(id, &device_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// DELETE /templates/{id}/devices/{device_id}
// ---------------------------------------------------------------------------

/// Remove a device's assignment to this template.
pub async fn unassign_device(
    State(state): State<AppState>,
    path: Result<Path<(DbId, String)>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path((id, device_id)) = path?;
    state.templates.unassign_device(id, &device_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
