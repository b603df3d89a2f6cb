//! Template lifecycle service.
//!
//! Validates input, enforces scope rules, merges partial updates in memory,
//! refuses to delete templates that devices still use, and redacts every
//! template on its way out.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::store::{StoreError, TemplateStore};
use crate::template::{
    self, CreateTemplate, NewTemplate, TemplateScope, TemplateView, UpdateTemplate,
    UpdatedTemplate,
};
use crate::types::DbId;

const ENTITY: &str = "Template";

/// Maximum length for a device identifier in assignment bookkeeping.
pub const MAX_DEVICE_ID_LEN: usize = 128;

/// Convert a store failure into a domain error, logging backend failures.
fn store_error(operation: &'static str, id: Option<DbId>, err: StoreError) -> CoreError {
    match err {
        StoreError::NotFound { id } => CoreError::NotFound { entity: ENTITY, id },
        StoreError::Stale { id } => {
            CoreError::Conflict(format!("Template {id} was modified concurrently"))
        }
        StoreError::InUse { id } => {
            CoreError::Conflict(format!("Template {id} is still assigned to devices"))
        }
        StoreError::Backend(msg) => {
            tracing::error!(operation, template_id = ?id, error = %msg, "Template store failure");
            CoreError::Internal(format!("{operation} failed"))
        }
    }
}

fn serialization_error(operation: &'static str, id: Option<DbId>, err: serde_json::Error) -> CoreError {
    tracing::error!(operation, template_id = ?id, error = %err, "Config serialization failed");
    CoreError::Internal(format!("{operation} failed"))
}

fn validate_device_id(device_id: &str) -> CoreResult<&str> {
    let device_id = device_id.trim();
    if device_id.is_empty() {
        return Err(CoreError::Validation("Device id is required".to_string()));
    }
    if device_id.chars().count() > MAX_DEVICE_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Device id too long (max {MAX_DEVICE_ID_LEN})"
        )));
    }
    Ok(device_id)
}

/// Stateless orchestrator over a [`TemplateStore`]. Cheap to clone.
#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn TemplateStore>,
}

impl TemplateService {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    pub async fn list_templates(&self, scope: Option<TemplateScope>) -> CoreResult<Vec<TemplateView>> {
        let items = self
            .store
            .list_templates(scope)
            .await
            .map_err(|e| store_error("list_templates", None, e))?;
        tracing::debug!(count = items.len(), scope = ?scope, "Listed templates");
        Ok(items.into_iter().map(TemplateView::from).collect())
    }

    pub async fn get_template(&self, id: DbId) -> CoreResult<TemplateView> {
        let t = self
            .store
            .get_template(id)
            .await
            .map_err(|e| store_error("get_template", Some(id), e))?;
        Ok(t.into())
    }

    /// Validate and insert a new template.
    ///
    /// Checks run in order: name, scope, device type, config, description.
    /// Nothing is written unless all pass.
    pub async fn create_template(&self, input: CreateTemplate) -> CoreResult<TemplateView> {
        template::validate_template_name(&input.name)?;
        let scope = template::parse_scope(input.scope.as_deref())?;
        let device_type = template::validate_device_type(scope, input.device_type.as_deref())?;
        let config = template::validate_new_config(input.config)?;
        let description = template::non_blank(input.description.as_deref()).map(str::to_string);
        if let Some(d) = &description {
            template::validate_description(d)?;
        }

        let config = config
            .to_stored()
            .map_err(|e| serialization_error("create_template", None, e))?;

        let new = NewTemplate {
            name: input.name.trim().to_string(),
            description,
            scope,
            device_type,
            config,
        };
        let created = self
            .store
            .insert_template(&new)
            .await
            .map_err(|e| store_error("create_template", None, e))?;

        tracing::info!(
            template_id = created.id,
            name = %created.name,
            scope = %created.scope,
            "Template created"
        );
        Ok(created.into())
    }

    /// Apply a partial update.
    ///
    /// Absent or blank fields leave the stored value unchanged. Scope and
    /// device type cannot change. The merge completes in memory before the
    /// single store write.
    pub async fn update_template(&self, id: DbId, input: UpdateTemplate) -> CoreResult<UpdatedTemplate> {
        let mut existing = self
            .store
            .get_template(id)
            .await
            .map_err(|e| store_error("update_template", Some(id), e))?;

        if let Some(name) = template::non_blank(input.name.as_deref()) {
            template::validate_template_name(name)?;
            existing.name = name.trim().to_string();
        }
        if input.clear_description {
            existing.description = None;
        } else if let Some(description) = template::non_blank(input.description.as_deref()) {
            template::validate_description(description)?;
            existing.description = Some(description.to_string());
        }
        if let Some(config) = &input.config {
            existing.config = config
                .to_stored()
                .map_err(|e| serialization_error("update_template", Some(id), e))?;
        }

        let saved = self
            .store
            .save_template(&existing, input.expected_updated_at)
            .await
            .map_err(|e| store_error("update_template", Some(id), e))?;

        let affected_device_count = self
            .store
            .affected_devices(id)
            .await
            .map_err(|e| store_error("update_template", Some(id), e))?
            .len();

        tracing::info!(template_id = id, affected_device_count, "Template updated");
        Ok(UpdatedTemplate {
            template: saved.into(),
            affected_device_count,
        })
    }

    /// Delete an unassigned template.
    ///
    /// Fails with [`CoreError::TemplateAssigned`] while any device uses it.
    /// Assignments are never removed here.
    pub async fn delete_template(&self, id: DbId) -> CoreResult<()> {
        self.store
            .get_template(id)
            .await
            .map_err(|e| store_error("delete_template", Some(id), e))?;

        let devices = self
            .store
            .affected_devices(id)
            .await
            .map_err(|e| store_error("delete_template", Some(id), e))?;
        if !devices.is_empty() {
            tracing::info!(template_id = id, device_count = devices.len(), "Delete refused, template in use");
            return Err(CoreError::TemplateAssigned {
                id,
                device_count: devices.len(),
            });
        }

        match self.store.remove_template(id).await {
            Ok(()) => {}
            // A device was assigned after the check above.
            Err(StoreError::InUse { .. }) => {
                let device_count = self
                    .store
                    .affected_devices(id)
                    .await
                    .map_err(|e| store_error("delete_template", Some(id), e))?
                    .len();
                tracing::info!(template_id = id, device_count, "Delete refused, template assigned concurrently");
                return Err(CoreError::TemplateAssigned { id, device_count });
            }
            Err(e) => return Err(store_error("delete_template", Some(id), e)),
        }
        tracing::info!(template_id = id, "Template deleted");
        Ok(())
    }

    /// Devices currently assigned to an existing template.
    pub async fn affected_devices(&self, id: DbId) -> CoreResult<BTreeSet<String>> {
        self.store
            .get_template(id)
            .await
            .map_err(|e| store_error("affected_devices", Some(id), e))?;
        self.store
            .affected_devices(id)
            .await
            .map_err(|e| store_error("affected_devices", Some(id), e))
    }

    pub async fn assign_device(&self, id: DbId, device_id: &str) -> CoreResult<()> {
        let device_id = validate_device_id(device_id)?;
        self.store
            .assign_device(id, device_id)
            .await
            .map_err(|e| store_error("assign_device", Some(id), e))?;
        tracing::info!(template_id = id, device_id, "Device assigned to template");
        Ok(())
    }

    pub async fn unassign_device(&self, id: DbId, device_id: &str) -> CoreResult<()> {
        let device_id = validate_device_id(device_id)?;
        let removed = self
            .store
            .unassign_device(id, device_id)
            .await
            .map_err(|e| store_error("unassign_device", Some(id), e))?;
        if !removed {
            return Err(CoreError::NotFound {
                entity: "Device assignment for template",
                id,
            });
        }
        tracing::info!(template_id = id, device_id, "Device unassigned from template");
        Ok(())
    }
}
