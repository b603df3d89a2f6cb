//! Persistence seam for templates and their device assignments.
//!
//! [`TemplateStore`] is the narrow contract the service needs. The
//! PostgreSQL implementation lives in the db crate; [`MemoryTemplateStore`]
//! backs tests and local runs.

mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::template::{NewTemplate, ServiceConfigTemplate, TemplateScope};
use crate::types::{DbId, Timestamp};

pub use memory::MemoryTemplateStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("template {id} not found")]
    NotFound { id: DbId },

    /// A guarded save found a newer `updated_at` than expected.
    #[error("template {id} was modified concurrently")]
    Stale { id: DbId },

    /// Removal was refused because devices are still assigned.
    #[error("template {id} is still assigned to devices")]
    InUse { id: DbId },

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract for configuration templates.
///
/// Implementations own id assignment and both timestamps. `save_template`
/// must strictly advance `updated_at`.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// List templates in insertion order, optionally filtered by scope.
    async fn list_templates(
        &self,
        scope: Option<TemplateScope>,
    ) -> StoreResult<Vec<ServiceConfigTemplate>>;

    async fn get_template(&self, id: DbId) -> StoreResult<ServiceConfigTemplate>;

    /// Insert a template, returning it with its assigned id and timestamps.
    async fn insert_template(&self, template: &NewTemplate) -> StoreResult<ServiceConfigTemplate>;

    /// Persist the full state of an existing template.
    ///
    /// With `expected_updated_at`, the write only happens if the stored
    /// `updated_at` still equals it; otherwise [`StoreError::Stale`].
    async fn save_template(
        &self,
        template: &ServiceConfigTemplate,
        expected_updated_at: Option<Timestamp>,
    ) -> StoreResult<ServiceConfigTemplate>;

    /// Delete a template. Fails with [`StoreError::InUse`] while any device
    /// assignment references it.
    async fn remove_template(&self, id: DbId) -> StoreResult<()>;

    /// Device ids currently assigned to the template. Empty if none.
    async fn affected_devices(&self, template_id: DbId) -> StoreResult<BTreeSet<String>>;

    /// Record that a device uses a template, replacing any previous assignment.
    async fn assign_device(&self, template_id: DbId, device_id: &str) -> StoreResult<()>;

    /// Remove a device's assignment to the template. Returns `false` if there was none.
    async fn unassign_device(&self, template_id: DbId, device_id: &str) -> StoreResult<bool>;

    /// Check the backing storage is reachable.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
