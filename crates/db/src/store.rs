//! [`TemplateStore`] backed by PostgreSQL.

use std::collections::BTreeSet;

use async_trait::async_trait;
use devcfg_core::store::{StoreError, StoreResult, TemplateStore};
use devcfg_core::template::{NewTemplate, ServiceConfigTemplate, TemplateScope};
use devcfg_core::types::{DbId, Timestamp};

use crate::repositories::{DeviceAssignmentRepo, TemplateRepo};
use crate::DbPool;

/// PostgreSQL foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION))
}

/// Template store over a connection pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgTemplateStore {
    pool: DbPool,
}

impl PgTemplateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn list_templates(
        &self,
        scope: Option<TemplateScope>,
    ) -> StoreResult<Vec<ServiceConfigTemplate>> {
        TemplateRepo::list(&self.pool, scope)
            .await
            .map_err(backend)?
            .into_iter()
            .map(ServiceConfigTemplate::try_from)
            .collect()
    }

    async fn get_template(&self, id: DbId) -> StoreResult<ServiceConfigTemplate> {
        TemplateRepo::find_by_id(&self.pool, id)
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound { id })?
            .try_into()
    }

    async fn insert_template(&self, template: &NewTemplate) -> StoreResult<ServiceConfigTemplate> {
        TemplateRepo::create(&self.pool, template)
            .await
            .map_err(backend)?
            .try_into()
    }

    async fn save_template(
        &self,
        template: &ServiceConfigTemplate,
        expected_updated_at: Option<Timestamp>,
    ) -> StoreResult<ServiceConfigTemplate> {
        let id = template.id;
        match TemplateRepo::save(&self.pool, template, expected_updated_at)
            .await
            .map_err(backend)?
        {
            Some(row) => row.try_into(),
            None => {
                // Distinguish a vanished row from a lost optimistic-concurrency race.
                let exists = TemplateRepo::find_by_id(&self.pool, id)
                    .await
                    .map_err(backend)?
                    .is_some();
                if exists && expected_updated_at.is_some() {
                    Err(StoreError::Stale { id })
                } else {
                    Err(StoreError::NotFound { id })
                }
            }
        }
    }

    async fn remove_template(&self, id: DbId) -> StoreResult<()> {
        match TemplateRepo::delete(&self.pool, id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound { id }),
            // ON DELETE RESTRICT from device_template_assignments.
            Err(e) if is_foreign_key_violation(&e) => Err(StoreError::InUse { id }),
            Err(e) => Err(backend(e)),
        }
    }

    async fn affected_devices(&self, template_id: DbId) -> StoreResult<BTreeSet<String>> {
        let ids = DeviceAssignmentRepo::device_ids_for_template(&self.pool, template_id)
            .await
            .map_err(backend)?;
        Ok(ids.into_iter().collect())
    }

    async fn assign_device(&self, template_id: DbId, device_id: &str) -> StoreResult<()> {
        match DeviceAssignmentRepo::assign(&self.pool, template_id, device_id).await {
            Ok(_) => Ok(()),
            Err(e) if is_foreign_key_violation(&e) => Err(StoreError::NotFound { id: template_id }),
            Err(e) => Err(backend(e)),
        }
    }

    async fn unassign_device(&self, template_id: DbId, device_id: &str) -> StoreResult<bool> {
        DeviceAssignmentRepo::unassign(&self.pool, template_id, device_id)
            .await
            .map_err(backend)
    }

    async fn ping(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await.map_err(backend)
    }
}
