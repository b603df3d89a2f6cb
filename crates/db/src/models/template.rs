//! Row model for the `config_templates` table.

use devcfg_core::store::StoreError;
use devcfg_core::template::{ServiceConfigTemplate, TemplateScope};
use devcfg_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `config_templates` table.
#[derive(Debug, Clone, FromRow)]
pub struct TemplateRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub scope: String,
    pub device_type: Option<String>,
    pub config: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<TemplateRow> for ServiceConfigTemplate {
    type Error = StoreError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let scope: TemplateScope = row.scope.parse().map_err(|_| {
            StoreError::Backend(format!(
                "template {} has unknown scope '{}'",
                row.id, row.scope
            ))
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            scope,
            device_type: row.device_type,
            config: row.config,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
