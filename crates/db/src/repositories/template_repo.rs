//! Repository for the `config_templates` table.

use sqlx::PgPool;
use devcfg_core::template::{NewTemplate, ServiceConfigTemplate, TemplateScope};
use devcfg_core::types::{DbId, Timestamp};

use crate::models::template::TemplateRow;

const COLUMNS: &str = "id, name, description, scope, device_type, config, created_at, updated_at";

/// Provides CRUD operations for configuration templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Insert a new template, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewTemplate) -> Result<TemplateRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO config_templates (name, description, scope, device_type, config) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.scope.as_str())
            .bind(&input.device_type)
            .bind(&input.config)
            .fetch_one(pool)
            .await
    }

    /// Find a template by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TemplateRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM config_templates WHERE id = $1");
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List templates in insertion order, optionally restricted to one scope.
    pub async fn list(
        pool: &PgPool,
        scope: Option<TemplateScope>,
    ) -> Result<Vec<TemplateRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM config_templates \
             WHERE ($1::TEXT IS NULL OR scope = $1) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(scope.map(TemplateScope::as_str))
            .fetch_all(pool)
            .await
    }

    /// Write the mutable fields of a template and advance `updated_at`.
    ///
    /// Scope and device type are never written. When `expected_updated_at`
    /// is given the row is only updated if it still carries that timestamp.
    /// Returns `None` if no row matched.
    pub async fn save(
        pool: &PgPool,
        template: &ServiceConfigTemplate,
        expected_updated_at: Option<Timestamp>,
    ) -> Result<Option<TemplateRow>, sqlx::Error> {
        let query = format!(
            "UPDATE config_templates SET \
                name = $2, \
                description = $3, \
                config = $4, \
                updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond') \
             WHERE id = $1 \
               AND ($5::TIMESTAMPTZ IS NULL OR updated_at = $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TemplateRow>(&query)
            .bind(template.id)
            .bind(&template.name)
            .bind(&template.description)
            .bind(&template.config)
            .bind(expected_updated_at)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a template by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM config_templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
