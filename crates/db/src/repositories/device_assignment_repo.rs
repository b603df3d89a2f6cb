//! Repository for the `device_template_assignments` table.

use sqlx::PgPool;
use devcfg_core::types::DbId;

use crate::models::device_assignment::DeviceAssignment;

/// Tracks which template each device uses.
pub struct DeviceAssignmentRepo;

impl DeviceAssignmentRepo {
    /// Device ids assigned to a template, sorted.
    pub async fn device_ids_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT device_id FROM device_template_assignments \
             WHERE template_id = $1 ORDER BY device_id",
        )
        .bind(template_id)
        .fetch_all(pool)
        .await
    }

    /// Assign a device to a template, replacing any existing assignment.
    pub async fn assign(
        pool: &PgPool,
        template_id: DbId,
        device_id: &str,
    ) -> Result<DeviceAssignment, sqlx::Error> {
        sqlx::query_as::<_, DeviceAssignment>(
            "INSERT INTO device_template_assignments (device_id, template_id) \
             VALUES ($1, $2) \
             ON CONFLICT (device_id) DO UPDATE \
                SET template_id = EXCLUDED.template_id, assigned_at = NOW() \
             RETURNING device_id, template_id, assigned_at",
        )
        .bind(device_id)
        .bind(template_id)
        .fetch_one(pool)
        .await
    }

    /// Remove a device's assignment to the given template. Returns `true` if removed.
    pub async fn unassign(
        pool: &PgPool,
        template_id: DbId,
        device_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM device_template_assignments WHERE device_id = $1 AND template_id = $2",
        )
        .bind(device_id)
        .bind(template_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
