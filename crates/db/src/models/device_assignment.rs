//! Row model for the `device_template_assignments` table.

use devcfg_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `device_template_assignments` table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceAssignment {
    pub device_id: String,
    pub template_id: DbId,
    pub assigned_at: Timestamp,
}
