//! Configuration template model, scope rules, and input validation.
//!
//! Provides the persisted [`ServiceConfigTemplate`], the create/update DTOs
//! accepted by the service, the redacted [`TemplateView`] handed back to
//! callers, and the name/scope/device-type validation helpers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device_config::DeviceConfiguration;
use crate::error::CoreError;
use crate::secrets::{self, SecretPresence};
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
   Scope
   -------------------------------------------------------------------------- */

/// Which devices a template can apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateScope {
    /// Every device.
    Global,
    /// Devices in a group.
    Group,
    /// Devices of one model/type; requires `device_type`.
    DeviceType,
}

impl TemplateScope {
    pub const ALL: [TemplateScope; 3] = [Self::Global, Self::Group, Self::DeviceType];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Group => "group",
            Self::DeviceType => "device_type",
        }
    }
}

impl fmt::Display for TemplateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| invalid_scope(s))
    }
}

fn invalid_scope(s: &str) -> CoreError {
    let valid: Vec<&str> = TemplateScope::ALL.iter().map(|s| s.as_str()).collect();
    CoreError::Validation(format!(
        "Invalid scope '{s}'. Must be one of: {}",
        valid.join(", ")
    ))
}

/* --------------------------------------------------------------------------
   Validation limits
   -------------------------------------------------------------------------- */

/// Maximum length for a template name.
pub const MAX_TEMPLATE_NAME_LEN: usize = 200;

/// Maximum length for a template description.
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Maximum length for a device type identifier.
pub const MAX_DEVICE_TYPE_LEN: usize = 100;

/* --------------------------------------------------------------------------
   Validation functions
   -------------------------------------------------------------------------- */

/// Validate a template name: non-blank after trimming and within length limit.
pub fn validate_template_name(name: &str) -> Result<(), CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Template name is required".to_string()));
    }
    if name.chars().count() > MAX_TEMPLATE_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Template name too long: {} chars (max {MAX_TEMPLATE_NAME_LEN})",
            name.chars().count()
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "Description too long: {} chars (max {MAX_DESCRIPTION_LEN})",
            description.chars().count()
        )));
    }
    Ok(())
}

/// Parse a required scope value. Absent and unrecognized are both invalid.
pub fn parse_scope(scope: Option<&str>) -> Result<TemplateScope, CoreError> {
    match scope {
        Some(s) => s.trim().parse(),
        None => Err(invalid_scope("")),
    }
}

/// Check device type against scope, returning the normalized value to store.
///
/// `device_type` scope requires a non-blank value. Other scopes accept a
/// blank or missing one, which is stored as `None`.
pub fn validate_device_type(
    scope: TemplateScope,
    device_type: Option<&str>,
) -> Result<Option<String>, CoreError> {
    let device_type = device_type.map(str::trim).filter(|s| !s.is_empty());

    if scope == TemplateScope::DeviceType && device_type.is_none() {
        return Err(CoreError::Validation(
            "Device type is required for device_type scope".to_string(),
        ));
    }
    if let Some(dt) = device_type {
        if dt.chars().count() > MAX_DEVICE_TYPE_LEN {
            return Err(CoreError::Validation(format!(
                "Device type too long: {} chars (max {MAX_DEVICE_TYPE_LEN})",
                dt.chars().count()
            )));
        }
    }
    Ok(device_type.map(str::to_string))
}

/// A new template must carry a configuration body.
pub fn validate_new_config(config: Option<DeviceConfiguration>) -> Result<DeviceConfiguration, CoreError> {
    config.ok_or_else(|| CoreError::Validation("Configuration is required".to_string()))
}

/// Treat a blank optional string as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/* --------------------------------------------------------------------------
   Entities and DTOs
   -------------------------------------------------------------------------- */

/// A persisted configuration template. `config` holds secrets in clear.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfigTemplate {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub scope: TemplateScope,
    pub device_type: Option<String>,
    pub config: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A validated template ready for insertion. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub scope: TemplateScope,
    pub device_type: Option<String>,
    pub config: Value,
}

/// DTO for creating a template.
///
/// Every field may be absent on the wire. Missing values are reported by
/// the service validators in check order, not by the JSON extractor.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub scope: Option<String>,
    pub device_type: Option<String>,
    pub config: Option<DeviceConfiguration>,
}

/// DTO for updating a template. All fields are optional.
///
/// Blank `name`/`description` mean "unchanged". Use `clear_description`
/// to remove a description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<DeviceConfiguration>,
    #[serde(default)]
    pub clear_description: bool,
    /// When set, the update only applies if the template was not modified since.
    pub expected_updated_at: Option<Timestamp>,
}

/// A template as returned to callers: secrets removed, presence flags attached.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateView {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub scope: TemplateScope,
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<DeviceConfiguration>,
    #[serde(flatten)]
    pub secrets: Option<SecretPresence>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ServiceConfigTemplate> for TemplateView {
    fn from(t: ServiceConfigTemplate) -> Self {
        let (config, secrets) = match secrets::redact_stored(&t.config) {
            Some((cfg, presence)) => (Some(cfg), Some(presence)),
            None => {
                tracing::warn!(template_id = t.id, "Returning template without configuration");
                (None, None)
            }
        };
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            scope: t.scope,
            device_type: t.device_type,
            config,
            secrets,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Result of an update: the template plus how many devices currently use it.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedTemplate {
    #[serde(flatten)]
    pub template: TemplateView,
    pub affected_device_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    // --- Scope ---

    #[test]
    fn scope_parses_all_valid_values() {
        assert_eq!("global".parse::<TemplateScope>().unwrap(), TemplateScope::Global);
        assert_eq!("group".parse::<TemplateScope>().unwrap(), TemplateScope::Group);
        assert_eq!(
            "device_type".parse::<TemplateScope>().unwrap(),
            TemplateScope::DeviceType
        );
    }

    #[test]
    fn scope_rejects_unknown_and_missing() {
        let err = parse_scope(Some("site")).unwrap_err();
        assert!(err.to_string().contains("Invalid scope"));
        assert_matches!(parse_scope(None), Err(CoreError::Validation(_)));
        assert_matches!(parse_scope(Some("Global")), Err(CoreError::Validation(_)));
    }

    #[test]
    fn scope_serializes_as_snake_case() {
        assert_eq!(serde_json::to_value(TemplateScope::DeviceType).unwrap(), json!("device_type"));
    }

    // --- Name ---

    #[test]
    fn name_must_not_be_blank() {
        let err = validate_template_name("   ").unwrap_err();
        assert!(err.to_string().contains("name is required"));
        assert!(validate_template_name("Living Room WiFi").is_ok());
    }

    #[test]
    fn name_length_is_limited() {
        let long_name = "x".repeat(MAX_TEMPLATE_NAME_LEN + 1);
        let err = validate_template_name(&long_name).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn name_limit_counts_characters_not_bytes() {
        assert!(validate_template_name(&"é".repeat(MAX_TEMPLATE_NAME_LEN)).is_ok());
        assert_matches!(
            validate_template_name(&"é".repeat(MAX_TEMPLATE_NAME_LEN + 1)),
            Err(CoreError::Validation(_))
        );
    }

    // --- Description ---

    #[test]
    fn description_accepted_at_limit_and_rejected_above() {
        assert!(validate_description(&"d".repeat(MAX_DESCRIPTION_LEN)).is_ok());
        let err = validate_description(&"d".repeat(MAX_DESCRIPTION_LEN + 1)).unwrap_err();
        assert_matches!(err, CoreError::Validation(ref msg) if msg.contains("Description too long"));
    }

    // --- Config ---

    #[test]
    fn missing_config_is_rejected() {
        assert_matches!(validate_new_config(None), Err(CoreError::Validation(ref msg)) if msg == "Configuration is required");
        assert!(validate_new_config(Some(DeviceConfiguration::default())).is_ok());
    }

    #[test]
    fn create_dto_tolerates_missing_fields() {
        let input: CreateTemplate = serde_json::from_value(json!({})).unwrap();
        assert_eq!(input.name, "");
        assert!(input.config.is_none());
    }

    // --- Device type ---

    #[test]
    fn device_type_accepted_at_limit_and_rejected_above() {
        let at_limit = "t".repeat(MAX_DEVICE_TYPE_LEN);
        assert_eq!(
            validate_device_type(TemplateScope::DeviceType, Some(at_limit.as_str())).unwrap(),
            Some(at_limit.clone())
        );
        assert_matches!(
            validate_device_type(TemplateScope::DeviceType, Some("t".repeat(MAX_DEVICE_TYPE_LEN + 1).as_str())),
            Err(CoreError::Validation(ref msg)) if msg.contains("Device type too long")
        );
    }

    #[test]
    fn device_type_scope_requires_device_type() {
        assert_matches!(
            validate_device_type(TemplateScope::DeviceType, Some("  ")),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_device_type(TemplateScope::DeviceType, None),
            Err(CoreError::Validation(_))
        );
        assert_eq!(
            validate_device_type(TemplateScope::DeviceType, Some(" SHPLG-S ")).unwrap(),
            Some("SHPLG-S".to_string())
        );
    }

    #[test]
    fn other_scopes_accept_missing_device_type() {
        assert_eq!(validate_device_type(TemplateScope::Global, None).unwrap(), None);
        assert_eq!(validate_device_type(TemplateScope::Group, Some("")).unwrap(), None);
    }

    // --- View ---

    fn stored(config: Value) -> ServiceConfigTemplate {
        let now = chrono::Utc::now();
        ServiceConfigTemplate {
            id: 1,
            name: "Living Room WiFi".to_string(),
            description: None,
            scope: TemplateScope::Global,
            device_type: None,
            config,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn view_redacts_and_reports_presence() {
        let view = TemplateView::from(stored(json!({ "wifi": { "password": "secret123" } })));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["has_wifi_password"], true);
        assert_eq!(json["has_mqtt_password"], false);
        assert_eq!(json["has_auth_password"], false);
        assert!(json["config"]["wifi"].get("password").is_none());
    }

    #[test]
    fn view_of_unparseable_config_has_no_body_or_flags() {
        let view = TemplateView::from(stored(json!({ "auth": "oops" })));
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("config").is_none());
        assert!(json.get("has_wifi_password").is_none());
        assert!(json.get("has_auth_password").is_none());
        assert_eq!(json["name"], "Living Room WiFi");
    }
}
