//! Secret detection and redaction for device configurations.
//!
//! This is the only place that knows which configuration fields hold
//! credentials. Callers detect presence first, then redact the same parsed
//! value, and surface presence as booleans only.

use serde::Serialize;
use serde_json::Value;

use crate::device_config::DeviceConfiguration;

/// Which secrets a configuration carries. Never holds the values themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SecretPresence {
    pub has_wifi_password: bool,
    pub has_mqtt_password: bool,
    pub has_auth_password: bool,
}

impl SecretPresence {
    pub fn detect(cfg: &DeviceConfiguration) -> Self {
        Self {
            has_wifi_password: has_wifi_secret(cfg),
            has_mqtt_password: has_mqtt_secret(cfg),
            has_auth_password: has_auth_secret(cfg),
        }
    }
}

fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// True if either the station or the access-point password is set.
pub fn has_wifi_secret(cfg: &DeviceConfiguration) -> bool {
    is_set(cfg.wifi_password()) || is_set(cfg.wifi_ap_password())
}

pub fn has_mqtt_secret(cfg: &DeviceConfiguration) -> bool {
    is_set(cfg.mqtt_password())
}

pub fn has_auth_secret(cfg: &DeviceConfiguration) -> bool {
    is_set(cfg.auth_password())
}

/// Clear every known secret field in place. Idempotent.
pub fn redact(cfg: &mut DeviceConfiguration) {
    if let Some(wifi) = cfg.wifi.as_mut() {
        wifi.password = None;
        if let Some(ap) = wifi.ap.as_mut() {
            ap.password = None;
        }
    }
    if let Some(mqtt) = cfg.mqtt.as_mut() {
        mqtt.password = None;
    }
    if let Some(auth) = cfg.auth.as_mut() {
        auth.password = None;
    }
}

/// Prepare a stored configuration document for display.
///
/// Returns the redacted configuration with its presence flags, or `None`
/// when the document does not parse. Unparseable documents are never echoed
/// back in any form.
pub fn redact_stored(raw: &Value) -> Option<(DeviceConfiguration, SecretPresence)> {
    let mut cfg = match DeviceConfiguration::from_stored(raw) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "Stored device configuration failed to parse");
            return None;
        }
    };
    let presence = SecretPresence::detect(&cfg);
    redact(&mut cfg);
    Some((cfg, presence))
}
