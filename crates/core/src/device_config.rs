//! Device configuration document stored inside a template.
//!
//! Only the secret-bearing sections (`wifi`, `mqtt`, `auth`) are modelled as
//! typed structs. Every other key, at the top level or inside those
//! sections, is kept in a flattened `extra` map so it round-trips through
//! storage untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The full settings document applied to a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi: Option<WifiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqtt: Option<MqttConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
    /// Sections this service does not interpret (cloud, sntp, relays, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wi-Fi station settings plus the optional access-point block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap: Option<AccessPointConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessPointConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceConfiguration {
    /// Parse a stored document. Fails when a known section has the wrong shape.
    pub fn from_stored(raw: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(raw)
    }

    /// Serialize for storage. Secrets are kept as-is.
    pub fn to_stored(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn wifi_password(&self) -> Option<&str> {
        self.wifi.as_ref()?.password.as_deref()
    }

    pub fn wifi_ap_password(&self) -> Option<&str> {
        self.wifi.as_ref()?.ap.as_ref()?.password.as_deref()
    }

    pub fn mqtt_password(&self) -> Option<&str> {
        self.mqtt.as_ref()?.password.as_deref()
    }

    pub fn auth_password(&self) -> Option<&str> {
        self.auth.as_ref()?.password.as_deref()
    }
}
