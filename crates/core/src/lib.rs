//! Domain layer for device configuration templates.
//!
//! Holds the template data model, the device configuration schema and its
//! secret redaction rules, the persistence seam ([`store::TemplateStore`]),
//! and [`service::TemplateService`], which owns every template lifecycle
//! invariant.

pub mod device_config;
pub mod error;
pub mod secrets;
pub mod service;
pub mod store;
pub mod template;
pub mod types;
