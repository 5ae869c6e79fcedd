//! Integration, external identifier mappings and the integration log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::value_objects::{EntityRef, ExternalType, LogStatus, PlatformType};

/// Per-integration feature toggles. Toggles this service does not know are kept as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    #[serde(default)]
    pub catalog_sync_enabled: bool,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// A tenant's connection to one external platform. Read-only to the sync pipeline.
#[derive(Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub platform: PlatformType,
    pub active: bool,
    /// Opaque credential blob, interpreted by the platform adapter.
    #[serde(skip_serializing)]
    pub credentials: serde_json::Value,
    pub settings: IntegrationSettings,
    pub created_at: DateTime<Utc>,
}

impl Integration {
    pub fn new(tenant_id: Uuid, platform: PlatformType, credentials: serde_json::Value, settings: IntegrationSettings) -> Self {
        Self { id: Uuid::now_v7(), tenant_id, platform, active: true, credentials, settings, created_at: Utc::now() }
    }

    pub fn catalog_sync_enabled(&self) -> bool { self.active && self.settings.catalog_sync_enabled }
}

impl fmt::Debug for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Integration")
            .field("id", &self.id)
            .field("tenant_id", &self.tenant_id)
            .field("platform", &self.platform)
            .field("active", &self.active)
            .field("credentials", &"<redacted>")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Maps one local entity to one remote object for an integration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalIdentifier {
    pub id: Uuid,
    pub integration_id: Uuid,
    pub entity: EntityRef,
    pub external_type: ExternalType,
    pub external_id: String,
    pub created_at: DateTime<Utc>,
}

impl ExternalIdentifier {
    pub fn new(integration_id: Uuid, entity: EntityRef, external_type: ExternalType, external_id: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), integration_id, entity, external_type, external_id: external_id.into(), created_at: Utc::now() }
    }
}

/// One sync attempt. Append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrationLog {
    pub id: Uuid,
    pub integration_id: Uuid,
    pub loggable: EntityRef,
    pub status: LogStatus,
    pub message: String,
    pub metadata: serde_json::Value,
    pub synced_at: DateTime<Utc>,
}

impl IntegrationLog {
    pub fn new(integration_id: Uuid, loggable: EntityRef, status: LogStatus, message: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self { id: Uuid::now_v7(), integration_id, loggable, status, message: message.into(), metadata, synced_at: Utc::now() }
    }

    pub fn success(integration_id: Uuid, loggable: EntityRef, message: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self::new(integration_id, loggable, LogStatus::Success, message, metadata)
    }

    pub fn error(integration_id: Uuid, loggable: EntityRef, message: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self::new(integration_id, loggable, LogStatus::Error, message, metadata)
    }
}
