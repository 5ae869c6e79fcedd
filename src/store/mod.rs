//! Persistence port for the sync pipeline
//!
//! The pipeline only needs simple CRUD over the catalog tables. [`PgStore`] is the
//! production implementation; [`MemoryStore`] backs tests and local dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Base, Colorway, ExternalIdentifier, Integration, IntegrationLog, Inventory, Media};
use crate::domain::value_objects::{EntityKind, EntityRef, ExternalType, LogStatus, PlatformType};
use crate::CatalogSyncError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(#[from] CatalogSyncError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate external identifier for {0}")]
    DuplicateExternalId(EntityRef),
}

/// Filter for the integration log audit trail.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub loggable_type: Option<EntityKind>,
    pub loggable_id: Option<Uuid>,
    pub status: Option<LogStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl LogFilter {
    pub fn matches(&self, entry: &IntegrationLog) -> bool {
        self.loggable_type.map_or(true, |k| entry.loggable.kind() == k)
            && self.loggable_id.map_or(true, |id| entry.loggable.id() == id)
            && self.status.map_or(true, |s| entry.status == s)
    }
}

/// A job that exhausted its attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedJob {
    pub id: Uuid,
    pub payload: serde_json::Value,
    pub error: String,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// First active integration of the tenant for the platform.
    async fn active_integration(&self, tenant_id: Uuid, platform: PlatformType) -> Result<Option<Integration>, StoreError>;

    async fn find_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<Option<Base>, StoreError>;
    async fn find_colorway(&self, tenant_id: Uuid, colorway_id: Uuid) -> Result<Option<Colorway>, StoreError>;
    async fn colorway_media(&self, colorway_id: Uuid) -> Result<Vec<Media>, StoreError>;

    /// Existing inventory row for the triple, or a new zero-quantity one.
    async fn first_or_create_inventory(&self, tenant_id: Uuid, colorway_id: Uuid, base_id: Uuid) -> Result<Inventory, StoreError>;
    async fn inventories_for_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<Vec<Inventory>, StoreError>;
    async fn delete_inventories_for_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<u64, StoreError>;

    async fn find_external_id(&self, integration_id: Uuid, entity: EntityRef, external_type: ExternalType) -> Result<Option<ExternalIdentifier>, StoreError>;
    /// Every mapping of the given type held by entities of one kind.
    async fn external_ids_by_kind(&self, integration_id: Uuid, kind: EntityKind, external_type: ExternalType) -> Result<Vec<ExternalIdentifier>, StoreError>;
    async fn insert_external_id(&self, identifier: &ExternalIdentifier) -> Result<(), StoreError>;
    async fn delete_external_id(&self, id: Uuid) -> Result<(), StoreError>;

    async fn append_log(&self, entry: &IntegrationLog) -> Result<(), StoreError>;
    /// Log entries of the tenant's integrations, newest first.
    async fn query_logs(&self, tenant_id: Uuid, filter: &LogFilter) -> Result<Vec<IntegrationLog>, StoreError>;

    async fn record_failed_job(&self, job: &FailedJob) -> Result<(), StoreError>;
}
