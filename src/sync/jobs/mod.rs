//! Sync jobs
//!
//! A [`SyncJob`] carries only identifiers. Every job reloads the current persisted
//! state when it runs, so jobs for the same entity may execute in any order.
//!
//! Shared preconditions: an active integration for the tenant with catalog sync
//! enabled, and a remote client built from its credentials. When they are unmet the
//! job is a silent no-op and writes no log entry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::SyncSettings;
use crate::domain::aggregates::{Integration, IntegrationLog};
use crate::domain::value_objects::EntityRef;
use crate::shopify::{ClientFactory, RemoteCatalog, ShopifyError};
use crate::store::{CatalogStore, StoreError};

mod base_created;
mod base_deleted;
mod base_updated;
mod colorway_catalog;
mod colorway_images;

/// Queued unit of sync work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum SyncJob {
    BaseCreated { tenant_id: Uuid, base_id: Uuid },
    BaseUpdated { tenant_id: Uuid, base_id: Uuid },
    /// The base row is already gone when this runs.
    BaseDeleted { tenant_id: Uuid, base_id: Uuid },
    ColorwayCatalog { tenant_id: Uuid, colorway_id: Uuid },
    ColorwayImages { tenant_id: Uuid, colorway_id: Uuid },
}

impl SyncJob {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BaseCreated { .. } => "base_created",
            Self::BaseUpdated { .. } => "base_updated",
            Self::BaseDeleted { .. } => "base_deleted",
            Self::ColorwayCatalog { .. } => "colorway_catalog",
            Self::ColorwayImages { .. } => "colorway_images",
        }
    }

    pub fn tenant_id(&self) -> Uuid {
        match self {
            Self::BaseCreated { tenant_id, .. }
            | Self::BaseUpdated { tenant_id, .. }
            | Self::BaseDeleted { tenant_id, .. }
            | Self::ColorwayCatalog { tenant_id, .. }
            | Self::ColorwayImages { tenant_id, .. } => *tenant_id,
        }
    }

    /// Entity the job's log entries are keyed by.
    pub fn subject(&self) -> EntityRef {
        match self {
            Self::BaseCreated { base_id, .. } | Self::BaseUpdated { base_id, .. } | Self::BaseDeleted { base_id, .. } => EntityRef::Base(*base_id),
            Self::ColorwayCatalog { colorway_id, .. } | Self::ColorwayImages { colorway_id, .. } => EntityRef::Colorway(*colorway_id),
        }
    }
}

/// Why a job did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SyncDisabled,
    NoIntegration,
    ClientUnavailable,
    /// No remote object is mapped to the entity.
    NotLinked,
    EntityMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Skipped(SkipReason),
    Synced { count: usize },
    /// The platform rejected the request; recorded as an error log entry.
    Rejected { error: String },
}

/// Errors that escape a job and hand it back to the queue's retry policy.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Remote call failed: {0}")]
    Remote(#[from] ShopifyError),

    #[error("Remote client unavailable: {0}")]
    ClientUnavailable(#[source] ShopifyError),

    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),
}

impl JobError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(_) | Self::ClientUnavailable(_) => true,
            Self::Remote(e) => e.is_retryable(),
            Self::InvalidPayload(_) => false,
        }
    }

    /// A remote error the platform will keep returning; logged rather than retried.
    fn rejection(&self) -> Option<&ShopifyError> {
        match self {
            Self::Remote(e) if !e.is_retryable() => Some(e),
            _ => None,
        }
    }
}

/// Active integration plus a client for it.
pub(crate) struct Connection {
    pub integration: Integration,
    pub client: Arc<dyn RemoteCatalog>,
}

pub(crate) enum Resolved {
    Ready(Connection),
    Skip(SkipReason),
    ClientFailed(ShopifyError),
}

/// Collaborators every job runs against.
#[derive(Clone)]
pub struct SyncContext {
    store: Arc<dyn CatalogStore>,
    clients: Arc<dyn ClientFactory>,
    settings: SyncSettings,
}

impl SyncContext {
    pub fn new(store: Arc<dyn CatalogStore>, clients: Arc<dyn ClientFactory>, settings: SyncSettings) -> Self {
        Self { store, clients, settings }
    }

    pub fn store(&self) -> &dyn CatalogStore { self.store.as_ref() }

    pub async fn run(&self, job: &SyncJob) -> Result<JobOutcome, JobError> {
        let outcome = match *job {
            SyncJob::BaseCreated { tenant_id, base_id } => base_created::run(self, tenant_id, base_id).await,
            SyncJob::BaseUpdated { tenant_id, base_id } => base_updated::run(self, tenant_id, base_id).await,
            SyncJob::BaseDeleted { tenant_id, base_id } => base_deleted::run(self, tenant_id, base_id).await,
            SyncJob::ColorwayCatalog { tenant_id, colorway_id } => colorway_catalog::run(self, tenant_id, colorway_id).await,
            SyncJob::ColorwayImages { tenant_id, colorway_id } => colorway_images::run(self, tenant_id, colorway_id).await,
        }?;
        tracing::debug!(job = job.name(), tenant_id = %job.tenant_id(), ?outcome, "sync job finished");
        Ok(outcome)
    }

    pub(crate) async fn resolve(&self, tenant_id: Uuid) -> Result<Resolved, JobError> {
        if !self.settings.catalog_sync_enabled {
            return Ok(Resolved::Skip(SkipReason::SyncDisabled));
        }
        let Some(integration) = self.store.active_integration(tenant_id, self.settings.platform).await? else {
            return Ok(Resolved::Skip(SkipReason::NoIntegration));
        };
        if !integration.catalog_sync_enabled() {
            return Ok(Resolved::Skip(SkipReason::SyncDisabled));
        }
        match self.clients.connect(&integration) {
            Ok(client) => Ok(Resolved::Ready(Connection { integration, client })),
            Err(e) => Ok(Resolved::ClientFailed(e)),
        }
    }

    /// Resolves a connection for opportunistic jobs: a client failure is a silent skip.
    pub(crate) async fn connect(&self, tenant_id: Uuid) -> Result<Result<Connection, SkipReason>, JobError> {
        Ok(match self.resolve(tenant_id).await? {
            Resolved::Ready(conn) => Ok(conn),
            Resolved::Skip(reason) => Err(reason),
            Resolved::ClientFailed(e) => {
                tracing::debug!(%tenant_id, error = %e, "no usable remote client, skipping sync");
                Err(SkipReason::ClientUnavailable)
            }
        })
    }

    pub(crate) async fn record(&self, entry: IntegrationLog) -> Result<(), JobError> {
        self.store.append_log(&entry).await?;
        Ok(())
    }

    /// Writes one success entry.
    pub(crate) async fn record_success(&self, conn: &Connection, loggable: EntityRef, operation: &str, message: String, extra: serde_json::Value) -> Result<(), JobError> {
        self.record(IntegrationLog::success(conn.integration.id, loggable, message, metadata(operation, extra))).await
    }

    /// Converts a platform rejection into one error entry; other errors propagate.
    pub(crate) async fn settle_failure(&self, conn: &Connection, loggable: EntityRef, operation: &str, message: &str, error: JobError) -> Result<JobOutcome, JobError> {
        let text = match error.rejection() {
            Some(rejection) => rejection.to_string(),
            None => return Err(error),
        };
        tracing::warn!(%loggable, operation, error = %text, "remote platform rejected catalog sync");
        self.record(IntegrationLog::error(
            conn.integration.id,
            loggable,
            format!("{message}: {text}"),
            metadata(operation, serde_json::json!({ "error": text })),
        ))
        .await?;
        Ok(JobOutcome::Rejected { error: text })
    }
}

/// Standard log metadata merged with operation-specific keys.
pub(crate) fn metadata(operation: &str, extra: serde_json::Value) -> serde_json::Value {
    let mut meta = serde_json::json!({
        "source": "catalog_sync",
        "direction": "push",
        "operation": operation,
    });
    if let (Some(target), serde_json::Value::Object(extra)) = (meta.as_object_mut(), extra) {
        target.extend(extra);
    }
    meta
}
