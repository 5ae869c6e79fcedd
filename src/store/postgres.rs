//! PostgreSQL implementation of [`CatalogStore`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CatalogStore, FailedJob, LogFilter, StoreError};
use crate::domain::aggregates::{Base, Colorway, ExternalIdentifier, Integration, IntegrationLog, IntegrationSettings, Inventory, Media};
use crate::domain::value_objects::{EntityKind, EntityRef, ExternalType, LogStatus, PlatformType};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
    pub fn pool(&self) -> &PgPool { &self.pool }
}

#[derive(sqlx::FromRow)]
struct IntegrationRow {
    id: Uuid,
    tenant_id: Uuid,
    platform: PlatformType,
    active: bool,
    credentials: serde_json::Value,
    settings: Json<IntegrationSettings>,
    created_at: DateTime<Utc>,
}

impl From<IntegrationRow> for Integration {
    fn from(r: IntegrationRow) -> Self {
        Self { id: r.id, tenant_id: r.tenant_id, platform: r.platform, active: r.active, credentials: r.credentials, settings: r.settings.0, created_at: r.created_at }
    }
}

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: Uuid,
    tenant_id: Uuid,
    mediable_type: String,
    mediable_id: Uuid,
    file_path: String,
    file_name: String,
    is_primary: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<MediaRow> for Media {
    type Error = StoreError;
    fn try_from(r: MediaRow) -> Result<Self, Self::Error> {
        let owner = EntityRef::from_parts(&r.mediable_type, r.mediable_id)?;
        let mut media = Media::create(r.tenant_id, owner, r.file_path);
        media.id = r.id;
        media.file_name = r.file_name;
        media.is_primary = r.is_primary;
        media.sort_order = r.sort_order;
        media.created_at = r.created_at;
        Ok(media)
    }
}

#[derive(sqlx::FromRow)]
struct ExternalIdRow {
    id: Uuid,
    integration_id: Uuid,
    identifiable_type: String,
    identifiable_id: Uuid,
    external_type: ExternalType,
    external_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExternalIdRow> for ExternalIdentifier {
    type Error = StoreError;
    fn try_from(r: ExternalIdRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            integration_id: r.integration_id,
            entity: EntityRef::from_parts(&r.identifiable_type, r.identifiable_id)?,
            external_type: r.external_type,
            external_id: r.external_id,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LogRow {
    id: Uuid,
    integration_id: Uuid,
    loggable_type: String,
    loggable_id: Uuid,
    status: LogStatus,
    message: String,
    metadata: serde_json::Value,
    synced_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for IntegrationLog {
    type Error = StoreError;
    fn try_from(r: LogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            integration_id: r.integration_id,
            loggable: EntityRef::from_parts(&r.loggable_type, r.loggable_id)?,
            status: r.status,
            message: r.message,
            metadata: r.metadata,
            synced_at: r.synced_at,
        })
    }
}

const EXTERNAL_ID_COLUMNS: &str = "id, integration_id, identifiable_type, identifiable_id, external_type, external_id, created_at";

#[async_trait]
impl CatalogStore for PgStore {
    async fn active_integration(&self, tenant_id: Uuid, platform: PlatformType) -> Result<Option<Integration>, StoreError> {
        let row = sqlx::query_as::<_, IntegrationRow>(
            "SELECT id, tenant_id, platform, active, credentials, settings, created_at FROM integrations WHERE tenant_id = $1 AND platform = $2 AND active ORDER BY created_at LIMIT 1",
        )
        .bind(tenant_id).bind(platform)
        .fetch_optional(&self.pool).await?;
        Ok(row.map(Integration::from))
    }

    async fn find_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<Option<Base>, StoreError> {
        Ok(sqlx::query_as::<_, Base>("SELECT * FROM bases WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id).bind(base_id)
            .fetch_optional(&self.pool).await?)
    }

    async fn find_colorway(&self, tenant_id: Uuid, colorway_id: Uuid) -> Result<Option<Colorway>, StoreError> {
        Ok(sqlx::query_as::<_, Colorway>("SELECT * FROM colorways WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id).bind(colorway_id)
            .fetch_optional(&self.pool).await?)
    }

    async fn colorway_media(&self, colorway_id: Uuid) -> Result<Vec<Media>, StoreError> {
        sqlx::query_as::<_, MediaRow>("SELECT * FROM media WHERE mediable_type = $1 AND mediable_id = $2 ORDER BY sort_order, created_at")
            .bind(EntityKind::Colorway).bind(colorway_id)
            .fetch_all(&self.pool).await?
            .into_iter().map(Media::try_from).collect()
    }

    async fn first_or_create_inventory(&self, tenant_id: Uuid, colorway_id: Uuid, base_id: Uuid) -> Result<Inventory, StoreError> {
        sqlx::query("INSERT INTO inventories (id, tenant_id, colorway_id, base_id, quantity, created_at, updated_at) VALUES ($1, $2, $3, $4, 0, NOW(), NOW()) ON CONFLICT (tenant_id, colorway_id, base_id) DO NOTHING")
            .bind(Uuid::now_v7()).bind(tenant_id).bind(colorway_id).bind(base_id)
            .execute(&self.pool).await?;
        Ok(sqlx::query_as::<_, Inventory>("SELECT * FROM inventories WHERE tenant_id = $1 AND colorway_id = $2 AND base_id = $3")
            .bind(tenant_id).bind(colorway_id).bind(base_id)
            .fetch_one(&self.pool).await?)
    }

    async fn inventories_for_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<Vec<Inventory>, StoreError> {
        Ok(sqlx::query_as::<_, Inventory>("SELECT * FROM inventories WHERE tenant_id = $1 AND base_id = $2 ORDER BY created_at")
            .bind(tenant_id).bind(base_id)
            .fetch_all(&self.pool).await?)
    }

    async fn delete_inventories_for_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<u64, StoreError> {
        let done = sqlx::query("DELETE FROM inventories WHERE tenant_id = $1 AND base_id = $2")
            .bind(tenant_id).bind(base_id)
            .execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn find_external_id(&self, integration_id: Uuid, entity: EntityRef, external_type: ExternalType) -> Result<Option<ExternalIdentifier>, StoreError> {
        sqlx::query_as::<_, ExternalIdRow>(&format!(
            "SELECT {EXTERNAL_ID_COLUMNS} FROM external_identifiers WHERE integration_id = $1 AND identifiable_type = $2 AND identifiable_id = $3 AND external_type = $4 LIMIT 1"
        ))
        .bind(integration_id).bind(entity.kind()).bind(entity.id()).bind(external_type)
        .fetch_optional(&self.pool).await?
        .map(ExternalIdentifier::try_from).transpose()
    }

    async fn external_ids_by_kind(&self, integration_id: Uuid, kind: EntityKind, external_type: ExternalType) -> Result<Vec<ExternalIdentifier>, StoreError> {
        sqlx::query_as::<_, ExternalIdRow>(&format!(
            "SELECT {EXTERNAL_ID_COLUMNS} FROM external_identifiers WHERE integration_id = $1 AND identifiable_type = $2 AND external_type = $3 ORDER BY created_at"
        ))
        .bind(integration_id).bind(kind).bind(external_type)
        .fetch_all(&self.pool).await?
        .into_iter().map(ExternalIdentifier::try_from).collect()
    }

    async fn insert_external_id(&self, identifier: &ExternalIdentifier) -> Result<(), StoreError> {
        let result = sqlx::query(&format!("INSERT INTO external_identifiers ({EXTERNAL_ID_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"))
            .bind(identifier.id).bind(identifier.integration_id)
            .bind(identifier.entity.kind()).bind(identifier.entity.id())
            .bind(identifier.external_type).bind(&identifier.external_id).bind(identifier.created_at)
            .execute(&self.pool).await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::DuplicateExternalId(identifier.entity)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_external_id(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM external_identifiers WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn append_log(&self, entry: &IntegrationLog) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO integration_logs (id, integration_id, loggable_type, loggable_id, status, message, metadata, synced_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(entry.id).bind(entry.integration_id)
            .bind(entry.loggable.kind()).bind(entry.loggable.id())
            .bind(entry.status).bind(&entry.message).bind(&entry.metadata).bind(entry.synced_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn query_logs(&self, tenant_id: Uuid, filter: &LogFilter) -> Result<Vec<IntegrationLog>, StoreError> {
        sqlx::query_as::<_, LogRow>(
            "SELECT l.id, l.integration_id, l.loggable_type, l.loggable_id, l.status, l.message, l.metadata, l.synced_at \
             FROM integration_logs l JOIN integrations i ON i.id = l.integration_id \
             WHERE i.tenant_id = $1 \
               AND ($2::text IS NULL OR l.loggable_type = $2) \
               AND ($3::uuid IS NULL OR l.loggable_id = $3) \
               AND ($4::text IS NULL OR l.status = $4) \
             ORDER BY l.synced_at DESC LIMIT $5 OFFSET $6",
        )
        .bind(tenant_id).bind(filter.loggable_type).bind(filter.loggable_id).bind(filter.status)
        .bind(filter.limit).bind(filter.offset)
        .fetch_all(&self.pool).await?
        .into_iter().map(IntegrationLog::try_from).collect()
    }

    async fn record_failed_job(&self, job: &FailedJob) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO failed_jobs (id, payload, error, attempts, failed_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(job.id).bind(&job.payload).bind(&job.error).bind(job.attempts as i32).bind(job.failed_at)
            .execute(&self.pool).await?;
        Ok(())
    }
}
