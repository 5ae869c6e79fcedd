//! In-memory [`CatalogStore`]

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CatalogStore, FailedJob, LogFilter, StoreError};
use crate::domain::aggregates::{Base, Colorway, ExternalIdentifier, Integration, IntegrationLog, Inventory, Media};
use crate::domain::value_objects::{EntityKind, EntityRef, ExternalType, PlatformType};

#[derive(Default)]
struct State {
    integrations: Vec<Integration>,
    bases: Vec<Base>,
    colorways: Vec<Colorway>,
    media: Vec<Media>,
    inventories: Vec<Inventory>,
    external_ids: Vec<ExternalIdentifier>,
    logs: Vec<IntegrationLog>,
    failed_jobs: Vec<FailedJob>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn put_integration(&self, integration: Integration) { self.state.lock().await.integrations.push(integration); }

    pub async fn put_base(&self, base: Base) {
        let mut state = self.state.lock().await;
        state.bases.retain(|b| b.id != base.id);
        state.bases.push(base);
    }

    pub async fn remove_base(&self, base_id: Uuid) { self.state.lock().await.bases.retain(|b| b.id != base_id); }

    pub async fn put_colorway(&self, colorway: Colorway) {
        let mut state = self.state.lock().await;
        state.colorways.retain(|c| c.id != colorway.id);
        state.colorways.push(colorway);
    }

    pub async fn put_media(&self, media: Media) {
        let mut state = self.state.lock().await;
        state.media.retain(|m| m.id != media.id);
        state.media.push(media);
    }

    pub async fn put_inventory(&self, inventory: Inventory) { self.state.lock().await.inventories.push(inventory); }

    pub async fn inventories(&self) -> Vec<Inventory> { self.state.lock().await.inventories.clone() }
    pub async fn external_ids(&self) -> Vec<ExternalIdentifier> { self.state.lock().await.external_ids.clone() }
    pub async fn logs(&self) -> Vec<IntegrationLog> { self.state.lock().await.logs.clone() }
    pub async fn failed_jobs(&self) -> Vec<FailedJob> { self.state.lock().await.failed_jobs.clone() }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn active_integration(&self, tenant_id: Uuid, platform: PlatformType) -> Result<Option<Integration>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.integrations.iter().find(|i| i.tenant_id == tenant_id && i.platform == platform && i.active).cloned())
    }

    async fn find_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<Option<Base>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.bases.iter().find(|b| b.tenant_id == tenant_id && b.id == base_id).cloned())
    }

    async fn find_colorway(&self, tenant_id: Uuid, colorway_id: Uuid) -> Result<Option<Colorway>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.colorways.iter().find(|c| c.tenant_id == tenant_id && c.id == colorway_id).cloned())
    }

    async fn colorway_media(&self, colorway_id: Uuid) -> Result<Vec<Media>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.media.iter().filter(|m| m.owner == EntityRef::Colorway(colorway_id)).cloned().collect())
    }

    async fn first_or_create_inventory(&self, tenant_id: Uuid, colorway_id: Uuid, base_id: Uuid) -> Result<Inventory, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.inventories.iter().find(|i| i.is_for(tenant_id, colorway_id, base_id)) {
            return Ok(existing.clone());
        }
        let inventory = Inventory::empty(tenant_id, colorway_id, base_id);
        state.inventories.push(inventory.clone());
        Ok(inventory)
    }

    async fn inventories_for_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<Vec<Inventory>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.inventories.iter().filter(|i| i.tenant_id == tenant_id && i.base_id == base_id).cloned().collect())
    }

    async fn delete_inventories_for_base(&self, tenant_id: Uuid, base_id: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.inventories.len();
        state.inventories.retain(|i| !(i.tenant_id == tenant_id && i.base_id == base_id));
        Ok((before - state.inventories.len()) as u64)
    }

    async fn find_external_id(&self, integration_id: Uuid, entity: EntityRef, external_type: ExternalType) -> Result<Option<ExternalIdentifier>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .external_ids
            .iter()
            .find(|x| x.integration_id == integration_id && x.entity == entity && x.external_type == external_type)
            .cloned())
    }

    async fn external_ids_by_kind(&self, integration_id: Uuid, kind: EntityKind, external_type: ExternalType) -> Result<Vec<ExternalIdentifier>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .external_ids
            .iter()
            .filter(|x| x.integration_id == integration_id && x.entity.kind() == kind && x.external_type == external_type)
            .cloned()
            .collect())
    }

    async fn insert_external_id(&self, identifier: &ExternalIdentifier) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let duplicate = state.external_ids.iter().any(|x| {
            x.integration_id == identifier.integration_id && x.entity == identifier.entity && x.external_type == identifier.external_type
        });
        if duplicate {
            return Err(StoreError::DuplicateExternalId(identifier.entity));
        }
        state.external_ids.push(identifier.clone());
        Ok(())
    }

    async fn delete_external_id(&self, id: Uuid) -> Result<(), StoreError> {
        self.state.lock().await.external_ids.retain(|x| x.id != id);
        Ok(())
    }

    async fn append_log(&self, entry: &IntegrationLog) -> Result<(), StoreError> {
        self.state.lock().await.logs.push(entry.clone());
        Ok(())
    }

    async fn query_logs(&self, tenant_id: Uuid, filter: &LogFilter) -> Result<Vec<IntegrationLog>, StoreError> {
        let state = self.state.lock().await;
        let owned: Vec<Uuid> = state.integrations.iter().filter(|i| i.tenant_id == tenant_id).map(|i| i.id).collect();
        let mut entries: Vec<IntegrationLog> = state
            .logs
            .iter()
            .filter(|l| owned.contains(&l.integration_id) && filter.matches(l))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.synced_at.cmp(&a.synced_at));
        Ok(entries.into_iter().skip(filter.offset.max(0) as usize).take(filter.limit.max(0) as usize).collect())
    }

    async fn record_failed_job(&self, job: &FailedJob) -> Result<(), StoreError> {
        self.state.lock().await.failed_jobs.push(job.clone());
        Ok(())
    }
}
