//! Test doubles for the queue and the remote platform.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{SyncContext, SyncJob, SyncSettings};
use crate::domain::aggregates::{Base, Colorway, ExternalIdentifier, Integration, IntegrationSettings, Inventory, Media};
use crate::domain::value_objects::{EntityRef, ExternalType, PlatformType};
use crate::queue::{JobQueue, QueueError};
use crate::shopify::{ClientFactory, RemoteCatalog, ShopifyError};
use crate::store::{CatalogStore, MemoryStore};

#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<SyncJob>>,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<SyncJob> { self.jobs.lock().unwrap().clone() }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn push(&self, job: SyncJob) -> Result<(), QueueError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

pub struct FailingQueue;

#[async_trait]
impl JobQueue for FailingQueue {
    async fn push(&self, _job: SyncJob) -> Result<(), QueueError> {
        Err(QueueError::Backend("connection refused".into()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateVariant { product_id: String, base_id: Uuid, quantity: i32 },
    UpdateVariant { variant_id: String, base_id: Uuid },
    DeleteVariant { variant_id: String },
    UpdateProduct { product_id: String, colorway_id: Uuid },
    SyncImages { product_id: String, media: Vec<Uuid> },
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    NotFound,
    Rejected(&'static str),
    Unavailable,
}

impl Failure {
    fn error(self) -> ShopifyError {
        match self {
            Self::NotFound => ShopifyError::NotFound("variant".into()),
            Self::Rejected(message) => ShopifyError::Api { status: 422, message: message.into() },
            Self::Unavailable => ShopifyError::Unavailable { status: 429, message: "Exceeded 2 calls per second".into() },
        }
    }
}

/// Records every call. Failures are keyed by operation name or remote id.
#[derive(Default)]
pub struct FakeRemote {
    calls: Mutex<Vec<Call>>,
    pushed_names: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, Failure>>,
    next_id: AtomicU64,
}

impl FakeRemote {
    pub fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }
    pub fn pushed_names(&self) -> Vec<String> { self.pushed_names.lock().unwrap().clone() }

    pub fn fail(&self, key: &str, failure: Failure) {
        self.failures.lock().unwrap().insert(key.to_string(), failure);
    }

    fn call(&self, op: &str, id: &str, call: Call) -> Result<(), ShopifyError> {
        self.calls.lock().unwrap().push(call);
        let failures = self.failures.lock().unwrap();
        match failures.get(id).or_else(|| failures.get(op)) {
            Some(failure) => Err(failure.error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteCatalog for FakeRemote {
    async fn create_variant(&self, product_id: &str, base: &Base, quantity: i32) -> Result<String, ShopifyError> {
        self.call("create_variant", product_id, Call::CreateVariant { product_id: product_id.into(), base_id: base.id, quantity })?;
        Ok(format!("variant-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn update_variant(&self, variant_id: &str, base: &Base) -> Result<(), ShopifyError> {
        self.call("update_variant", variant_id, Call::UpdateVariant { variant_id: variant_id.into(), base_id: base.id })
    }

    async fn delete_variant(&self, variant_id: &str) -> Result<(), ShopifyError> {
        self.call("delete_variant", variant_id, Call::DeleteVariant { variant_id: variant_id.into() })
    }

    async fn update_product(&self, colorway: &Colorway, product_id: &str) -> Result<(), ShopifyError> {
        self.pushed_names.lock().unwrap().push(colorway.name.clone());
        self.call("update_product", product_id, Call::UpdateProduct { product_id: product_id.into(), colorway_id: colorway.id })
    }

    async fn sync_images(&self, _colorway: &Colorway, media: &[Media], product_id: &str) -> Result<(), ShopifyError> {
        let media = media.iter().map(|m| m.id).collect();
        self.call("sync_images", product_id, Call::SyncImages { product_id: product_id.into(), media })
    }
}

pub struct FakeFactory {
    remote: Arc<FakeRemote>,
    broken: bool,
}

impl ClientFactory for FakeFactory {
    fn connect(&self, _integration: &Integration) -> Result<Arc<dyn RemoteCatalog>, ShopifyError> {
        if self.broken {
            return Err(ShopifyError::InvalidCredentials("missing access_token".into()));
        }
        Ok(self.remote.clone())
    }
}

/// A tenant with one Shopify integration wired to a [`FakeRemote`].
pub struct Harness {
    pub tenant_id: Uuid,
    pub integration: Integration,
    pub store: Arc<MemoryStore>,
    pub remote: Arc<FakeRemote>,
    pub ctx: SyncContext,
    next_remote_id: AtomicU64,
}

impl Harness {
    pub async fn new() -> Self { Self::build(SyncSettings::default(), true, false).await }

    pub async fn with_broken_client() -> Self { Self::build(SyncSettings::default(), true, true).await }

    pub async fn without_integration() -> Self {
        let mut harness = Self::build(SyncSettings::default(), true, false).await;
        // Fresh tenant: the integration belongs to someone else.
        harness.tenant_id = Uuid::now_v7();
        harness
    }

    pub async fn build(settings: SyncSettings, integration_enabled: bool, broken_client: bool) -> Self {
        let tenant_id = Uuid::now_v7();
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::default());
        let integration = Integration::new(
            tenant_id,
            PlatformType::Shopify,
            serde_json::json!({ "shop_domain": "fiberworks.myshopify.com", "access_token": "shpat_test" }),
            IntegrationSettings { catalog_sync_enabled: integration_enabled, ..Default::default() },
        );
        store.put_integration(integration.clone()).await;
        let factory = Arc::new(FakeFactory { remote: remote.clone(), broken: broken_client });
        let ctx = SyncContext::new(store.clone(), factory, settings);
        Self { tenant_id, integration, store, remote, ctx, next_remote_id: AtomicU64::new(1000) }
    }

    fn remote_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_remote_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Stores the colorway and maps it to a new remote product id.
    pub async fn link_colorway(&self, colorway: Colorway) -> String {
        let product_id = self.remote_id("product");
        let mapping = ExternalIdentifier::new(self.integration.id, EntityRef::Colorway(colorway.id), ExternalType::ShopifyProduct, product_id.clone());
        self.store.put_colorway(colorway).await;
        self.store.insert_external_id(&mapping).await.unwrap();
        product_id
    }

    /// Stores an inventory row mapped to a new remote variant id.
    pub async fn link_inventory(&self, colorway_id: Uuid, base_id: Uuid) -> (Inventory, String) {
        let inventory = Inventory::empty(self.tenant_id, colorway_id, base_id);
        let variant_id = self.remote_id("variant");
        let mapping = ExternalIdentifier::new(self.integration.id, EntityRef::Inventory(inventory.id), ExternalType::ShopifyVariant, variant_id.clone());
        self.store.put_inventory(inventory.clone()).await;
        self.store.insert_external_id(&mapping).await.unwrap();
        (inventory, variant_id)
    }
}
