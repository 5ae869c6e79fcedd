//! Remote catalog adapter
//!
//! [`RemoteCatalog`] is the interface sync jobs consume; [`ShopifyClient`] implements
//! it against the Shopify Admin REST API.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::aggregates::{Base, Colorway, Integration, Media};

pub mod client;
pub mod payload;

pub use client::{ShopifyClient, ShopifyClientFactory, ShopifyCredentials};

#[derive(Error, Debug)]
pub enum ShopifyError {
    #[error("Shopify resource not found: {0}")]
    NotFound(String),

    #[error("Shopify rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Shopify unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Shopify transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid Shopify credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unexpected Shopify response: {0}")]
    UnexpectedResponse(String),
}

impl ShopifyError {
    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }

    /// Failures worth retrying later: throttling, 5xx and network errors.
    /// Everything else is an application error the platform will keep rejecting.
    pub fn is_retryable(&self) -> bool { matches!(self, Self::Unavailable { .. } | Self::Transport(_)) }
}

/// Catalog operations pushed to the remote platform. Ids are remote object ids.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Creates a variant for `base` under the remote product, returning its id.
    async fn create_variant(&self, product_id: &str, base: &Base, quantity: i32) -> Result<String, ShopifyError>;

    async fn update_variant(&self, variant_id: &str, base: &Base) -> Result<(), ShopifyError>;

    /// Deletes a variant. A variant that no longer exists counts as deleted.
    async fn delete_variant(&self, variant_id: &str) -> Result<(), ShopifyError>;

    async fn update_product(&self, colorway: &Colorway, product_id: &str) -> Result<(), ShopifyError>;

    /// Adds, removes and reorders remote images to match `media`.
    async fn sync_images(&self, colorway: &Colorway, media: &[Media], product_id: &str) -> Result<(), ShopifyError>;
}

/// Builds a remote client from an integration's stored credentials.
pub trait ClientFactory: Send + Sync {
    fn connect(&self, integration: &Integration) -> Result<Arc<dyn RemoteCatalog>, ShopifyError>;
}
