//! Catalog Sync Dispatcher
//!
//! Pushes catalog changes made by fiber-craft creators to their connected
//! Shopify store.
//!
//! ## Pipeline
//! - Change detection against per-entity watch-lists
//! - Dispatch gate turning lifecycle events into queued sync jobs
//! - Sync jobs for base, colorway and media changes
//! - Shopify Admin REST adapter
//! - Append-only integration log

use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod queue;
pub mod shopify;
pub mod store;
pub mod sync;
pub mod worker;

pub use domain::aggregates::{Base, Colorway, Integration, Inventory, Media};
pub use domain::events::CatalogEvent;
pub use domain::value_objects::{EntityRef, ExternalType, LogStatus, PlatformType};
pub use sync::{DispatchGate, SyncContext, SyncJob, SyncSettings};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogSyncError {
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Unknown external type: {0}")]
    UnknownExternalType(String),

    #[error("Unknown log status: {0}")]
    UnknownLogStatus(String),

    #[error("Unknown colorway status: {0}")]
    UnknownColorwayStatus(String),

    #[error("Unknown technique: {0}")]
    UnknownTechnique(String),
}

pub type Result<T> = std::result::Result<T, CatalogSyncError>;
