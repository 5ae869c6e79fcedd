//! Catalog sync pipeline
//!
//! Catalog mutation -> [`change_detector`] -> [`DispatchGate`] -> queued [`SyncJob`]
//! -> [`SyncContext::run`] -> remote call -> integration log entry.

pub mod change_detector;
pub mod dispatch;
pub mod jobs;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::{Dispatch, DispatchGate};
pub use jobs::{JobError, JobOutcome, SkipReason, SyncContext, SyncJob};

use crate::domain::value_objects::PlatformType;

/// Process-wide pipeline settings, passed explicitly to the gate and to jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub catalog_sync_enabled: bool,
    pub platform: PlatformType,
}

impl SyncSettings {
    pub fn new(catalog_sync_enabled: bool) -> Self {
        Self { catalog_sync_enabled, platform: PlatformType::Shopify }
    }
}

impl Default for SyncSettings {
    fn default() -> Self { Self::new(true) }
}
