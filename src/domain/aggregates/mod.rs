//! Aggregates module
pub mod base;
pub mod colorway;
pub mod integration;
pub mod inventory;
pub mod media;

pub use base::{Base, BaseField};
pub use colorway::{Colorway, ColorwayField, ColorwayStatus, Technique};
pub use integration::{ExternalIdentifier, Integration, IntegrationLog, IntegrationSettings};
pub use inventory::Inventory;
pub use media::{Media, MediaField};

use crate::domain::value_objects::ChangeSet;

/// Assigns `value` and records `field` when it differs from the current value.
fn assign<T: PartialEq, F: Ord + Copy>(slot: &mut T, value: T, changes: &mut ChangeSet<F>, field: F) {
    if *slot != value {
        *slot = value;
        changes.record(field);
    }
}
