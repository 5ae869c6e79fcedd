//! Inventory Aggregate
//!
//! Stock of one colorway dyed on one base. Each row maps to one remote variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Inventory {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub colorway_id: Uuid,
    pub base_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// New row with zero stock.
    pub fn empty(tenant_id: Uuid, colorway_id: Uuid, base_id: Uuid) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), tenant_id, colorway_id, base_id, quantity: 0, created_at: now, updated_at: now }
    }

    pub fn is_for(&self, tenant_id: Uuid, colorway_id: Uuid, base_id: Uuid) -> bool {
        self.tenant_id == tenant_id && self.colorway_id == colorway_id && self.base_id == base_id
    }
}
