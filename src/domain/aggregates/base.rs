//! Base Aggregate
//!
//! A yarn base (fiber, weight, yardage) sold in every colorway. On the remote
//! platform each base becomes one variant of every colorway product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assign;
use crate::domain::events::{BaseEvent, CatalogEvent};
use crate::domain::value_objects::ChangeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseField {
    Descriptor,
    Code,
    Weight,
    FiberContent,
    Yardage,
    RetailPrice,
    WholesalePrice,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Base {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub descriptor: String,
    pub code: Option<String>,
    pub weight: Option<String>,
    pub fiber_content: Option<String>,
    pub yardage: Option<i32>,
    pub retail_price: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip)]
    changes: ChangeSet<BaseField>,
}

impl Base {
    pub fn create(tenant_id: Uuid, descriptor: impl Into<String>, retail_price: Option<Decimal>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), tenant_id, descriptor: descriptor.into(), code: None, weight: None,
            fiber_content: None, yardage: None, retail_price, wholesale_price: None,
            created_at: now, updated_at: now, changes: ChangeSet::new(),
        }
    }

    pub fn set_descriptor(&mut self, descriptor: impl Into<String>) { assign(&mut self.descriptor, descriptor.into(), &mut self.changes, BaseField::Descriptor); }
    pub fn set_code(&mut self, code: Option<String>) { assign(&mut self.code, code, &mut self.changes, BaseField::Code); }
    pub fn set_weight(&mut self, weight: Option<String>) { assign(&mut self.weight, weight, &mut self.changes, BaseField::Weight); }
    pub fn set_fiber_content(&mut self, fiber: Option<String>) { assign(&mut self.fiber_content, fiber, &mut self.changes, BaseField::FiberContent); }
    pub fn set_yardage(&mut self, yardage: Option<i32>) { assign(&mut self.yardage, yardage, &mut self.changes, BaseField::Yardage); }
    pub fn set_retail_price(&mut self, price: Option<Decimal>) { assign(&mut self.retail_price, price, &mut self.changes, BaseField::RetailPrice); }
    pub fn set_wholesale_price(&mut self, price: Option<Decimal>) { assign(&mut self.wholesale_price, price, &mut self.changes, BaseField::WholesalePrice); }

    pub fn changes(&self) -> &ChangeSet<BaseField> { &self.changes }

    /// Variant title shown on the remote product, e.g. `"Merino DK (100g)"`.
    pub fn variant_title(&self) -> String {
        match self.weight.as_deref().filter(|w| !w.is_empty()) {
            Some(weight) => format!("{} ({})", self.descriptor, weight),
            None => self.descriptor.clone(),
        }
    }

    pub fn created_event(&self) -> CatalogEvent {
        CatalogEvent::Base(BaseEvent::Created { tenant_id: self.tenant_id, base_id: self.id })
    }

    /// Drains pending field changes into an update event. `None` when nothing changed.
    pub fn take_update_event(&mut self) -> Option<CatalogEvent> {
        if self.changes.is_empty() { return None; }
        self.updated_at = Utc::now();
        Some(CatalogEvent::Base(BaseEvent::Updated { tenant_id: self.tenant_id, base_id: self.id, changed: self.changes.take() }))
    }

    pub fn deleted_event(&self) -> CatalogEvent {
        CatalogEvent::Base(BaseEvent::Deleted { tenant_id: self.tenant_id, base_id: self.id })
    }
}
