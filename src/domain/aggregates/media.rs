//! Media attached to a catalog entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assign;
use crate::domain::events::{CatalogEvent, MediaEvent};
use crate::domain::value_objects::{ChangeSet, EntityRef};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaField {
    FilePath,
    FileName,
    IsPrimary,
    SortOrder,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Owning entity (colorway, base, ...).
    pub owner: EntityRef,
    pub file_path: String,
    pub file_name: String,
    pub is_primary: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    changes: ChangeSet<MediaField>,
}

impl Media {
    pub fn create(tenant_id: Uuid, owner: EntityRef, file_path: impl Into<String>) -> Self {
        let file_path = file_path.into();
        let file_name = file_path.rsplit('/').next().unwrap_or_default().to_string();
        Self { id: Uuid::now_v7(), tenant_id, owner, file_path, file_name, is_primary: false, sort_order: 0, created_at: Utc::now(), changes: ChangeSet::new() }
    }

    pub fn set_file_path(&mut self, path: impl Into<String>) { assign(&mut self.file_path, path.into(), &mut self.changes, MediaField::FilePath); }
    pub fn set_file_name(&mut self, name: impl Into<String>) { assign(&mut self.file_name, name.into(), &mut self.changes, MediaField::FileName); }
    pub fn set_primary(&mut self, primary: bool) { assign(&mut self.is_primary, primary, &mut self.changes, MediaField::IsPrimary); }
    pub fn set_sort_order(&mut self, order: i32) { assign(&mut self.sort_order, order, &mut self.changes, MediaField::SortOrder); }

    pub fn changes(&self) -> &ChangeSet<MediaField> { &self.changes }

    /// Colorway owning this media, if any.
    pub fn colorway_id(&self) -> Option<Uuid> {
        match self.owner { EntityRef::Colorway(id) => Some(id), _ => None }
    }

    pub fn created_event(&self) -> CatalogEvent {
        CatalogEvent::Media(MediaEvent::Created { tenant_id: self.tenant_id, media_id: self.id, owner: self.owner })
    }

    pub fn take_update_event(&mut self) -> Option<CatalogEvent> {
        if self.changes.is_empty() { return None; }
        Some(CatalogEvent::Media(MediaEvent::Updated { tenant_id: self.tenant_id, media_id: self.id, owner: self.owner, changed: self.changes.take() }))
    }

    pub fn deleted_event(&self) -> CatalogEvent {
        CatalogEvent::Media(MediaEvent::Deleted { tenant_id: self.tenant_id, media_id: self.id, owner: self.owner })
    }
}

/// Orders media the way the storefront shows it: primary first, then by sort order.
pub fn display_order(media: &mut [Media]) {
    media.sort_by_key(|m| (!m.is_primary, m.sort_order, m.created_at));
}
