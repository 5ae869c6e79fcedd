//! Catalog lifecycle events
//!
//! Raised after a create, update or delete has been persisted. Updates carry the
//! set of fields changed by that save.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::{BaseField, ColorwayField, MediaField};
use crate::domain::value_objects::{ChangeSet, EntityRef};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum CatalogEvent {
    Base(BaseEvent),
    Colorway(ColorwayEvent),
    Media(MediaEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BaseEvent {
    Created { tenant_id: Uuid, base_id: Uuid },
    Updated { tenant_id: Uuid, base_id: Uuid, changed: ChangeSet<BaseField> },
    Deleted { tenant_id: Uuid, base_id: Uuid },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ColorwayEvent {
    Created { tenant_id: Uuid, colorway_id: Uuid },
    Updated { tenant_id: Uuid, colorway_id: Uuid, changed: ChangeSet<ColorwayField> },
    Deleted { tenant_id: Uuid, colorway_id: Uuid },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MediaEvent {
    Created { tenant_id: Uuid, media_id: Uuid, owner: EntityRef },
    Updated { tenant_id: Uuid, media_id: Uuid, owner: EntityRef, changed: ChangeSet<MediaField> },
    Deleted { tenant_id: Uuid, media_id: Uuid, owner: EntityRef },
}

impl CatalogEvent {
    pub fn tenant_id(&self) -> Uuid {
        match self {
            Self::Base(BaseEvent::Created { tenant_id, .. } | BaseEvent::Updated { tenant_id, .. } | BaseEvent::Deleted { tenant_id, .. })
            | Self::Colorway(ColorwayEvent::Created { tenant_id, .. } | ColorwayEvent::Updated { tenant_id, .. } | ColorwayEvent::Deleted { tenant_id, .. })
            | Self::Media(MediaEvent::Created { tenant_id, .. } | MediaEvent::Updated { tenant_id, .. } | MediaEvent::Deleted { tenant_id, .. }) => *tenant_id,
        }
    }

    /// The entity the event is about.
    pub fn subject(&self) -> EntityRef {
        match self {
            Self::Base(BaseEvent::Created { base_id, .. } | BaseEvent::Updated { base_id, .. } | BaseEvent::Deleted { base_id, .. }) => EntityRef::Base(*base_id),
            Self::Colorway(ColorwayEvent::Created { colorway_id, .. } | ColorwayEvent::Updated { colorway_id, .. } | ColorwayEvent::Deleted { colorway_id, .. }) => EntityRef::Colorway(*colorway_id),
            Self::Media(MediaEvent::Created { media_id, .. } | MediaEvent::Updated { media_id, .. } | MediaEvent::Deleted { media_id, .. }) => EntityRef::Media(*media_id),
        }
    }

    /// `created`, `updated` or `deleted`.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Base(BaseEvent::Created { .. }) | Self::Colorway(ColorwayEvent::Created { .. }) | Self::Media(MediaEvent::Created { .. }) => "created",
            Self::Base(BaseEvent::Updated { .. }) | Self::Colorway(ColorwayEvent::Updated { .. }) | Self::Media(MediaEvent::Updated { .. }) => "updated",
            Self::Base(BaseEvent::Deleted { .. }) | Self::Colorway(ColorwayEvent::Deleted { .. }) | Self::Media(MediaEvent::Deleted { .. }) => "deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let tenant_id = Uuid::now_v7();
        let base_id = Uuid::now_v7();
        let json = serde_json::json!({
            "entity": "base",
            "event": "updated",
            "tenant_id": tenant_id,
            "base_id": base_id,
            "changed": ["retail_price", "updated_at"],
        });
        let event: CatalogEvent = serde_json::from_value(json).unwrap();
        let CatalogEvent::Base(BaseEvent::Updated { changed, .. }) = &event else { panic!("expected base update") };
        assert!(changed.contains(BaseField::RetailPrice));
        assert!(changed.contains(BaseField::Other));
        assert_eq!(event.tenant_id(), tenant_id);
        assert_eq!(event.subject(), EntityRef::Base(base_id));
        assert_eq!(event.action(), "updated");
    }

    #[test]
    fn test_media_event_owner() {
        let colorway_id = Uuid::now_v7();
        let json = serde_json::json!({
            "entity": "media",
            "event": "deleted",
            "tenant_id": Uuid::now_v7(),
            "media_id": Uuid::now_v7(),
            "owner": {"type": "colorway", "id": colorway_id},
        });
        let event: CatalogEvent = serde_json::from_value(json).unwrap();
        assert!(matches!(event, CatalogEvent::Media(MediaEvent::Deleted { owner: EntityRef::Colorway(id), .. }) if id == colorway_id));
    }
}
