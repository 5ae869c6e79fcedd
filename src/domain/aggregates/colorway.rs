//! Colorway Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::assign;
use crate::domain::events::{CatalogEvent, ColorwayEvent};
use crate::domain::value_objects::{text_enum, ChangeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorwayField {
    Name,
    Description,
    Status,
    Technique,
    Colors,
    PerPan,
    Recipe,
    Notes,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorwayStatus {
    #[default]
    Idea,
    Active,
    Retired,
}

text_enum!(ColorwayStatus, UnknownColorwayStatus, {
    Idea => "idea",
    Active => "active",
    Retired => "retired",
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    #[default]
    Solid,
    Tonal,
    Variegated,
    Speckled,
    Gradient,
}

text_enum!(Technique, UnknownTechnique, {
    Solid => "solid",
    Tonal => "tonal",
    Variegated => "variegated",
    Speckled => "speckled",
    Gradient => "gradient",
});

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Colorway {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ColorwayStatus,
    pub technique: Technique,
    pub colors: Vec<String>,
    pub per_pan: i32,
    pub recipe: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip)]
    changes: ChangeSet<ColorwayField>,
}

impl Colorway {
    pub fn create(tenant_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), tenant_id, name: name.into(), description: None,
            status: ColorwayStatus::default(), technique: Technique::default(), colors: vec![],
            per_pan: 1, recipe: None, notes: None, created_at: now, updated_at: now, changes: ChangeSet::new(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) { assign(&mut self.name, name.into(), &mut self.changes, ColorwayField::Name); }
    pub fn set_description(&mut self, description: Option<String>) { assign(&mut self.description, description, &mut self.changes, ColorwayField::Description); }
    pub fn set_status(&mut self, status: ColorwayStatus) { assign(&mut self.status, status, &mut self.changes, ColorwayField::Status); }
    pub fn set_technique(&mut self, technique: Technique) { assign(&mut self.technique, technique, &mut self.changes, ColorwayField::Technique); }
    pub fn set_colors(&mut self, colors: Vec<String>) { assign(&mut self.colors, colors, &mut self.changes, ColorwayField::Colors); }
    pub fn set_per_pan(&mut self, per_pan: i32) { assign(&mut self.per_pan, per_pan, &mut self.changes, ColorwayField::PerPan); }
    pub fn set_recipe(&mut self, recipe: Option<String>) { assign(&mut self.recipe, recipe, &mut self.changes, ColorwayField::Recipe); }
    pub fn set_notes(&mut self, notes: Option<String>) { assign(&mut self.notes, notes, &mut self.changes, ColorwayField::Notes); }

    pub fn changes(&self) -> &ChangeSet<ColorwayField> { &self.changes }

    pub fn created_event(&self) -> CatalogEvent {
        CatalogEvent::Colorway(ColorwayEvent::Created { tenant_id: self.tenant_id, colorway_id: self.id })
    }

    pub fn take_update_event(&mut self) -> Option<CatalogEvent> {
        if self.changes.is_empty() { return None; }
        self.updated_at = Utc::now();
        Some(CatalogEvent::Colorway(ColorwayEvent::Updated { tenant_id: self.tenant_id, colorway_id: self.id, changed: self.changes.take() }))
    }

    pub fn deleted_event(&self) -> CatalogEvent {
        CatalogEvent::Colorway(ColorwayEvent::Deleted { tenant_id: self.tenant_id, colorway_id: self.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorway_changes() {
        let mut colorway = Colorway::create(Uuid::now_v7(), "Tidepool");
        colorway.set_notes(Some("double dip".into()));
        colorway.set_colors(vec!["teal".into(), "sand".into()]);
        let Some(CatalogEvent::Colorway(ColorwayEvent::Updated { changed, .. })) = colorway.take_update_event() else { panic!("expected update") };
        assert_eq!(changed.len(), 2);
        assert!(changed.contains(ColorwayField::Colors));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("retired".parse::<ColorwayStatus>().unwrap(), ColorwayStatus::Retired);
        assert_eq!(Technique::Speckled.as_str(), "speckled");
    }
}
