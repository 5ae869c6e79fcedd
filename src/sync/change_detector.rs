//! Decides whether a save touched sync-relevant fields.

use crate::domain::aggregates::{Base, BaseField, Colorway, ColorwayField, Media, MediaField};
use crate::domain::value_objects::ChangeSet;

/// An entity type with a fixed watch-list of sync-relevant fields.
pub trait Watched {
    type Field: Ord + Copy + 'static;
    const WATCHED: &'static [Self::Field];
}

impl Watched for Base {
    type Field = BaseField;
    const WATCHED: &'static [BaseField] = &[BaseField::Descriptor, BaseField::RetailPrice];
}

/// The colorway catalog field set pushed to the remote product.
impl Watched for Colorway {
    type Field = ColorwayField;
    const WATCHED: &'static [ColorwayField] = &[
        ColorwayField::Name,
        ColorwayField::Description,
        ColorwayField::Status,
        ColorwayField::Technique,
        ColorwayField::Colors,
    ];
}

impl Watched for Media {
    type Field = MediaField;
    const WATCHED: &'static [MediaField] = &[MediaField::FilePath, MediaField::IsPrimary];
}

/// True iff at least one changed field is on `E`'s watch-list.
pub fn is_sync_relevant<E: Watched>(changed: &ChangeSet<E::Field>) -> bool {
    changed.intersects(E::WATCHED)
}
