//! Value Objects for catalog sync

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::CatalogSyncError;

/// Implements text (de)serialization for a closed enum stored in a `TEXT` column.
macro_rules! text_enum {
    ($ty:ident, $err:ident, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self { $(Self::$variant => $tag),+ }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::CatalogSyncError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(Self::$variant),)+
                    other => Err($crate::CatalogSyncError::$err(other.to_string())),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo { <&str as sqlx::Type<sqlx::Postgres>>::type_info() }
            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool { <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty) }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

pub(crate) use text_enum;

/// External commerce platform an integration connects to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformType {
    Shopify,
}

text_enum!(PlatformType, UnknownPlatform, { Shopify => "shopify" });

/// Semantic role of a remote object mapped to a local entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalType {
    ShopifyProduct,
    ShopifyVariant,
}

text_enum!(ExternalType, UnknownExternalType, {
    ShopifyProduct => "shopify_product",
    ShopifyVariant => "shopify_variant",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Error,
    Warning,
}

text_enum!(LogStatus, UnknownLogStatus, {
    Success => "success",
    Error => "error",
    Warning => "warning",
});

/// Kind tag of a local entity referenced from a polymorphic column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Base,
    Colorway,
    Inventory,
    Media,
}

text_enum!(EntityKind, UnknownEntityType, {
    Base => "base",
    Colorway => "colorway",
    Inventory => "inventory",
    Media => "media",
});

/// A local entity addressed by kind and id, as stored in `(entity_type, entity_id)` pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Base(Uuid),
    Colorway(Uuid),
    Inventory(Uuid),
    Media(Uuid),
}

/// Lookup table from stored type tag to constructor.
const ENTITY_TYPES: &[(&str, fn(Uuid) -> EntityRef)] = &[
    ("base", EntityRef::Base),
    ("colorway", EntityRef::Colorway),
    ("inventory", EntityRef::Inventory),
    ("media", EntityRef::Media),
];

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        match kind {
            EntityKind::Base => Self::Base(id),
            EntityKind::Colorway => Self::Colorway(id),
            EntityKind::Inventory => Self::Inventory(id),
            EntityKind::Media => Self::Media(id),
        }
    }

    /// Resolves a stored `(entity_type, entity_id)` pair.
    pub fn from_parts(entity_type: &str, id: Uuid) -> Result<Self, CatalogSyncError> {
        ENTITY_TYPES
            .iter()
            .find(|(tag, _)| *tag == entity_type)
            .map(|(_, build)| build(id))
            .ok_or_else(|| CatalogSyncError::UnknownEntityType(entity_type.to_string()))
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Base(_) => EntityKind::Base,
            Self::Colorway(_) => EntityKind::Colorway,
            Self::Inventory(_) => EntityKind::Inventory,
            Self::Media(_) => EntityKind::Media,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Base(id) | Self::Colorway(id) | Self::Inventory(id) | Self::Media(id) => *id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}", self.kind(), self.id()) }
}

/// Set of field names changed by one save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet<F: Ord>(BTreeSet<F>);

impl<F: Ord> Default for ChangeSet<F> {
    fn default() -> Self { Self(BTreeSet::new()) }
}

impl<F: Ord + Copy> ChangeSet<F> {
    pub fn new() -> Self { Self::default() }
    pub fn record(&mut self, field: F) { self.0.insert(field); }
    pub fn contains(&self, field: F) -> bool { self.0.contains(&field) }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn intersects(&self, fields: &[F]) -> bool { fields.iter().any(|f| self.0.contains(f)) }
    pub fn iter(&self) -> impl Iterator<Item = &F> { self.0.iter() }
    pub fn take(&mut self) -> Self { Self(std::mem::take(&mut self.0)) }
}

impl<F: Ord> FromIterator<F> for ChangeSet<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}
