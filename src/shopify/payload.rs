//! Shopify Admin REST request and response bodies

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::aggregates::media::display_order;
use crate::domain::aggregates::{Base, Colorway, ColorwayStatus, Media};

/// Prefix of the `alt` text that ties a remote image to a local media row.
pub const MEDIA_ALT_PREFIX: &str = "media:";

#[derive(Debug, Serialize)]
pub struct VariantInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub option1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_management: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<i32>,
}

impl VariantInput {
    pub fn for_base(base: &Base) -> Self {
        Self {
            id: None,
            option1: base.variant_title(),
            price: base.retail_price.map(|p| p.round_dp(2).to_string()),
            sku: base.code.clone(),
            inventory_management: None,
            inventory_quantity: None,
        }
    }

    pub fn new_variant(base: &Base, quantity: i32) -> Self {
        Self { inventory_management: Some("shopify"), inventory_quantity: Some(quantity), ..Self::for_base(base) }
    }
}

#[derive(Debug, Serialize)]
pub struct VariantEnvelope {
    pub variant: VariantInput,
}

#[derive(Debug, Deserialize)]
pub struct RemoteVariant {
    pub id: i64,
    pub product_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoteVariantEnvelope {
    pub variant: RemoteVariant,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ProductUpdate {
    pub id: i64,
    pub title: String,
    pub body_html: String,
    pub status: &'static str,
    pub product_type: &'static str,
    pub tags: String,
}

impl ProductUpdate {
    pub fn from_colorway(id: i64, colorway: &Colorway) -> Self {
        let status = match colorway.status {
            ColorwayStatus::Active => "active",
            ColorwayStatus::Idea => "draft",
            ColorwayStatus::Retired => "archived",
        };
        let mut tags: Vec<&str> = colorway.colors.iter().map(String::as_str).collect();
        tags.push(colorway.technique.as_str());
        Self {
            id,
            title: colorway.name.clone(),
            body_html: colorway.description.clone().unwrap_or_default(),
            status,
            product_type: "Yarn",
            tags: tags.join(", "),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductEnvelope {
    pub product: ProductUpdate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteImage {
    pub id: i64,
    pub position: i32,
    #[serde(default)]
    pub alt: Option<String>,
}

impl RemoteImage {
    /// Local media id encoded in the alt text, if this image was uploaded by us.
    pub fn media_id(&self) -> Option<Uuid> {
        self.alt.as_deref()?.strip_prefix(MEDIA_ALT_PREFIX)?.parse().ok()
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoteImageList {
    pub images: Vec<RemoteImage>,
}

#[derive(Debug, Serialize)]
pub struct ImageInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    pub position: i32,
}

#[derive(Debug, Serialize)]
pub struct ImageEnvelope {
    pub image: ImageInput,
}

/// Image to upload for a local media row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub media_id: Uuid,
    pub file_path: String,
    pub position: i32,
}

/// Steps that bring the remote image set in line with local media.
#[derive(Debug, Default, PartialEq)]
pub struct ImagePlan {
    pub remove: Vec<i64>,
    pub add: Vec<ImageUpload>,
    pub reposition: Vec<(i64, i32)>,
}

impl ImagePlan {
    pub fn is_empty(&self) -> bool { self.remove.is_empty() && self.add.is_empty() && self.reposition.is_empty() }
}

/// Plans image reconciliation. Remote images without a media tag, tagged with
/// media that no longer exists, or repeating an earlier image's tag are removed. Positions are 1-based in display order.
pub fn plan_images(remote: &[RemoteImage], media: &[Media]) -> ImagePlan {
    let mut ordered = media.to_vec();
    display_order(&mut ordered);

    let mut plan = ImagePlan::default();
    let mut seen = HashSet::new();
    for image in remote {
        // Only the first image per media row is kept; later copies are duplicates.
        let keep = image.media_id().is_some_and(|id| ordered.iter().any(|m| m.id == id) && seen.insert(id));
        if !keep {
            plan.remove.push(image.id);
        }
    }

    for (index, item) in ordered.iter().enumerate() {
        let position = index as i32 + 1;
        match remote.iter().find(|image| image.media_id() == Some(item.id)) {
            Some(image) if image.position != position => plan.reposition.push((image.id, position)),
            Some(_) => {}
            None => plan.add.push(ImageUpload { media_id: item.id, file_path: item.file_path.clone(), position }),
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Technique;
    use crate::domain::value_objects::EntityRef;
    use rust_decimal::Decimal;

    fn tagged(id: i64, position: i32, media: &Media) -> RemoteImage {
        RemoteImage { id, position, alt: Some(format!("{MEDIA_ALT_PREFIX}{}", media.id)) }
    }

    #[test]
    fn test_product_update_mapping() {
        let mut colorway = Colorway::create(Uuid::now_v7(), "Tidepool");
        colorway.set_status(ColorwayStatus::Retired);
        colorway.set_technique(Technique::Speckled);
        colorway.set_colors(vec!["teal".into(), "sand".into()]);
        let update = ProductUpdate::from_colorway(42, &colorway);
        assert_eq!(update.status, "archived");
        assert_eq!(update.tags, "teal, sand, speckled");
        assert_eq!(update.body_html, "");
    }

    #[test]
    fn test_variant_input_price() {
        let mut base = Base::create(Uuid::now_v7(), "Merino DK", Some(Decimal::new(28005, 3)));
        base.set_code(Some("MDK".into()));
        let input = VariantInput::new_variant(&base, 0);
        assert_eq!(input.price.as_deref(), Some("28.00"));
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["inventory_quantity"], 0);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_plan_images() {
        let tenant = Uuid::now_v7();
        let owner = EntityRef::Colorway(Uuid::now_v7());
        let mut front = Media::create(tenant, owner, "front.jpg");
        front.set_primary(true);
        let mut back = Media::create(tenant, owner, "back.jpg");
        back.set_sort_order(1);
        let fresh = Media::create(tenant, owner, "detail.jpg");

        let stale = Media::create(tenant, owner, "gone.jpg");
        let remote = vec![
            tagged(10, 1, &back),
            tagged(11, 2, &front),
            tagged(12, 3, &stale),
            RemoteImage { id: 13, position: 4, alt: None },
        ];

        let plan = plan_images(&remote, &[back.clone(), fresh.clone(), front.clone()]);
        assert_eq!(plan.remove, vec![12, 13]);
        assert_eq!(plan.reposition, vec![(11, 1), (10, 3)]);
        assert_eq!(plan.add, vec![ImageUpload { media_id: fresh.id, file_path: "detail.jpg".into(), position: 2 }]);
    }

    #[test]
    fn test_plan_images_drops_duplicate_uploads() {
        let tenant = Uuid::now_v7();
        let owner = EntityRef::Colorway(Uuid::now_v7());
        let only = Media::create(tenant, owner, "front.jpg");
        let plan = plan_images(&[tagged(1, 1, &only), tagged(2, 2, &only)], &[only.clone()]);
        assert_eq!(plan.remove, vec![2]);
        assert!(plan.add.is_empty());
        assert!(plan.reposition.is_empty());
    }

    #[test]
    fn test_plan_images_in_sync() {
        let tenant = Uuid::now_v7();
        let owner = EntityRef::Colorway(Uuid::now_v7());
        let only = Media::create(tenant, owner, "front.jpg");
        assert!(plan_images(&[tagged(1, 1, &only)], &[only]).is_empty());
    }
}
