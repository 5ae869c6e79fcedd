//! Colorway media changed: reconcile the remote product's images.

use uuid::Uuid;

use super::{JobError, JobOutcome, SkipReason, SyncContext};
use crate::domain::aggregates::media::display_order;
use crate::domain::value_objects::{EntityRef, ExternalType};

const OPERATION: &str = "colorway_images";

pub(super) async fn run(ctx: &SyncContext, tenant_id: Uuid, colorway_id: Uuid) -> Result<JobOutcome, JobError> {
    let conn = match ctx.connect(tenant_id).await? {
        Ok(conn) => conn,
        Err(reason) => return Ok(JobOutcome::Skipped(reason)),
    };
    let store = ctx.store();
    let loggable = EntityRef::Colorway(colorway_id);
    let Some(product) = store.find_external_id(conn.integration.id, loggable, ExternalType::ShopifyProduct).await? else {
        return Ok(JobOutcome::Skipped(SkipReason::NotLinked));
    };
    let Some(colorway) = store.find_colorway(tenant_id, colorway_id).await? else {
        return Ok(JobOutcome::Skipped(SkipReason::EntityMissing));
    };
    let mut media = store.colorway_media(colorway_id).await?;
    display_order(&mut media);

    match conn.client.sync_images(&colorway, &media, &product.external_id).await {
        Ok(()) => {
            ctx.record_success(
                &conn,
                loggable,
                OPERATION,
                format!("Images for {} synced to Shopify", colorway.name),
                serde_json::json!({ "product_id": product.external_id, "images": media.len() }),
            )
            .await?;
            Ok(JobOutcome::Synced { count: media.len() })
        }
        Err(e) => ctx.settle_failure(&conn, loggable, OPERATION, "Image sync failed", e.into()).await,
    }
}
