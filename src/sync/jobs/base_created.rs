//! New base: add it as a variant to every colorway already listed remotely.

use uuid::Uuid;

use super::{Connection, JobError, JobOutcome, SkipReason, SyncContext};
use crate::domain::aggregates::{Base, ExternalIdentifier};
use crate::domain::value_objects::{EntityKind, EntityRef, ExternalType};

const OPERATION: &str = "base_created";

pub(super) async fn run(ctx: &SyncContext, tenant_id: Uuid, base_id: Uuid) -> Result<JobOutcome, JobError> {
    let conn = match ctx.connect(tenant_id).await? {
        Ok(conn) => conn,
        Err(reason) => return Ok(JobOutcome::Skipped(reason)),
    };
    let Some(base) = ctx.store().find_base(tenant_id, base_id).await? else {
        return Ok(JobOutcome::Skipped(SkipReason::EntityMissing));
    };

    let loggable = EntityRef::Base(base_id);
    match add_variants(ctx, &conn, &base).await {
        Ok(count) => {
            if count > 0 {
                ctx.record_success(
                    &conn,
                    loggable,
                    OPERATION,
                    format!("Added base {} to {count} Shopify products", base.descriptor),
                    serde_json::json!({ "products_updated": count }),
                )
                .await?;
            }
            Ok(JobOutcome::Synced { count })
        }
        Err(e) => ctx.settle_failure(&conn, loggable, OPERATION, "Failed to add base to Shopify products", e).await,
    }
}

async fn add_variants(ctx: &SyncContext, conn: &Connection, base: &Base) -> Result<usize, JobError> {
    let store = ctx.store();
    let integration_id = conn.integration.id;
    let products = store.external_ids_by_kind(integration_id, EntityKind::Colorway, ExternalType::ShopifyProduct).await?;

    let mut count = 0;
    for product in products {
        let EntityRef::Colorway(colorway_id) = product.entity else { continue };
        if store.find_colorway(base.tenant_id, colorway_id).await?.is_none() {
            continue;
        }

        let inventory = store.first_or_create_inventory(base.tenant_id, colorway_id, base.id).await?;
        let entity = EntityRef::Inventory(inventory.id);
        if store.find_external_id(integration_id, entity, ExternalType::ShopifyVariant).await?.is_some() {
            continue;
        }

        // Remote first: a crash before the insert leaves an unmapped remote variant.
        let variant_id = conn.client.create_variant(&product.external_id, base, inventory.quantity).await?;
        store
            .insert_external_id(&ExternalIdentifier::new(integration_id, entity, ExternalType::ShopifyVariant, variant_id))
            .await?;
        count += 1;
    }
    Ok(count)
}
