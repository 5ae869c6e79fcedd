//! Base edited: push its descriptive fields to every mapped remote variant.

use uuid::Uuid;

use super::{Connection, JobError, JobOutcome, SkipReason, SyncContext};
use crate::domain::aggregates::Base;
use crate::domain::value_objects::{EntityRef, ExternalType};

const OPERATION: &str = "base_updated";

pub(super) async fn run(ctx: &SyncContext, tenant_id: Uuid, base_id: Uuid) -> Result<JobOutcome, JobError> {
    let conn = match ctx.connect(tenant_id).await? {
        Ok(conn) => conn,
        Err(reason) => return Ok(JobOutcome::Skipped(reason)),
    };
    let Some(base) = ctx.store().find_base(tenant_id, base_id).await? else {
        return Ok(JobOutcome::Skipped(SkipReason::EntityMissing));
    };

    let loggable = EntityRef::Base(base_id);
    // One failure ends the job; variants already pushed stay pushed.
    match update_variants(ctx, &conn, &base).await {
        Ok(count) => {
            if count > 0 {
                ctx.record_success(
                    &conn,
                    loggable,
                    OPERATION,
                    format!("Updated {count} Shopify variants for base {}", base.descriptor),
                    serde_json::json!({ "variants_updated": count }),
                )
                .await?;
            }
            Ok(JobOutcome::Synced { count })
        }
        Err(e) => ctx.settle_failure(&conn, loggable, OPERATION, "Failed to update Shopify variants", e).await,
    }
}

async fn update_variants(ctx: &SyncContext, conn: &Connection, base: &Base) -> Result<usize, JobError> {
    let store = ctx.store();
    let mut count = 0;
    for inventory in store.inventories_for_base(base.tenant_id, base.id).await? {
        let mapping = store
            .find_external_id(conn.integration.id, EntityRef::Inventory(inventory.id), ExternalType::ShopifyVariant)
            .await?;
        let Some(variant) = mapping else { continue };
        conn.client.update_variant(&variant.external_id, base).await?;
        count += 1;
    }
    Ok(count)
}
