//! Base removed: delete its remote variants, then every local inventory row for it.
//!
//! Carries raw identifiers only; the base row is gone by the time this runs.

use uuid::Uuid;

use super::{Connection, JobError, JobOutcome, Resolved, SyncContext};
use crate::domain::value_objects::{EntityRef, ExternalType};

const OPERATION: &str = "base_deleted";

pub(super) async fn run(ctx: &SyncContext, tenant_id: Uuid, base_id: Uuid) -> Result<JobOutcome, JobError> {
    let conn = match ctx.resolve(tenant_id).await? {
        Resolved::Ready(conn) => conn,
        Resolved::Skip(reason) => return Ok(JobOutcome::Skipped(reason)),
        // Dropping the job here would orphan the remote variants for good.
        Resolved::ClientFailed(e) => return Err(JobError::ClientUnavailable(e)),
    };

    let count = delete_variants(ctx, &conn, tenant_id, base_id).await?;
    let removed = ctx.store().delete_inventories_for_base(tenant_id, base_id).await?;
    tracing::debug!(%tenant_id, %base_id, variants = count, inventories = removed, "base removed from remote catalog");

    if count > 0 {
        ctx.record_success(
            &conn,
            EntityRef::Base(base_id),
            OPERATION,
            format!("Deleted {count} Shopify variants for removed base"),
            serde_json::json!({ "variants_deleted": count }),
        )
        .await?;
    }
    Ok(JobOutcome::Synced { count })
}

/// Retryable failures abort before any local row is touched.
async fn delete_variants(ctx: &SyncContext, conn: &Connection, tenant_id: Uuid, base_id: Uuid) -> Result<usize, JobError> {
    let store = ctx.store();
    let mut count = 0;
    for inventory in store.inventories_for_base(tenant_id, base_id).await? {
        let entity = EntityRef::Inventory(inventory.id);
        let Some(variant) = store.find_external_id(conn.integration.id, entity, ExternalType::ShopifyVariant).await? else {
            continue;
        };
        match conn.client.delete_variant(&variant.external_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) if e.is_retryable() => return Err(e.into()),
            Err(e) => {
                // The inventory row goes away below, so its mapping cannot outlive it.
                tracing::warn!(%entity, variant_id = %variant.external_id, error = %e, "remote variant delete rejected, skipping");
                store.delete_external_id(variant.id).await?;
                continue;
            }
        }
        store.delete_external_id(variant.id).await?;
        count += 1;
    }
    Ok(count)
}
