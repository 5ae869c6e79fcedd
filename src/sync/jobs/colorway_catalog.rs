//! Colorway edited: push the product fields to its linked remote product.

use uuid::Uuid;

use super::{JobError, JobOutcome, SkipReason, SyncContext};
use crate::domain::value_objects::{EntityRef, ExternalType};

const OPERATION: &str = "colorway_catalog";

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
    // Always the stored row, never the snapshot the event was raised from.
    let Some(colorway) = store.find_colorway(tenant_id, colorway_id).await? else {
        return Ok(JobOutcome::Skipped(SkipReason::EntityMissing));
    };

    match conn.client.update_product(&colorway, &product.external_id).await {
        Ok(()) => {
            ctx.record_success(
                &conn,
                loggable,
                OPERATION,
                format!("Product {} synced to Shopify", colorway.name),
                serde_json::json!({ "product_id": product.external_id }),
            )
            .await?;
            Ok(JobOutcome::Synced { count: 1 })
        }
        Err(e) => ctx.settle_failure(&conn, loggable, OPERATION, "Product update failed", e.into()).await,
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::aggregates::{Colorway, ColorwayStatus};
    use crate::domain::value_objects::{EntityRef, LogStatus};
    use crate::store::CatalogStore;
    use crate::sync::testing::{Call, Failure, Harness};
    use crate::sync::{JobOutcome, SkipReason, SyncJob, SyncSettings};

    #[tokio::test]
    async fn test_repeat_sync_updates_same_product() {
        let h = Harness::new().await;
        let colorway = Colorway::create(h.tenant_id, "Tidepool");
        let product_id = h.link_colorway(colorway.clone()).await;
        let job = SyncJob::ColorwayCatalog { tenant_id: h.tenant_id, colorway_id: colorway.id };

        assert_eq!(h.ctx.run(&job).await.unwrap(), JobOutcome::Synced { count: 1 });
        assert_eq!(h.ctx.run(&job).await.unwrap(), JobOutcome::Synced { count: 1 });

        let update = Call::UpdateProduct { product_id, colorway_id: colorway.id };
        assert_eq!(h.remote.calls(), vec![update.clone(), update]);
        assert_eq!(h.store.external_ids().await.len(), 1);
        let logs = h.store.logs().await;
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.status == LogStatus::Success && l.loggable == EntityRef::Colorway(colorway.id)));
    }

    #[tokio::test]
    async fn test_pushes_stored_state() {
        let h = Harness::new().await;
        let mut colorway = Colorway::create(h.tenant_id, "Tidepool");
        h.link_colorway(colorway.clone()).await;
        colorway.set_name("Tidepool II");
        h.store.put_colorway(colorway.clone()).await;

        h.ctx.run(&SyncJob::ColorwayCatalog { tenant_id: h.tenant_id, colorway_id: colorway.id }).await.unwrap();
        assert_eq!(h.remote.pushed_names(), vec!["Tidepool II".to_string()]);
    }

    #[tokio::test]
    async fn test_rejection_logs_error_and_leaves_colorway() {
        let h = Harness::new().await;
        let mut colorway = Colorway::create(h.tenant_id, "Tidepool");
        colorway.set_status(ColorwayStatus::Active);
        h.link_colorway(colorway.clone()).await;
        h.remote.fail("update_product", Failure::Rejected("Title can't be blank"));

        let outcome = h.ctx.run(&SyncJob::ColorwayCatalog { tenant_id: h.tenant_id, colorway_id: colorway.id }).await.unwrap();
        assert!(matches!(outcome, JobOutcome::Rejected { .. }));

        let logs = h.store.logs().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Error);
        assert!(logs[0].message.contains("Title can't be blank"));
        assert!(logs[0].metadata["error"].as_str().unwrap().contains("Title can't be blank"));

        let stored = h.store.find_colorway(h.tenant_id, colorway.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Tidepool");
        assert_eq!(stored.status, ColorwayStatus::Active);
    }

    #[tokio::test]
    async fn test_unlinked_colorway_is_skipped() {
        let h = Harness::new().await;
        let colorway = Colorway::create(h.tenant_id, "Tidepool");
        h.store.put_colorway(colorway.clone()).await;

        let outcome = h.ctx.run(&SyncJob::ColorwayCatalog { tenant_id: h.tenant_id, colorway_id: colorway.id }).await.unwrap();
        assert_eq!(outcome, JobOutcome::Skipped(SkipReason::NotLinked));
        assert!(h.remote.calls().is_empty());
        assert!(h.store.logs().await.is_empty());
    }

    #[tokio::test]
    async fn test_global_flag_off_is_inert() {
        let h = Harness::build(SyncSettings::new(false), true, false).await;
        let colorway = Colorway::create(h.tenant_id, "Tidepool");
        h.link_colorway(colorway.clone()).await;

        let outcome = h.ctx.run(&SyncJob::ColorwayCatalog { tenant_id: h.tenant_id, colorway_id: colorway.id }).await.unwrap();
        assert_eq!(outcome, JobOutcome::Skipped(SkipReason::SyncDisabled));
        assert!(h.remote.calls().is_empty());
    }
}
