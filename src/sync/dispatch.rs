//! Dispatch gate
//!
//! Runs after a catalog write has been persisted and turns the lifecycle event into
//! at most one queued [`SyncJob`]. It never fails the write: enqueue errors are
//! downgraded to a warning.

use std::sync::Arc;

use super::change_detector::is_sync_relevant;
use super::{SyncJob, SyncSettings};
use crate::domain::aggregates::{Base, Colorway, Media};
use crate::domain::events::{BaseEvent, CatalogEvent, ColorwayEvent, MediaEvent};
use crate::domain::value_objects::EntityRef;
use crate::queue::JobQueue;

/// What the gate did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Enqueued(SyncJob),
    Skipped,
    /// A job was warranted but could not be enqueued.
    Dropped(SyncJob),
}

impl Dispatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enqueued(_) => "enqueued",
            Self::Skipped => "skipped",
            Self::Dropped(_) => "dropped",
        }
    }
}

pub struct DispatchGate {
    queue: Arc<dyn JobQueue>,
    settings: SyncSettings,
}

impl DispatchGate {
    pub fn new(queue: Arc<dyn JobQueue>, settings: SyncSettings) -> Self {
        Self { queue, settings }
    }

    pub fn settings(&self) -> SyncSettings { self.settings }

    /// The job an event warrants, if any. Pure.
    pub fn decide(&self, event: &CatalogEvent) -> Option<SyncJob> {
        if !self.settings.catalog_sync_enabled {
            return None;
        }
        match event {
            CatalogEvent::Base(BaseEvent::Created { tenant_id, base_id }) => {
                Some(SyncJob::BaseCreated { tenant_id: *tenant_id, base_id: *base_id })
            }
            CatalogEvent::Base(BaseEvent::Updated { tenant_id, base_id, changed }) => is_sync_relevant::<Base>(changed)
                .then(|| SyncJob::BaseUpdated { tenant_id: *tenant_id, base_id: *base_id }),
            CatalogEvent::Base(BaseEvent::Deleted { tenant_id, base_id }) => {
                Some(SyncJob::BaseDeleted { tenant_id: *tenant_id, base_id: *base_id })
            }
            CatalogEvent::Colorway(ColorwayEvent::Updated { tenant_id, colorway_id, changed }) => is_sync_relevant::<Colorway>(changed)
                .then(|| SyncJob::ColorwayCatalog { tenant_id: *tenant_id, colorway_id: *colorway_id }),
            CatalogEvent::Colorway(ColorwayEvent::Created { .. } | ColorwayEvent::Deleted { .. }) => None,
            CatalogEvent::Media(MediaEvent::Created { tenant_id, owner, .. } | MediaEvent::Deleted { tenant_id, owner, .. }) => {
                images_job(*tenant_id, owner)
            }
            CatalogEvent::Media(MediaEvent::Updated { tenant_id, owner, changed, .. }) => {
                if is_sync_relevant::<Media>(changed) { images_job(*tenant_id, owner) } else { None }
            }
        }
    }

    /// Enqueues the job `event` warrants. Never returns an error.
    pub async fn dispatch(&self, event: &CatalogEvent) -> Dispatch {
        let Some(job) = self.decide(event) else {
            tracing::debug!(entity = %event.subject(), action = event.action(), "no catalog sync needed");
            return Dispatch::Skipped;
        };
        match self.queue.push(job.clone()).await {
            Ok(()) => {
                tracing::debug!(entity = %event.subject(), action = event.action(), job = job.name(), "catalog sync job enqueued");
                Dispatch::Enqueued(job)
            }
            Err(e) => {
                tracing::warn!(
                    entity = %event.subject(),
                    action = event.action(),
                    job = job.name(),
                    error = %e,
                    "failed to enqueue catalog sync job"
                );
                Dispatch::Dropped(job)
            }
        }
    }

    pub async fn dispatch_all(&self, events: impl IntoIterator<Item = CatalogEvent>) -> Vec<Dispatch> {
        let mut results = Vec::new();
        for event in events {
            results.push(self.dispatch(&event).await);
        }
        results
    }
}

fn images_job(tenant_id: uuid::Uuid, owner: &EntityRef) -> Option<SyncJob> {
    match owner {
        EntityRef::Colorway(colorway_id) => Some(SyncJob::ColorwayImages { tenant_id, colorway_id: *colorway_id }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{BaseField, ColorwayField, MediaField};
    use crate::domain::value_objects::ChangeSet;
    use crate::sync::testing::{FailingQueue, RecordingQueue};
    use uuid::Uuid;

    fn gate(queue: Arc<dyn JobQueue>, enabled: bool) -> DispatchGate {
        DispatchGate::new(queue, SyncSettings::new(enabled))
    }

    fn base_updated(fields: &[BaseField]) -> CatalogEvent {
        CatalogEvent::Base(BaseEvent::Updated { tenant_id: Uuid::now_v7(), base_id: Uuid::now_v7(), changed: fields.iter().copied().collect() })
    }

    fn colorway_updated(fields: &[ColorwayField]) -> CatalogEvent {
        CatalogEvent::Colorway(ColorwayEvent::Updated { tenant_id: Uuid::now_v7(), colorway_id: Uuid::now_v7(), changed: fields.iter().copied().collect() })
    }

    fn media_updated(owner: EntityRef, fields: &[MediaField]) -> CatalogEvent {
        CatalogEvent::Media(MediaEvent::Updated { tenant_id: Uuid::now_v7(), media_id: Uuid::now_v7(), owner, changed: fields.iter().copied().collect() })
    }

    #[tokio::test]
    async fn test_unwatched_changes_enqueue_nothing() {
        let queue = Arc::new(RecordingQueue::default());
        let gate = gate(queue.clone(), true);
        let events = vec![
            base_updated(&[BaseField::WholesalePrice, BaseField::Other]),
            colorway_updated(&[ColorwayField::Recipe]),
            media_updated(EntityRef::Colorway(Uuid::now_v7()), &[MediaField::FileName]),
        ];
        let results = gate.dispatch_all(events).await;
        assert!(results.iter().all(|d| *d == Dispatch::Skipped));
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_watched_change_enqueues_one_job() {
        let queue = Arc::new(RecordingQueue::default());
        let gate = gate(queue.clone(), true);

        let event = base_updated(&[BaseField::RetailPrice, BaseField::Yardage]);
        assert!(matches!(gate.dispatch(&event).await, Dispatch::Enqueued(SyncJob::BaseUpdated { .. })));

        let event = colorway_updated(&[ColorwayField::Name, ColorwayField::Colors]);
        assert!(matches!(gate.dispatch(&event).await, Dispatch::Enqueued(SyncJob::ColorwayCatalog { .. })));

        let colorway_id = Uuid::now_v7();
        let event = media_updated(EntityRef::Colorway(colorway_id), &[MediaField::IsPrimary]);
        assert_eq!(
            gate.dispatch(&event).await,
            Dispatch::Enqueued(SyncJob::ColorwayImages { tenant_id: event.tenant_id(), colorway_id })
        );
        assert_eq!(queue.jobs().len(), 3);
    }

    #[tokio::test]
    async fn test_base_lifecycle_is_unconditional() {
        let queue = Arc::new(RecordingQueue::default());
        let gate = gate(queue.clone(), true);
        let (tenant_id, base_id) = (Uuid::now_v7(), Uuid::now_v7());
        gate.dispatch(&CatalogEvent::Base(BaseEvent::Created { tenant_id, base_id })).await;
        gate.dispatch(&CatalogEvent::Base(BaseEvent::Deleted { tenant_id, base_id })).await;
        assert_eq!(queue.jobs(), vec![SyncJob::BaseCreated { tenant_id, base_id }, SyncJob::BaseDeleted { tenant_id, base_id }]);
    }

    #[tokio::test]
    async fn test_media_of_other_owners_is_ignored() {
        let queue = Arc::new(RecordingQueue::default());
        let gate = gate(queue.clone(), true);
        let event = CatalogEvent::Media(MediaEvent::Created { tenant_id: Uuid::now_v7(), media_id: Uuid::now_v7(), owner: EntityRef::Base(Uuid::now_v7()) });
        assert_eq!(gate.dispatch(&event).await, Dispatch::Skipped);
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_flag_makes_gate_inert() {
        let queue = Arc::new(RecordingQueue::default());
        let gate = gate(queue.clone(), false);
        let (tenant_id, base_id) = (Uuid::now_v7(), Uuid::now_v7());
        let events = vec![
            CatalogEvent::Base(BaseEvent::Created { tenant_id, base_id }),
            base_updated(&[BaseField::Descriptor, BaseField::RetailPrice]),
            CatalogEvent::Base(BaseEvent::Deleted { tenant_id, base_id }),
            colorway_updated(&[ColorwayField::Status]),
            media_updated(EntityRef::Colorway(Uuid::now_v7()), &[MediaField::FilePath]),
        ];
        let results = gate.dispatch_all(events).await;
        assert_eq!(results, vec![Dispatch::Skipped; 5]);
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_failure_is_swallowed() {
        let gate = gate(Arc::new(FailingQueue), true);
        let mut base = Base::create(Uuid::now_v7(), "Merino DK", None);
        base.set_descriptor("Merino Worsted");
        let event = base.take_update_event().unwrap();

        let outcome = gate.dispatch(&event).await;
        assert!(matches!(outcome, Dispatch::Dropped(SyncJob::BaseUpdated { .. })));
        assert_eq!(outcome.as_str(), "dropped");
        assert_eq!(base.descriptor, "Merino Worsted");
    }

    #[test]
    fn test_decide_is_pure() {
        let gate = gate(Arc::new(FailingQueue), true);
        let event = base_updated(&[BaseField::Descriptor]);
        assert_eq!(gate.decide(&event), gate.decide(&event));
        let empty = CatalogEvent::Base(BaseEvent::Updated { tenant_id: Uuid::now_v7(), base_id: Uuid::now_v7(), changed: ChangeSet::new() });
        assert_eq!(gate.decide(&empty), None);
    }
}
