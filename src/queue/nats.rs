//! Durable queue on a NATS JetStream work stream.

use async_nats::jetstream::{self, consumer::PullConsumer, stream};
use async_trait::async_trait;

use super::{Envelope, JobQueue, QueueError};
use crate::sync::SyncJob;

pub const STREAM: &str = "CATALOG_SYNC";
pub const SUBJECTS: &str = "catalog.sync.>";
pub const CONSUMER: &str = "catalog-sync-worker";

#[derive(Clone)]
pub struct NatsQueue {
    context: jetstream::Context,
}

impl NatsQueue {
    /// Binds to the work stream, creating it on first use.
    pub async fn connect(client: async_nats::Client) -> Result<Self, QueueError> {
        let context = jetstream::new(client);
        context
            .get_or_create_stream(stream::Config {
                name: STREAM.to_string(),
                subjects: vec![SUBJECTS.to_string()],
                retention: stream::RetentionPolicy::WorkQueue,
                ..Default::default()
            })
            .await
            .map_err(backend)?;
        Ok(Self { context })
    }

    /// The durable pull consumer the worker reads from.
    pub async fn consumer(&self) -> Result<PullConsumer, QueueError> {
        let stream = self.context.get_stream(STREAM).await.map_err(backend)?;
        stream
            .get_or_create_consumer(
                CONSUMER,
                jetstream::consumer::pull::Config { durable_name: Some(CONSUMER.to_string()), ..Default::default() },
            )
            .await
            .map_err(backend)
    }
}

pub fn subject_for(job: &SyncJob) -> String { format!("catalog.sync.{}", job.name()) }

fn backend(e: impl std::fmt::Display) -> QueueError { QueueError::Backend(e.to_string()) }

#[async_trait]
impl JobQueue for NatsQueue {
    async fn push(&self, job: SyncJob) -> Result<(), QueueError> {
        let subject = subject_for(&job);
        let payload = serde_json::to_vec(&Envelope::new(job))?;
        // Wait for the stream's ack so a lost publish surfaces here.
        self.context
            .publish(subject, payload.into())
            .await
            .map_err(backend)?
            .await
            .map_err(backend)?;
        Ok(())
    }
}
