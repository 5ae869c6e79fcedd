//! Queue worker
//!
//! Runs queued envelopes through [`SyncContext`]. A job that returns a retryable
//! [`JobError`] is put back with a delay until it reaches the attempt limit; then, or
//! straight away for errors that cannot succeed later, it is written to the
//! dead-letter table.

use async_nats::jetstream::{consumer::PullConsumer, AckKind};
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::queue::{Envelope, LocalQueue, LocalReceiver, QueueError};
use crate::store::FailedJob;
use crate::sync::{JobError, JobOutcome, SyncContext};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn should_retry(&self, attempt: u32) -> bool { attempt < self.max_attempts }
}

impl Default for RetryPolicy {
    fn default() -> Self { Self { max_attempts: 3, backoff: Duration::from_secs(10) } }
}

/// What to do with an envelope after one run.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Completed(JobOutcome),
    Retry { delay: Duration },
    DeadLettered,
}

pub struct Worker {
    ctx: SyncContext,
    policy: RetryPolicy,
}

impl Worker {
    pub fn new(ctx: SyncContext, policy: RetryPolicy) -> Self {
        Self { ctx, policy }
    }

    pub async fn handle(&self, envelope: &Envelope) -> Disposition {
        let job = &envelope.job;
        match self.ctx.run(job).await {
            Ok(outcome) => Disposition::Completed(outcome),
            Err(e) if e.is_retryable() && self.policy.should_retry(envelope.attempt) => {
                tracing::warn!(
                    job = job.name(),
                    tenant_id = %job.tenant_id(),
                    attempt = envelope.attempt,
                    error = %e,
                    "catalog sync job failed, will retry"
                );
                Disposition::Retry { delay: self.policy.backoff }
            }
            Err(e) => {
                let payload = serde_json::to_value(job).unwrap_or(serde_json::Value::Null);
                self.dead_letter(envelope.id, payload, &e, envelope.attempt).await;
                Disposition::DeadLettered
            }
        }
    }

    async fn dead_letter(&self, id: Uuid, payload: serde_json::Value, error: &JobError, attempts: u32) {
        tracing::error!(%id, attempts, error = %error, "catalog sync job dead-lettered");
        let failed = FailedJob { id, payload, error: error.to_string(), attempts, failed_at: Utc::now() };
        if let Err(e) = self.ctx.store().record_failed_job(&failed).await {
            tracing::error!(%id, error = %e, "failed to record dead-lettered job");
        }
    }

    /// Drains the in-process queue, one task per envelope.
    pub async fn run_local(self: Arc<Self>, queue: LocalQueue, mut rx: LocalReceiver) {
        while let Some(envelope) = rx.recv().await {
            let worker = self.clone();
            let queue = queue.clone();
            tokio::spawn(async move {
                if let Disposition::Retry { delay } = worker.handle(&envelope).await {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = queue.requeue(envelope.next_attempt()) {
                        tracing::warn!(id = %envelope.id, error = %e, "failed to requeue catalog sync job");
                    }
                }
            });
        }
        tracing::info!("local catalog sync queue closed");
    }

    /// Consumes the JetStream work stream. The attempt count is the server's delivery count.
    pub async fn run_jetstream(self: Arc<Self>, consumer: PullConsumer) -> Result<(), QueueError> {
        let mut messages = consumer.messages().await.map_err(|e| QueueError::Backend(e.to_string()))?;
        while let Some(message) = messages.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to pull catalog sync message");
                    continue;
                }
            };

            let mut envelope: Envelope = match serde_json::from_slice(&message.payload) {
                Ok(envelope) => envelope,
                Err(e) => {
                    let raw = serde_json::Value::String(String::from_utf8_lossy(&message.payload).into_owned());
                    self.dead_letter(Uuid::now_v7(), raw, &JobError::InvalidPayload(e.to_string()), 1).await;
                    if let Err(e) = message.ack_with(AckKind::Term).await {
                        tracing::warn!(error = %e, "failed to terminate invalid catalog sync message");
                    }
                    continue;
                }
            };
            if let Ok(info) = message.info() {
                envelope.attempt = u32::try_from(info.delivered).unwrap_or(u32::MAX);
            }

            let ack = match self.handle(&envelope).await {
                Disposition::Completed(_) | Disposition::DeadLettered => message.ack().await,
                Disposition::Retry { delay } => message.ack_with(AckKind::Nak(Some(delay))).await,
            };
            if let Err(e) = ack {
                tracing::warn!(id = %envelope.id, error = %e, "failed to acknowledge catalog sync message");
            }
        }
        Ok(())
    }
}
