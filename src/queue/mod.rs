//! Job queue
//!
//! The dispatch gate pushes [`SyncJob`]s here and the worker drains them. Jobs carry
//! identifiers only, so any transport that can move a small JSON document will do:
//! [`LocalQueue`] is an in-process channel, [`NatsQueue`] a durable JetStream stream.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::sync::SyncJob;

pub mod local;
pub mod nats;

pub use local::{LocalQueue, LocalReceiver};
pub use nats::NatsQueue;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue closed")]
    Closed,

    #[error("Queue backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A job plus its delivery bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    /// 1-based delivery attempt.
    pub attempt: u32,
    pub job: SyncJob,
    pub queued_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(job: SyncJob) -> Self {
        Self { id: Uuid::now_v7(), attempt: 1, job, queued_at: Utc::now() }
    }

    /// The same job, one attempt later.
    pub fn next_attempt(&self) -> Self {
        Self { attempt: self.attempt + 1, ..self.clone() }
    }
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn push(&self, job: SyncJob) -> Result<(), QueueError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_attempt_keeps_identity() {
        let job = SyncJob::BaseDeleted { tenant_id: Uuid::now_v7(), base_id: Uuid::now_v7() };
        let first = Envelope::new(job.clone());
        let second = first.next_attempt();
        assert_eq!(first.attempt, 1);
        assert_eq!(second.attempt, 2);
        assert_eq!(second.id, first.id);
        assert_eq!(second.job, job);
    }
}
