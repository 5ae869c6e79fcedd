//! In-process queue on a tokio channel. Nothing survives a restart.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Envelope, JobQueue, QueueError};
use crate::sync::SyncJob;

#[derive(Clone)]
pub struct LocalQueue {
    tx: mpsc::UnboundedSender<Envelope>,
}

pub struct LocalReceiver {
    rx: mpsc::UnboundedReceiver<Envelope>,
}

impl LocalQueue {
    pub fn new() -> (Self, LocalReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, LocalReceiver { rx })
    }

    /// Puts an envelope back, keeping its attempt count.
    pub fn requeue(&self, envelope: Envelope) -> Result<(), QueueError> {
        self.tx.send(envelope).map_err(|_| QueueError::Closed)
    }
}

impl LocalReceiver {
    /// Next envelope, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Envelope> { self.rx.recv().await }
}

#[async_trait]
impl JobQueue for LocalQueue {
    async fn push(&self, job: SyncJob) -> Result<(), QueueError> {
        self.requeue(Envelope::new(job))
    }
}
