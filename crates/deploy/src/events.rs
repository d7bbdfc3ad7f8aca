//! Asynchronous, ordered delivery of deployment lifecycle events.
//!
//! Events go onto an unbounded FIFO channel drained by a single background
//! worker, so reporting I/O never blocks the deployment critical path.
//! Delivery order is emission order; nothing is duplicated or dropped while
//! the channel is open.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A deployment lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    /// The creation transaction was accepted by the backend.
    Created { name: String, transaction_id: String },
    /// The creation transaction was included in a block.
    Confirmed {
        name: String,
        address: String,
        block_number: u64,
    },
    /// The deployment failed after submission.
    Failed { name: String, reason: String },
}

/// Consumer side of the event channel.
pub trait EventSink: Send {
    fn emit(&mut self, event: DeployEvent);
}

impl<F: FnMut(DeployEvent) + Send> EventSink for F {
    fn emit(&mut self, event: DeployEvent) {
        self(event)
    }
}

/// Default sink: report lifecycle progress through the log.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: DeployEvent) {
        match event {
            DeployEvent::Created {
                name,
                transaction_id,
            } => {
                tracing::info!(name = %name, txid = %transaction_id, "Contract creation submitted");
            }
            DeployEvent::Confirmed {
                name,
                address,
                block_number,
            } => {
                tracing::info!(name = %name, address = %address, block = block_number, "Contract confirmed");
            }
            DeployEvent::Failed { name, reason } => {
                tracing::warn!(name = %name, reason = %reason, "Contract deployment failed");
            }
        }
    }
}

/// Handle for emitting events onto the background reporter.
pub struct EventChannel {
    tx: mpsc::UnboundedSender<DeployEvent>,
    worker: JoinHandle<()>,
}

impl EventChannel {
    /// Start the drain worker feeding `sink`.
    pub fn new(mut sink: impl EventSink + 'static) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                sink.emit(event);
            }
        });

        Self { tx, worker }
    }

    /// Emit an event. Never blocks.
    pub fn emit(&self, event: DeployEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Event reporter is gone; dropping lifecycle event");
        }
    }

    /// Close the channel and wait for the worker to drain remaining events.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}
