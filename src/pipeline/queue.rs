// src/pipeline/queue.rs

//! Hand-off queues between stages.
//!
//! A queue is owned by the stage that feeds it. Only the owner can mint
//! [`QueueWriter`]s, and [`StageQueue::close`] consumes the owner, so the
//! queue is closed exactly once and nothing can write to it afterwards.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::stage::{StageTracker, TaskTicket};
use super::summary::Stage;

/// Create an unbounded queue fed by `stage`.
pub fn stage_queue<T>(stage: Stage) -> (StageQueue<T>, QueueReader<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let queue = StageQueue {
        tx,
        tracker: Arc::new(StageTracker::new(stage)),
    };
    (queue, QueueReader { rx })
}

/// Producer side of a queue, held by the stage that feeds it.
#[derive(Debug)]
pub struct StageQueue<T> {
    tx: mpsc::UnboundedSender<T>,
    tracker: Arc<StageTracker>,
}

impl<T> StageQueue<T> {
    /// Register a producer task and hand it a writer.
    pub fn writer(&self) -> QueueWriter<T> {
        QueueWriter {
            tx: self.tx.clone(),
            ticket: self.tracker.register(),
        }
    }

    /// Record work that will not be dispatched.
    pub fn skip(&self, count: usize) {
        self.tracker.record_skipped(count);
    }

    pub fn tracker(&self) -> &StageTracker {
        &self.tracker
    }

    /// Seal the stage, wait for every writer to finish, then close.
    ///
    /// The reader sees end-of-queue only after this returns and all
    /// outstanding values have been received.
    pub async fn close(self) -> Arc<StageTracker> {
        let Self { tx, tracker } = self;
        tracker.seal();
        tracker.wait_quiescent().await;
        drop(tx);
        log::debug!("{} queue closed", tracker.stage());
        tracker
    }
}

/// Write access for a single in-flight producer task.
#[derive(Debug)]
pub struct QueueWriter<T> {
    tx: mpsc::UnboundedSender<T>,
    ticket: TaskTicket,
}

impl<T> QueueWriter<T> {
    /// Push a value to the next stage.
    pub fn send(&self, value: T) {
        // The reader lives until every sender is gone, so this only fails
        // if the consuming relay panicked.
        if self.tx.send(value).is_ok() {
            self.ticket.tracker().record_emitted();
        } else {
            log::error!("{} queue reader dropped early", self.ticket.stage());
        }
    }

    pub fn succeed(self) {
        self.ticket.succeed();
    }

    pub fn fail(self, subject: impl Into<String>, error: crate::error::AppError) {
        self.ticket.fail(subject, error);
    }
}

/// Consumer side of a queue.
#[derive(Debug)]
pub struct QueueReader<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> QueueReader<T> {
    /// Next value, or `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::StageState;
    use std::time::Duration;

    #[tokio::test]
    async fn test_close_without_writers() {
        let (queue, mut reader) = stage_queue::<u32>(Stage::Fetch);
        let tracker = queue.close().await;

        assert_eq!(tracker.state(), StageState::Closed);
        assert_eq!(reader.recv().await, None);
    }

    #[tokio::test]
    async fn test_close_waits_for_slow_writers() {
        let (queue, mut reader) = stage_queue::<u32>(Stage::Download);

        for i in 0..4u32 {
            let writer = queue.writer();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(u64::from(4 - i) * 15)).await;
                writer.send(i);
                writer.succeed();
            });
        }

        let closer = tokio::spawn(queue.close());

        let mut received = Vec::new();
        while let Some(v) = reader.recv().await {
            received.push(v);
        }
        received.sort();
        assert_eq!(received, vec![0, 1, 2, 3]);

        let tracker = closer.await.unwrap();
        let report = tracker.report();
        assert_eq!(report.emitted, 4);
        assert_eq!(report.succeeded, 4);
    }

    #[tokio::test]
    async fn test_writer_may_emit_many_values() {
        let (queue, mut reader) = stage_queue::<&'static str>(Stage::Fetch);
        let writer = queue.writer();
        writer.send("a");
        writer.send("b");
        writer.succeed();
        queue.skip(2);

        let tracker = queue.close().await;
        assert_eq!(reader.recv().await, Some("a"));
        assert_eq!(reader.recv().await, Some("b"));
        assert_eq!(reader.recv().await, None);

        let report = tracker.report();
        assert_eq!(report.emitted, 2);
        assert_eq!(report.skipped, 2);
    }
}
