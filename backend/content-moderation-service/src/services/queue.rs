use crate::metrics::ModerationMetrics;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

/// FIFO of submission ids awaiting automated processing
#[derive(Default)]
pub struct ReviewQueue {
    items: Mutex<VecDeque<Uuid>>,
    notify: Notify,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, submission_id: Uuid) {
        let depth = {
            let mut items = self.items.lock().await;
            items.push_back(submission_id);
            items.len()
        };
        ModerationMetrics::set_queue_depth(depth);
        self.notify.notify_one();
    }

    pub async fn pop(&self) -> Option<Uuid> {
        let mut items = self.items.lock().await;
        let next = items.pop_front();
        ModerationMetrics::set_queue_depth(items.len());
        next
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Wait until something is enqueued or `timeout` elapses
    pub async fn wait(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = ReviewQueue::new();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            queue.push(*id).await;
        }

        assert_eq!(queue.len().await, 3);
        for id in &ids {
            assert_eq!(queue.pop().await, Some(*id));
        }
        assert!(queue.pop().await.is_none());
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_wait_returns_on_push() {
        let queue = Arc::new(ReviewQueue::new());
        let producer = queue.clone();

        let started = Instant::now();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.push(Uuid::new_v4()).await;
        });

        queue.wait(Duration::from_secs(5)).await;
        handle.await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_wait_times_out_when_idle() {
        let queue = ReviewQueue::new();
        let started = Instant::now();
        queue.wait(Duration::from_millis(20)).await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
