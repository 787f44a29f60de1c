use crate::services::pipeline::ModerationPipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Drain the review queue one submission at a time until shutdown.
///
/// Submissions are processed strictly in enqueue order. When the queue is
/// empty the worker parks until something is enqueued, `poll_interval`
/// elapses, or the shutdown signal fires.
pub async fn run_worker(
    pipeline: Arc<ModerationPipeline>,
    poll_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut consecutive_failures = 0u32;

    info!(
        poll_interval_ms = poll_interval.as_millis() as u64,
        "Starting moderation worker"
    );

    loop {
        match shutdown.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => {
                info!("Received shutdown signal, stopping moderation worker");
                break;
            }
        }

        match pipeline.process_next().await {
            Ok(true) => {
                if consecutive_failures > 0 {
                    info!(
                        recovered_after = consecutive_failures,
                        "Moderation worker recovered after failures"
                    );
                    consecutive_failures = 0;
                }
            }
            Ok(false) => {
                tokio::select! {
                    _ = pipeline.wait_for_work(poll_interval) => {}
                    _ = shutdown.recv() => {
                        info!("Received shutdown signal, stopping moderation worker");
                        break;
                    }
                }
            }
            Err(e) => {
                consecutive_failures += 1;
                error!(
                    error = %e,
                    consecutive_failures,
                    "Moderation worker iteration failed"
                );

                // Only a store that cannot record a processing failure gets
                // here. Back off on repeated failures (at most 32s).
                let backoff = if consecutive_failures >= 3 {
                    Duration::from_secs(2u64.pow(consecutive_failures.min(5)))
                } else {
                    poll_interval
                };
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Spawn [`run_worker`] on the runtime
pub fn spawn_worker(
    pipeline: Arc<ModerationPipeline>,
    poll_interval: Duration,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_worker(pipeline, poll_interval, shutdown).await;
        warn!("Moderation worker exited");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModerationConfig;
    use crate::db::PipelineStores;
    use crate::models::{ContentStatus, ContentType, SubmitContentRequest};
    use crate::services::classifier::{ClassifierAnalysis, MockContentClassifier};

    fn pipeline() -> Arc<ModerationPipeline> {
        let mut config = ModerationConfig::default();
        config.age_verification.required = false;

        let mut classifier = MockContentClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Ok(ClassifierAnalysis::new("mock-v1")));

        Arc::new(
            ModerationPipeline::new(config, PipelineStores::in_memory(), Arc::new(classifier))
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_worker_processes_queue_and_stops_on_shutdown() {
        let pipeline = pipeline();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = spawn_worker(pipeline.clone(), Duration::from_millis(10), shutdown_rx);

        let submission = pipeline
            .submit_content(SubmitContentRequest::new(
                "user-1",
                "creator-1",
                "FanzTube",
                ContentType::Image,
                "http://x/1.jpg",
                1024,
            ))
            .await
            .unwrap();

        let mut status = ContentStatus::Pending;
        for _ in 0..200 {
            status = pipeline
                .get_submission(submission.id)
                .await
                .unwrap()
                .unwrap()
                .status;
            if status == ContentStatus::Approved {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, ContentStatus::Approved);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_worker_stops_when_sender_dropped() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        drop(shutdown_tx);

        tokio::time::timeout(
            Duration::from_secs(5),
            run_worker(pipeline(), Duration::from_millis(10), shutdown_rx),
        )
        .await
        .unwrap();
    }
}
