//! Periodic status polling on the tokio runtime.
//!
//! The poller owns its background task. Each poll is numbered; outcomes are
//! published through a watch channel that only ever moves forward in
//! sequence, so a slow response never replaces a newer one.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use super::StatusSource;
use crate::data::PollResult;

/// Default time between two polls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Result of one numbered poll.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub sequence: u64,
    /// The error is kept as display text; it is shown verbatim.
    pub result: Result<PollResult, String>,
}

/// Background poller of a [`StatusSource`].
///
/// Polls once immediately, then every `interval` until [`Poller::stop`] is
/// called or the poller is dropped.
pub struct Poller {
    trigger: mpsc::UnboundedSender<()>,
    outcomes: watch::Receiver<Option<PollOutcome>>,
    task: Option<JoinHandle<()>>,
    description: String,
}

impl Poller {
    /// Spawn the polling task on `runtime`.
    pub fn start(runtime: &Handle, source: Arc<dyn StatusSource>, interval: Duration) -> Self {
        let (trigger, trigger_rx) = mpsc::unbounded_channel();
        let (tx, outcomes) = watch::channel(None);
        let description = source.description();

        tracing::info!(source = %description, interval_secs = interval.as_secs(), "Starting poller");
        let task = runtime.spawn(run(source, interval, trigger_rx, Arc::new(tx)));

        Self {
            trigger,
            outcomes,
            task: Some(task),
            description,
        }
    }

    /// Request a poll now, in addition to the timer.
    pub fn trigger(&self) {
        if self.trigger.send(()).is_err() {
            tracing::debug!("Poll trigger ignored, poller is stopped");
        }
    }

    /// Take the newest outcome if one arrived since the last call.
    ///
    /// Non-blocking.
    pub fn latest(&mut self) -> Option<PollOutcome> {
        if self.outcomes.has_changed().unwrap_or(false) {
            self.outcomes.borrow_and_update().clone()
        } else {
            None
        }
    }

    /// Stop polling. In-flight requests are abandoned.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!(source = %self.description, "Poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Returns a description of the polled source.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    source: Arc<dyn StatusSource>,
    interval: Duration,
    mut trigger: mpsc::UnboundedReceiver<()>,
    tx: Arc<watch::Sender<Option<PollOutcome>>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Dropping the set aborts polls still in flight.
    let mut in_flight = JoinSet::new();
    let mut sequence = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            request = trigger.recv() => {
                if request.is_none() {
                    break;
                }
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => continue,
        }

        sequence += 1;
        let source = Arc::clone(&source);
        let tx = Arc::clone(&tx);
        in_flight.spawn(poll_once(source, sequence, tx));
    }
}

async fn poll_once(
    source: Arc<dyn StatusSource>,
    sequence: u64,
    tx: Arc<watch::Sender<Option<PollOutcome>>>,
) {
    tracing::debug!(sequence, "Polling status");
    let result = match source.fetch().await {
        Ok(report) => Ok(PollResult::from_report(&report, sequence, Local::now())),
        Err(e) => {
            tracing::warn!(sequence, error = %e, "Status poll failed");
            Err(e.to_string())
        }
    };

    publish(&tx, PollOutcome { sequence, result });
}

/// Store `outcome` unless a newer one is already published.
fn publish(tx: &watch::Sender<Option<PollOutcome>>, outcome: PollOutcome) -> bool {
    tx.send_if_modified(|current| {
        if current.as_ref().is_some_and(|c| c.sequence >= outcome.sequence) {
            tracing::debug!(sequence = outcome.sequence, "Dropping stale poll outcome");
            return false;
        }
        *current = Some(outcome);
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, StatusPayload, StatusReport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for CountingSource {
        async fn fetch(&self) -> Result<StatusReport, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(StatusReport::default())
        }

        fn description(&self) -> String {
            "counting".to_string()
        }
    }

    /// First call is slow, later calls answer immediately.
    #[derive(Debug, Default)]
    struct SlowFirstSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusSource for SlowFirstSource {
        async fn fetch(&self) -> Result<StatusReport, ApiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let name = if call == 0 {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "slow"
            } else {
                "fast"
            };
            Ok(StatusReport {
                status: StatusPayload {
                    name: name.to_string(),
                    ..StatusPayload::default()
                },
                ..StatusReport::default()
            })
        }

        fn description(&self) -> String {
            "slow-first".to_string()
        }
    }

    #[derive(Debug)]
    struct FailingSource;

    #[async_trait]
    impl StatusSource for FailingSource {
        async fn fetch(&self) -> Result<StatusReport, ApiError> {
            Err(ApiError::Timeout)
        }

        fn description(&self) -> String {
            "failing".to_string()
        }
    }

    fn outcome(sequence: u64) -> PollOutcome {
        PollOutcome {
            sequence,
            result: Err(format!("poll {}", sequence)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_every_interval() {
        let source = Arc::new(CountingSource::default());
        let mut poller = Poller::start(&Handle::current(), source.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.count(), 1);
        assert_eq!(poller.latest().map(|o| o.sequence), Some(1));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.count(), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.count(), 4);

        poller.stop();
        assert!(!poller.is_running());
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_polls_immediately() {
        let source = Arc::new(CountingSource::default());
        let poller = Poller::start(&Handle::current(), source.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.trigger();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_does_not_replace_newer() {
        let source = Arc::new(SlowFirstSource::default());
        let mut poller = Poller::start(&Handle::current(), source, Duration::from_secs(30));

        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.trigger();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let newest = poller.latest().unwrap();
        assert_eq!(newest.sequence, 2);
        assert_eq!(newest.result.unwrap().name, "fast");

        // The first poll completes now and must be dropped.
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(poller.latest().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_reported_as_text() {
        let mut poller =
            Poller::start(&Handle::current(), Arc::new(FailingSource), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let outcome = poller.latest().unwrap();
        assert_eq!(outcome.result.unwrap_err(), "Request timed out");
        assert_eq!(poller.description(), "failing");
    }

    #[test]
    fn test_publish_keeps_highest_sequence() {
        let (tx, rx) = watch::channel(None);
        assert!(publish(&tx, outcome(2)));
        assert!(!publish(&tx, outcome(1)));
        assert!(!publish(&tx, outcome(2)));
        assert!(publish(&tx, outcome(3)));
        assert_eq!(rx.borrow().as_ref().map(|o| o.sequence), Some(3));
    }
}
