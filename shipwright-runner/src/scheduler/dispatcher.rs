//! Job dispatcher
//!
//! Hands accepted requests to the orchestrator as background tasks so the
//! admitting request returns immediately. A semaphore bounds how many jobs
//! run at once; when it is exhausted new submissions are refused instead of
//! queued. A delivery already in flight is acknowledged without running it
//! a second time.

use shipwright_core::domain::job::{DeliveryKey, JobRequest};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::orchestrator::JobOrchestrator;

/// How a submission was admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A background job was started
    Accepted,
    /// The same task, round and nonce is already running
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("server is at capacity ({limit} jobs running), retry later")]
    AtCapacity { limit: usize },
}

type InFlight = Arc<Mutex<HashSet<DeliveryKey>>>;

pub struct JobDispatcher {
    orchestrator: Arc<JobOrchestrator>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    in_flight: InFlight,
}

impl JobDispatcher {
    pub fn new(orchestrator: Arc<JobOrchestrator>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            orchestrator,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Starts `request` in the background
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, request: JobRequest) -> Result<Admission, DispatchError> {
        let key = request.delivery_key();
        let mut in_flight = lock(&self.in_flight);

        if in_flight.contains(&key) {
            info!(delivery = %key, "Delivery already in flight, not starting it again");
            return Ok(Admission::Duplicate);
        }

        let permit = match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    delivery = %key,
                    limit = self.max_concurrent,
                    "Max concurrent jobs reached, refusing submission"
                );
                return Err(DispatchError::AtCapacity {
                    limit: self.max_concurrent,
                });
            }
        };

        in_flight.insert(key.clone());
        drop(in_flight);

        let entry = InFlightEntry {
            in_flight: Arc::clone(&self.in_flight),
            key,
        };
        self.spawn_job(request, entry, permit);

        Ok(Admission::Accepted)
    }

    /// Jobs currently running
    pub fn active_jobs(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Resolves once no job is running
    pub async fn wait_idle(&self) {
        let permits = u32::try_from(self.max_concurrent).unwrap_or(u32::MAX);
        if let Ok(all) = self.semaphore.acquire_many(permits).await {
            drop(all);
        }
    }

    fn spawn_job(&self, request: JobRequest, entry: InFlightEntry, permit: OwnedSemaphorePermit) {
        let orchestrator = Arc::clone(&self.orchestrator);

        tokio::spawn(async move {
            let outcome = orchestrator.run(request).await;
            debug!(
                delivery = %entry.key,
                succeeded = outcome.succeeded,
                "Background job finished"
            );
            // Leave the in-flight set before the slot frees up.
            drop(entry);
            drop(permit);
        });
    }
}

/// Removes a delivery from the in-flight set on drop, panics included
struct InFlightEntry {
    in_flight: InFlight,
    key: DeliveryKey,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.key);
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashSet<DeliveryKey>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSourceControl, Harness, MockCompletion, sample_page, sample_request};
    use std::time::Duration;

    fn dispatcher(delay: Duration, max_concurrent: usize) -> (JobDispatcher, Harness) {
        let h = Harness::new(
            MockCompletion::always(sample_page("A")).with_delay(delay),
            FakeSourceControl::new(),
        );
        (
            JobDispatcher::new(Arc::clone(&h.orchestrator), max_concurrent),
            h,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_runs_in_background() {
        let (dispatcher, h) = dispatcher(Duration::from_secs(10), 4);

        assert_eq!(dispatcher.submit(sample_request("t1", 1)), Ok(Admission::Accepted));
        assert_eq!(dispatcher.active_jobs(), 1);
        assert!(h.callback.deliveries().is_empty());

        dispatcher.wait_idle().await;

        assert_eq!(dispatcher.active_jobs(), 0);
        let deliveries = h.callback.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].notice.succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_duplicate_is_not_rerun() {
        let (dispatcher, h) = dispatcher(Duration::from_secs(10), 4);
        let request = sample_request("t1", 1);

        assert_eq!(dispatcher.submit(request.clone()), Ok(Admission::Accepted));
        assert_eq!(dispatcher.submit(request.clone()), Ok(Admission::Duplicate));
        dispatcher.wait_idle().await;
        assert_eq!(h.completion.calls(), 1);

        // Once finished, the same delivery may run again.
        assert_eq!(dispatcher.submit(request), Ok(Admission::Accepted));
        dispatcher.wait_idle().await;
        assert_eq!(h.completion.calls(), 2);
        assert_eq!(h.callback.deliveries().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_nonce_is_a_new_delivery() {
        let (dispatcher, _h) = dispatcher(Duration::from_secs(10), 4);
        let first = sample_request("t1", 1);
        let mut second = first.clone();
        second.nonce = "another".to_string();

        assert_eq!(dispatcher.submit(first), Ok(Admission::Accepted));
        assert_eq!(dispatcher.submit(second), Ok(Admission::Accepted));
        assert_eq!(dispatcher.active_jobs(), 2);
        dispatcher.wait_idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_beyond_capacity() {
        let (dispatcher, _h) = dispatcher(Duration::from_secs(10), 1);

        assert_eq!(dispatcher.submit(sample_request("t1", 1)), Ok(Admission::Accepted));
        assert_eq!(
            dispatcher.submit(sample_request("t2", 1)),
            Err(DispatchError::AtCapacity { limit: 1 })
        );

        dispatcher.wait_idle().await;
        assert_eq!(dispatcher.submit(sample_request("t2", 1)), Ok(Admission::Accepted));
        dispatcher.wait_idle().await;
    }
}
