//! Outcome notification service
//!
//! Delivers the terminal outcome of a job to its evaluation callback,
//! retrying with exponential backoff. Delivery is best effort: exhausting
//! the schedule is logged and reported, never turned into a job failure.

use shipwright_core::domain::outcome::{NotificationOutcome, NotificationResult};
use shipwright_core::dto::notification::EvaluationNotice;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{NotificationDeliveryError, UpstreamError};
use crate::repository::CallbackRepository;
use crate::retry::{RetryFailure, RetryPolicy};

pub struct OutcomeNotifier {
    callback: Arc<dyn CallbackRepository>,
    retry: RetryPolicy,
}

impl OutcomeNotifier {
    pub fn new(callback: Arc<dyn CallbackRepository>, retry: RetryPolicy) -> Self {
        Self { callback, retry }
    }

    /// Posts `outcome` to `callback_url`
    pub async fn notify(&self, outcome: &NotificationOutcome, callback_url: &str) -> NotificationResult {
        match self.deliver(outcome, callback_url).await {
            Ok(attempts) => {
                info!(
                    url = callback_url,
                    attempts,
                    succeeded = outcome.succeeded,
                    "Outcome delivered"
                );
                NotificationResult {
                    delivered: true,
                    attempts,
                }
            }
            Err(err) => {
                error!(task = %outcome.task_id, round = outcome.round, "{}", err);
                NotificationResult {
                    delivered: false,
                    attempts: err.attempts,
                }
            }
        }
    }

    async fn deliver(
        &self,
        outcome: &NotificationOutcome,
        callback_url: &str,
    ) -> Result<u32, NotificationDeliveryError> {
        if !is_http_url(callback_url) {
            return Err(NotificationDeliveryError {
                url: callback_url.to_string(),
                attempts: 0,
                reason: "callback URL is not http(s)".to_string(),
            });
        }

        let notice = EvaluationNotice::from(outcome);
        let callback = &self.callback;
        let notice = &notice;

        self.retry
            .run(
                "notification",
                |_| async move { callback.deliver(callback_url, notice).await },
                |err: &UpstreamError| !matches!(err, UpstreamError::Rejected(_)),
            )
            .await
            .map(|(_, attempts)| attempts)
            .map_err(|RetryFailure { attempts, error }| NotificationDeliveryError {
                url: callback_url.to_string(),
                attempts,
                reason: error.to_string(),
            })
    }
}

fn is_http_url(url: &str) -> bool {
    let lowered = url.trim().to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lowered.len() > scheme.len() && lowered.starts_with(scheme))
}
