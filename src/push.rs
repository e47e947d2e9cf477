use crate::adapters::WebPushSender;
use crate::config;
use crate::ports::{PushSender, StoreError, SubscriptionStore};
use crate::types::push::{DeliveryOutcome, DeliveryResult, NotificationPayload};

pub mod payload;
pub mod refill;
mod scheduler;
pub mod vapid;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use refill::{MedicationStock, RefillStatus};
pub use scheduler::{ReminderScheduler, ScheduledReminder, ScheduledReminderHandle};
pub use vapid::{VapidConfigStatus, VapidCredentials, generate_vapid_credentials, load_vapid_config};

/// How long the push service should hold an undelivered message.
pub const DEFAULT_TTL_SECONDS: u32 = 60 * 60 * 24;

const LOGGED_ENDPOINT_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("subscription store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("failed to encode notification payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fans a payload out to every subscription a user owns.
///
/// Each subscription is attempted exactly once. A `Gone` outcome prunes that
/// endpoint from the store; transient failures leave the store untouched.
#[derive(Debug, Clone)]
pub struct PushDispatcher<St, S> {
    store: St,
    sender: S,
    ttl_seconds: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefillCheck {
    pub medication_name: String,
    pub status: RefillStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DeliveryResult>,
}

impl<St, S> PushDispatcher<St, S>
where
    St: SubscriptionStore,
    S: PushSender,
{
    pub fn new(store: St, sender: S) -> Self {
        Self {
            store,
            sender,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: u32) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub async fn send(
        &self,
        user_id: &str,
        payload: &NotificationPayload,
    ) -> Result<DeliveryResult, DispatchError> {
        let subscriptions = self.store.list(user_id).await?;
        if subscriptions.is_empty() {
            warn!(user_id, "no push subscriptions for user");
            return Ok(DeliveryResult::NoSubscription);
        }

        let body = serde_json::to_vec(payload)?;
        let mut delivered = 0usize;
        for subscription in &subscriptions {
            let endpoint = short_endpoint(&subscription.endpoint);
            match self
                .sender
                .deliver(subscription, &body, self.ttl_seconds)
                .await
            {
                DeliveryOutcome::Delivered => {
                    delivered += 1;
                    debug!(user_id, endpoint, "notification delivered");
                }
                DeliveryOutcome::Gone => {
                    info!(user_id, endpoint, "pruning expired push subscription");
                    self.prune(&subscription.endpoint).await;
                }
                DeliveryOutcome::TransientFailure(reason) => {
                    warn!(user_id, endpoint, %reason, "push delivery failed");
                }
            }
        }

        if delivered > 0 {
            info!(user_id, delivered, "sent notification");
            Ok(DeliveryResult::Delivered { count: delivered })
        } else {
            warn!(
                user_id,
                attempted = subscriptions.len(),
                "failed to deliver notification to any subscription"
            );
            Ok(DeliveryResult::AllFailed {
                attempted: subscriptions.len(),
            })
        }
    }

    pub async fn send_medication_reminder(
        &self,
        user_id: &str,
        medication_name: &str,
        scheduled_time: &str,
    ) -> Result<DeliveryResult, DispatchError> {
        let payload = payload::medication_reminder(medication_name, scheduled_time);
        self.send(user_id, &payload).await
    }

    pub async fn send_refill_reminder(
        &self,
        user_id: &str,
        medication_name: &str,
        pills_remaining: u32,
    ) -> Result<DeliveryResult, DispatchError> {
        let payload = payload::refill_reminder(medication_name, pills_remaining);
        self.send(user_id, &payload).await
    }

    pub async fn send_test_notification(
        &self,
        user_id: &str,
    ) -> Result<DeliveryResult, DispatchError> {
        self.send(user_id, &payload::test_notification()).await
    }

    /// Sends a refill reminder for every medication at or below its refill
    /// threshold. Medications with enough stock are reported without a send.
    pub async fn check_refills(
        &self,
        user_id: &str,
        medications: &[MedicationStock],
    ) -> Result<Vec<RefillCheck>, DispatchError> {
        let mut checks = Vec::with_capacity(medications.len());
        for medication in medications {
            let status = RefillStatus::calculate(medication);
            let result = if status.needs_refill {
                Some(
                    self.send_refill_reminder(user_id, &medication.name, status.pills_remaining)
                        .await?,
                )
            } else {
                None
            };
            checks.push(RefillCheck {
                medication_name: medication.name.clone(),
                status,
                result,
            });
        }
        Ok(checks)
    }

    async fn prune(&self, endpoint: &str) {
        if let Err(err) = self.store.remove_by_endpoint(endpoint).await {
            error!(
                endpoint = short_endpoint(endpoint),
                %err,
                "failed to prune expired push subscription"
            );
        }
    }
}

/// Builds the web-push transport, or `None` when push is not configured.
pub fn maybe_sender(config: &config::AppConfig) -> Option<WebPushSender> {
    let vapid = match load_vapid_config(config) {
        VapidConfigStatus::Ready(vapid) => vapid,
        VapidConfigStatus::Incomplete => {
            warn!("push notifications disabled: incomplete VAPID configuration");
            return None;
        }
        VapidConfigStatus::Missing => {
            info!("push notifications disabled: no VAPID configuration");
            return None;
        }
    };

    match WebPushSender::new(vapid) {
        Ok(sender) => Some(sender),
        Err(err) => {
            error!(%err, "push notifications disabled: failed to init web-push");
            None
        }
    }
}

pub(crate) fn short_endpoint(endpoint: &str) -> &str {
    match endpoint.char_indices().nth(LOGGED_ENDPOINT_CHARS) {
        Some((idx, _)) => &endpoint[..idx],
        None => endpoint,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ports::PushSender;
    use crate::types::push::{DeliveryOutcome, Subscription};

    use std::collections::HashMap;
    use std::future::{Ready, ready};
    use std::sync::{Arc, Mutex};

    /// Transport fake: outcomes are looked up by endpoint, defaulting to
    /// `Delivered`.
    #[derive(Clone, Default)]
    pub(crate) struct TestSender {
        pub(crate) outcomes: Arc<Mutex<HashMap<String, DeliveryOutcome>>>,
        pub(crate) sent: Arc<Mutex<Vec<(String, Vec<u8>, u32)>>>,
    }

    impl TestSender {
        pub(crate) fn with_outcome(self, endpoint: &str, outcome: DeliveryOutcome) -> Self {
            self.outcomes
                .lock()
                .expect("outcomes lock")
                .insert(endpoint.to_string(), outcome);
            self
        }

        pub(crate) fn sent(&self) -> Vec<(String, Vec<u8>, u32)> {
            self.sent.lock().expect("sent lock").clone()
        }
    }

    impl PushSender for TestSender {
        type Fut<'a>
            = Ready<DeliveryOutcome>
        where
            Self: 'a;

        fn deliver<'a>(
            &'a self,
            subscription: &'a Subscription,
            payload: &'a [u8],
            ttl_seconds: u32,
        ) -> Self::Fut<'a> {
            self.sent.lock().expect("sent lock").push((
                subscription.endpoint.clone(),
                payload.to_vec(),
                ttl_seconds,
            ));
            let outcome = self
                .outcomes
                .lock()
                .expect("outcomes lock")
                .get(&subscription.endpoint)
                .cloned()
                .unwrap_or(DeliveryOutcome::Delivered);
            ready(outcome)
        }
    }
}
