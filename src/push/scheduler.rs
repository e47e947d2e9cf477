use crate::ports::{PushSender, SubscriptionStore, TimeProvider};
use crate::push::PushDispatcher;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A medication reminder due at a fixed instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReminder {
    pub user_id: String,
    pub medication_name: String,
    /// Display time shown in the notification body, e.g. `08:00`.
    pub scheduled_time: String,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

pub struct ScheduledReminderHandle {
    pub reminder: ScheduledReminder,
    pub scheduled_at: OffsetDateTime,
    handle: JoinHandle<()>,
}

impl ScheduledReminderHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    #[cfg(test)]
    pub(crate) async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}

#[derive(Debug, Clone)]
pub struct ReminderScheduler<T, St, S> {
    time: T,
    dispatcher: PushDispatcher<St, S>,
}

impl<T, St, S> ReminderScheduler<T, St, S>
where
    T: TimeProvider,
    St: SubscriptionStore,
    S: PushSender,
{
    pub fn new(time: T, dispatcher: PushDispatcher<St, S>) -> Self {
        Self { time, dispatcher }
    }

    pub fn now(&self) -> OffsetDateTime {
        self.time.now()
    }

    pub fn spawn(&self, reminder: ScheduledReminder) -> ScheduledReminderHandle {
        let time = self.time.clone();
        let dispatcher = self.dispatcher.clone();
        let scheduled_at = time.now();
        let reminder_for_task = reminder.clone();
        let handle = tokio::spawn(async move {
            run_reminder(time, dispatcher, reminder_for_task).await;
        });
        ScheduledReminderHandle {
            reminder,
            scheduled_at,
            handle,
        }
    }
}

fn compute_delay<T: TimeProvider>(time: &T, at: OffsetDateTime) -> Option<Duration> {
    let delay = at - time.now();
    if delay.is_positive() {
        Some(delay.try_into().unwrap_or(Duration::MAX))
    } else {
        None
    }
}

async fn run_reminder<T, St, S>(
    time: T,
    dispatcher: PushDispatcher<St, S>,
    reminder: ScheduledReminder,
) where
    T: TimeProvider,
    St: SubscriptionStore,
    S: PushSender,
{
    if let Some(delay) = compute_delay(&time, reminder.at) {
        time.sleep(delay).await;
    }

    match dispatcher
        .send_medication_reminder(
            &reminder.user_id,
            &reminder.medication_name,
            &reminder.scheduled_time,
        )
        .await
    {
        Ok(result) => info!(
            user_id = %reminder.user_id,
            medication = %reminder.medication_name,
            ?result,
            "scheduled reminder dispatched"
        ),
        Err(err) => error!(
            user_id = %reminder.user_id,
            medication = %reminder.medication_name,
            %err,
            "scheduled reminder failed"
        ),
    }
}
