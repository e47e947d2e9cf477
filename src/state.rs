use crate::adapters::TokioTimeProvider;
use crate::config::AppConfig;
use crate::push::{PushDispatcher, ReminderScheduler, ScheduledReminderHandle};

use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState<St, S> {
    pub config: AppConfig,
    pub store: St,
    /// `None` while push is not configured; subscription CRUD still works.
    pub dispatcher: Option<PushDispatcher<St, S>>,
    pub scheduler: Option<ReminderScheduler<TokioTimeProvider, St, S>>,
    pub reminder_handles: Arc<Mutex<Vec<ScheduledReminderHandle>>>,
    pub public_key: Option<String>,
}
